//! # haul-arbitration: Dispute Adjudication
//!
//! The adjudication workflow for contested loads: opening a dispute,
//! append-only evidence collection under an advisory 48-hour window, an
//! evidence-ranking recommendation heuristic, and admin resolution with
//! the financial remedy applied through the escrow orchestrator.
//!
//! [`DisputeResolver`] is the entry point; [`recommend`] holds the pure
//! ranking rules.

pub mod dispute;
pub mod error;
pub mod recommend;

pub use dispute::{
    DisputeOutcome, DisputeRequest, DisputeResolver, EvidenceSubmission, ResolutionOutcome,
    EVIDENCE_WINDOW_HOURS,
};
pub use error::ArbitrationError;
pub use recommend::{recommend, Confidence, Recommendation, PHOTO_RECOMMENDATION_THRESHOLD};
