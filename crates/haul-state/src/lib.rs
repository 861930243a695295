//! # haul-state: Load Model and Lifecycle State Machine
//!
//! The typed core of the load lifecycle: the [`Load`] aggregate with its
//! release / TONU / cancellation / dispute field groups, the validated
//! [`LoadStatus`] state machine, and the append-only satellite records
//! (evidence, telemetry, attestations).
//!
//! This crate knows which transitions are legal but never performs them;
//! the lifecycle and arbitration crates own the side effects — fee
//! computation, escrow calls, notifications — and use this crate's
//! [`validate_transition`] / [`check_expected`] as their gate.
//!
//! ## Key Design Principles
//!
//! 1. **One adjacency table.** Every legal transition lives in
//!    [`LoadStatus::valid_transitions`]; no caller hand-rolls edges.
//! 2. **Append-only history.** Transition logs, evidence, and telemetry
//!    are never rewritten.
//! 3. **Integer money.** Amounts are `i64` cents end to end.
//! 4. **No I/O.** Pure data and validation; storage and gateways live in
//!    their own crates.

pub mod load;
pub mod records;
pub mod settlement;
pub mod status;

pub use load::{
    CancellationFields, CommercialTerms, DisputeFields, Load, Party, RateMode, ReleaseFields,
    Stop, TimeWindow, TonuFields, TransitionRecord,
};
pub use records::{
    Attestation, AttestationType, DisputeEvidence, DisputeResolution, EvidenceType, GeoEvent,
    SuspiciousActivity, TripStage,
};
pub use settlement::{Invoice, InvoiceStatus, Payout, PayoutStatus};
pub use status::{check_expected, validate_transition, LoadStatus, StateError};
