//! # haul-policy: Fee and Compensation Policy
//!
//! The money rules, kept pure: cancellation fee tables for both sides,
//! carrier compensation on customer cancellation, and TONU amounts with
//! their 85/15 split. Everything here is a deterministic function of its
//! arguments — no clocks, no stores, no gateways — so the lifecycle and
//! arbitration crates can consult the same rules without side effects.

pub mod cancellation;
pub mod error;
pub mod tonu;

pub use cancellation::{
    carrier_compensation_cents, fee_for, FeeDecision, ReputationPenalty, CARRIER_COMPENSATION_PCT,
};
pub use error::PolicyError;
pub use tonu::{tonu_amounts, TonuSplit, CARRIER_SHARE_PCT, LOCAL_HAUL_MILES, TONU_CAP_CENTS};
