//! # Cancellation Fee Tables
//!
//! Pure fee computation for load cancellation. Deterministic and
//! side-effect-free: callers pass the status, the cancelling side, the
//! hours remaining before the pickup window, and the gross revenue, and
//! get a [`FeeDecision`] back. The cancellation service and the dispute
//! adjudicator both consult this module; neither re-derives a fee.
//!
//! ## Fee Tables
//!
//! Customer-initiated, as a fraction of gross revenue:
//!
//! ```text
//! POSTED / ASSIGNED            0%
//! ACCEPTED / RELEASE_REQUESTED 10%  ( > 24h to pickup )
//!                              25%  ( 4h ..= 24h )
//!                              50%  ( < 4h )
//! RELEASED / EXPIRED_RELEASE   75%
//! IN_TRANSIT                  100%
//! ```
//!
//! Carrier-initiated, flat amounts:
//!
//! ```text
//! > 12h to pickup              $0    (warning only)
//! 2h ..= 12h                   $100
//! < 2h                         $250  + reputation penalty
//! RELEASED / EXPIRED_RELEASE   $500  + severe reputation penalty
//! IN_TRANSIT                   rejected (CANNOT_CANCEL_IN_TRANSIT)
//! ```
//!
//! When a customer cancels a load with an assigned carrier, the carrier
//! is compensated 75% of the computed fee.

use serde::{Deserialize, Serialize};

use haul_state::{LoadStatus, Party};

use crate::error::PolicyError;

/// Fraction of a customer fee paid out to the assigned carrier.
pub const CARRIER_COMPENSATION_PCT: i64 = 75;

/// Reputation consequence attached to a carrier cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReputationPenalty {
    /// No penalty.
    None,
    /// Standard strike against the carrier's record.
    Standard,
    /// Severe strike; repeated instances trigger review.
    Severe,
}

/// Outcome of a fee computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeDecision {
    /// Fee charged to the cancelling side, in cents.
    pub fee_cents: i64,
    /// Human-readable rule that produced the fee.
    pub reason: String,
    /// Hours between cancellation and the scheduled pickup window.
    pub hours_until_pickup: f64,
    /// Reputation consequence (always `None` for customer cancellations).
    pub reputation_penalty: ReputationPenalty,
}

/// Compute the cancellation fee for a load in `status`, cancelled by
/// `cancelled_by` with `hours_until_pickup` hours remaining and
/// `gross_revenue_cents` at stake.
///
/// `hours_until_pickup` may be negative once the window has opened.
pub fn fee_for(
    status: LoadStatus,
    cancelled_by: Party,
    hours_until_pickup: f64,
    gross_revenue_cents: i64,
) -> Result<FeeDecision, PolicyError> {
    match cancelled_by {
        Party::Customer => customer_fee(status, hours_until_pickup, gross_revenue_cents),
        Party::Carrier => carrier_fee(status, hours_until_pickup),
    }
}

/// Carrier compensation owed when a customer cancellation fee is charged
/// and a carrier was assigned: 75% of the fee.
pub fn carrier_compensation_cents(fee_cents: i64) -> i64 {
    fee_cents * CARRIER_COMPENSATION_PCT / 100
}

fn customer_fee(
    status: LoadStatus,
    hours_until_pickup: f64,
    gross_revenue_cents: i64,
) -> Result<FeeDecision, PolicyError> {
    let (pct, rule) = match status {
        LoadStatus::Posted | LoadStatus::Assigned => (0, "no carrier commitment yet"),
        LoadStatus::Accepted | LoadStatus::ReleaseRequested => {
            if hours_until_pickup > 24.0 {
                (10, "accepted, more than 24h notice")
            } else if hours_until_pickup >= 4.0 {
                (25, "accepted, 4-24h notice")
            } else {
                (50, "accepted, less than 4h notice")
            }
        }
        LoadStatus::Released | LoadStatus::ExpiredRelease => (75, "release already issued"),
        LoadStatus::InTransit => (100, "material already in transit"),
        other => return Err(PolicyError::NotCancellable { status: other }),
    };
    Ok(FeeDecision {
        fee_cents: gross_revenue_cents * pct / 100,
        reason: format!("customer cancellation: {rule} ({pct}% of gross)"),
        hours_until_pickup,
        reputation_penalty: ReputationPenalty::None,
    })
}

fn carrier_fee(status: LoadStatus, hours_until_pickup: f64) -> Result<FeeDecision, PolicyError> {
    match status {
        LoadStatus::InTransit => Err(PolicyError::CannotCancelInTransit),
        LoadStatus::Released | LoadStatus::ExpiredRelease => Ok(FeeDecision {
            fee_cents: 50_000,
            reason: "carrier cancellation after release issued".to_string(),
            hours_until_pickup,
            reputation_penalty: ReputationPenalty::Severe,
        }),
        LoadStatus::Assigned | LoadStatus::Accepted | LoadStatus::ReleaseRequested => {
            let (fee_cents, rule, penalty) = if hours_until_pickup > 12.0 {
                (0, "more than 12h notice, warning only", ReputationPenalty::None)
            } else if hours_until_pickup >= 2.0 {
                (10_000, "2-12h notice", ReputationPenalty::None)
            } else {
                (25_000, "less than 2h notice", ReputationPenalty::Standard)
            };
            Ok(FeeDecision {
                fee_cents,
                reason: format!("carrier cancellation: {rule}"),
                hours_until_pickup,
                reputation_penalty: penalty,
            })
        }
        other => Err(PolicyError::NotCancellable { status: other }),
    }
}
