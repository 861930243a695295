//! # TONU Compensation
//!
//! "Truck Ordered, Not Used": the carrier showed up under a valid release
//! and could not load. Compensation comes out of the shipper's held funds:
//!
//! - hauls of 50 miles or less: 50% of gross revenue (local-haul rule);
//! - longer hauls: 75% of gross revenue, capped at $250.
//!
//! The carrier receives 85% of the amount, the platform retains 15%.

use serde::{Deserialize, Serialize};

/// Haul length at or below which the local-haul rule applies.
pub const LOCAL_HAUL_MILES: f64 = 50.0;

/// Cap on TONU compensation for longer hauls, in cents.
pub const TONU_CAP_CENTS: i64 = 25_000;

/// Carrier share of the TONU amount, percent.
pub const CARRIER_SHARE_PCT: i64 = 85;

/// A computed TONU amount and its carrier/platform split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonuSplit {
    /// Total compensation charged to the shipper, in cents.
    pub total_cents: i64,
    /// Carrier share (85%), in cents.
    pub carrier_cents: i64,
    /// Platform share (the remainder), in cents.
    pub platform_cents: i64,
}

/// Compute the TONU amount for a haul of `miles` with
/// `gross_revenue_cents` at stake, split 85/15.
pub fn tonu_amounts(miles: f64, gross_revenue_cents: i64) -> TonuSplit {
    let total_cents = if miles <= LOCAL_HAUL_MILES {
        gross_revenue_cents * 50 / 100
    } else {
        (gross_revenue_cents * 75 / 100).min(TONU_CAP_CENTS)
    };
    let carrier_cents = total_cents * CARRIER_SHARE_PCT / 100;
    TonuSplit {
        total_cents,
        carrier_cents,
        platform_cents: total_cents - carrier_cents,
    }
}
