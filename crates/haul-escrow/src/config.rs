//! Escrow configuration.

use serde::{Deserialize, Serialize};

/// Fee percentages and payout terms. Loaded from deployment config;
/// defaults match the standard platform contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Platform fee withheld from every standard payout, percent.
    pub platform_fee_pct: i64,
    /// Additional fee for QuickPay (expedited) payouts, percent.
    pub quick_pay_fee_pct: i64,
    /// Standard payout terms, days after delivery approval.
    pub standard_terms_days: i64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            platform_fee_pct: 15,
            quick_pay_fee_pct: 3,
            standard_terms_days: 30,
        }
    }
}

impl EscrowConfig {
    /// Hours until a payout becomes eligible for transfer: immediately for
    /// QuickPay, end of net terms otherwise.
    pub fn payout_delay_hours(&self, quick_pay: bool) -> i64 {
        if quick_pay {
            0
        } else {
            self.standard_terms_days * 24
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_standard_contract() {
        let config = EscrowConfig::default();
        assert_eq!(config.platform_fee_pct, 15);
        assert_eq!(config.quick_pay_fee_pct, 3);
        assert_eq!(config.payout_delay_hours(false), 720);
        assert_eq!(config.payout_delay_hours(true), 0);
    }
}
