//! # Settlement Records
//!
//! Customer-side [`Invoice`] and carrier-side [`Payout`] rows. Both are
//! created lazily — an invoice when escrow is first authorized, a payout
//! after capture — and each load carries at most one of each.
//!
//! ## Transition Graphs
//!
//! ```text
//! Invoice:  DRAFTED ──▶ AUTHORIZED ──▶ PAID
//!              │            │
//!              ├──▶ FAILED ◀┤   FAILED ──▶ AUTHORIZED (manual retry)
//!              └──▶ CANCELLED ◀─┘
//!
//! Payout:   QUEUED ──▶ PROCESSING ──▶ SENT
//!              │            │
//!              └──▶ FAILED ◀┘   FAILED ──▶ QUEUED (manual retry)
//! ```
//!
//! Gateway failures are recorded on the row (`failure_reason`) before the
//! error propagates, so the financial record reflects the attempt even
//! when the caller never retries.

use serde::{Deserialize, Serialize};

use haul_core::{InvoiceId, LoadId, OrgId, PayoutId, Timestamp};

// ─── Invoice ─────────────────────────────────────────────────────────

/// Status of the customer-side charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Row created, no gateway hold yet.
    Drafted,
    /// Gateway hold placed, funds reserved but not charged.
    Authorized,
    /// Hold captured, customer charged.
    Paid,
    /// Last gateway call failed; `failure_reason` holds the message.
    Failed,
    /// Hold released without charge.
    Cancelled,
}

impl InvoiceStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drafted => "DRAFTED",
            Self::Authorized => "AUTHORIZED",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Statuses this invoice may legally move to.
    ///
    /// `CANCELLED` allows re-authorization: a load whose hold was released
    /// (carrier rollback, TONU re-arm) keeps its single invoice row and
    /// holds again when re-released.
    pub fn valid_transitions(&self) -> &'static [InvoiceStatus] {
        match self {
            Self::Drafted => &[Self::Authorized, Self::Failed, Self::Cancelled],
            Self::Authorized => &[Self::Paid, Self::Failed, Self::Cancelled],
            Self::Failed => &[Self::Authorized, Self::Cancelled],
            Self::Cancelled => &[Self::Authorized],
            Self::Paid => &[],
        }
    }

    /// Whether `target` is a legal next status.
    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer-side settlement record. One per load, created lazily at first
/// authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice identifier.
    pub id: InvoiceId,
    /// Load this invoice settles.
    pub load_id: LoadId,
    /// Charged organization (the shipper).
    pub customer_org: OrgId,
    /// Charge amount in cents.
    pub amount_cents: i64,
    /// Current status.
    pub status: InvoiceStatus,
    /// Opaque gateway payment-intent reference.
    pub payment_intent_ref: Option<String>,
    /// When the gateway hold was placed.
    pub authorized_at: Option<Timestamp>,
    /// When the hold was captured.
    pub paid_at: Option<Timestamp>,
    /// Amount refunded after capture, in cents.
    pub refunded_cents: Option<i64>,
    /// When the refund was issued.
    pub refunded_at: Option<Timestamp>,
    /// Message from the last failed gateway call.
    pub failure_reason: Option<String>,
    /// When the row was created.
    pub created_at: Timestamp,
    /// When the row was last written.
    pub updated_at: Timestamp,
}

impl Invoice {
    /// Create a drafted invoice for `load_id`.
    pub fn drafted(load_id: LoadId, customer_org: OrgId, amount_cents: i64) -> Self {
        let now = Timestamp::now();
        Self {
            id: InvoiceId::new(),
            load_id,
            customer_org,
            amount_cents,
            status: InvoiceStatus::Drafted,
            payment_intent_ref: None,
            authorized_at: None,
            paid_at: None,
            refunded_cents: None,
            refunded_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ─── Payout ──────────────────────────────────────────────────────────

/// Status of the carrier-side transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    /// Row created, transfer not yet attempted.
    Queued,
    /// Transfer submitted to the gateway.
    Processing,
    /// Funds sent.
    Sent,
    /// Transfer failed; `failure_reason` holds the message.
    Failed,
}

impl PayoutStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }

    /// Statuses this payout may legally move to.
    pub fn valid_transitions(&self) -> &'static [PayoutStatus] {
        match self {
            Self::Queued => &[Self::Processing, Self::Failed],
            Self::Processing => &[Self::Sent, Self::Failed],
            Self::Failed => &[Self::Queued],
            Self::Sent => &[],
        }
    }

    /// Whether `target` is a legal next status.
    pub fn can_transition_to(&self, target: PayoutStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carrier-side settlement record. One per load, created lazily after
/// invoice capture (or TONU).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Unique payout identifier.
    pub id: PayoutId,
    /// Load this payout settles.
    pub load_id: LoadId,
    /// Receiving organization (the carrier).
    pub carrier_org: OrgId,
    /// Net amount transferred to the carrier, in cents.
    pub amount_cents: i64,
    /// Platform fee withheld, in cents.
    pub platform_fee_cents: i64,
    /// QuickPay fee withheld, in cents (zero unless `quick_pay`).
    pub quick_pay_fee_cents: i64,
    /// Whether the carrier elected expedited payout.
    pub quick_pay: bool,
    /// Earliest time the transfer should be submitted: immediately for
    /// QuickPay, end of the standard net terms otherwise.
    pub scheduled_for: Timestamp,
    /// Current status.
    pub status: PayoutStatus,
    /// Opaque gateway transfer reference.
    pub transfer_ref: Option<String>,
    /// When the transfer completed.
    pub sent_at: Option<Timestamp>,
    /// Message from the last failed transfer.
    pub failure_reason: Option<String>,
    /// When the row was created.
    pub created_at: Timestamp,
    /// When the row was last written.
    pub updated_at: Timestamp,
}

impl Payout {
    /// Create a queued payout for `load_id`.
    pub fn queued(
        load_id: LoadId,
        carrier_org: OrgId,
        amount_cents: i64,
        platform_fee_cents: i64,
        quick_pay_fee_cents: i64,
        quick_pay: bool,
        scheduled_for: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PayoutId::new(),
            load_id,
            carrier_org,
            amount_cents,
            platform_fee_cents,
            quick_pay_fee_cents,
            quick_pay,
            scheduled_for,
            status: PayoutStatus::Queued,
            transfer_ref: None,
            sent_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
