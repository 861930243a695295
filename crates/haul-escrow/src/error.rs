//! Escrow error taxonomy.
//!
//! Gateway-layer failures (`AuthorizationFailed`, `CaptureFailed`,
//! `CancellationFailed`, `RefundFailed`, `TransferFailed`) are persisted
//! on the invoice or payout row before they propagate, so the financial
//! record reflects the attempt even when the caller never retries.

use haul_core::LoadId;
use haul_state::InvoiceStatus;
use haul_store::StoreError;

/// Errors from escrow orchestration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EscrowError {
    /// The shipper has no stored payment method to hold against.
    #[error("no payment method on file for load {0}")]
    NoPaymentMethod(LoadId),

    /// No carrier is assigned to receive a payout.
    #[error("no carrier assigned on load {0}")]
    NoCarrierAssigned(LoadId),

    /// The load is not in a status where this escrow step is legal.
    #[error("escrow step not legal for load {load_id}: {detail}")]
    NotEligible {
        /// Load in question.
        load_id: LoadId,
        /// Which precondition failed.
        detail: String,
    },

    /// Capture or refund requested but no invoice row exists.
    #[error("no invoice exists for load {0}")]
    InvoiceMissing(LoadId),

    /// The invoice is not in the status the requested step requires.
    #[error("invoice for load {load_id} is {actual}, cannot proceed")]
    InvoiceNotReady {
        /// Load in question.
        load_id: LoadId,
        /// Current invoice status.
        actual: InvoiceStatus,
    },

    /// The gateway refused or failed the hold.
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    /// The gateway refused or failed the capture.
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// The gateway refused or failed the hold release.
    #[error("hold cancellation failed: {0}")]
    CancellationFailed(String),

    /// The gateway refused or failed the refund.
    #[error("refund failed: {0}")]
    RefundFailed(String),

    /// The gateway refused or failed the carrier transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
