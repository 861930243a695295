//! # Payment Gateway Seam
//!
//! Abstract adapter over the external payment processor. The orchestrator
//! only ever talks to [`PaymentGateway`]; production wires a real
//! processor client behind it, tests wire a scripted fake.
//!
//! Every call returns a [`GatewayRef`] — the processor's opaque reference
//! id plus its reported status string — and failures surface as
//! [`GatewayError`] with the processor's human-readable message.

use haul_core::LoadId;

/// Reference returned by a successful gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRef {
    /// Opaque processor reference (payment intent, refund, or transfer id).
    pub reference: String,
    /// Processor-reported status string, recorded verbatim.
    pub status: String,
}

/// Context attached to money-moving calls for the processor's records.
#[derive(Debug, Clone)]
pub struct GatewayMetadata {
    /// Load the money movement settles.
    pub load_id: LoadId,
    /// Short human-readable description.
    pub description: String,
}

/// Failure from the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The processor refused the operation (insufficient funds, expired
    /// method, hold already consumed).
    #[error("gateway declined: {0}")]
    Declined(String),

    /// The processor could not be reached or returned a transport error.
    /// Retryable by the caller.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous adapter over the external payment processor.
pub trait PaymentGateway: Send + Sync {
    /// Place a hold on the customer's payment method. No funds move.
    fn authorize(
        &self,
        customer_ref: &str,
        method_ref: &str,
        amount_cents: i64,
        metadata: &GatewayMetadata,
    ) -> Result<GatewayRef, GatewayError>;

    /// Convert a hold into an actual charge.
    fn capture(&self, intent_ref: &str) -> Result<GatewayRef, GatewayError>;

    /// Release a hold without charging.
    fn cancel(&self, intent_ref: &str) -> Result<(), GatewayError>;

    /// Reverse a captured charge, in part (`Some(cents)`) or in full.
    fn refund(&self, intent_ref: &str, amount_cents: Option<i64>)
        -> Result<GatewayRef, GatewayError>;

    /// Send funds to a carrier's connected account.
    fn transfer(
        &self,
        destination_ref: &str,
        amount_cents: i64,
        metadata: &GatewayMetadata,
    ) -> Result<GatewayRef, GatewayError>;
}
