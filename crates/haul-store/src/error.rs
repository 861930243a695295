//! Storage error taxonomy.

use haul_core::{InvoiceId, LoadId, PayoutId};
use haul_state::StateError;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// No load row with this id.
    #[error("load not found: {0}")]
    LoadNotFound(LoadId),

    /// No invoice row with this id.
    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// No payout row with this id.
    #[error("payout not found: {0}")]
    PayoutNotFound(PayoutId),

    /// A row with this id already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Compare-and-swap guard tripped, or a validation error bubbled up
    /// from the state model.
    #[error(transparent)]
    State(#[from] StateError),
}
