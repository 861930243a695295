//! Dispute-workflow error taxonomy.
//!
//! Workflow misuse (`DisputeAlreadyOpen`, `NoActiveDispute`, and the
//! `INVALID_RESOLUTION` case carried inside `State`) is a caller problem
//! the HTTP layer maps to 4xx. Gateway-layer failures arrive through
//! `Escrow` already persisted on the settlement row.

use haul_core::LoadId;
use haul_escrow::EscrowError;
use haul_state::StateError;
use haul_store::StoreError;

/// Errors from the dispute resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArbitrationError {
    /// A dispute is already open on the load.
    #[error("dispute already open on load {0}")]
    DisputeAlreadyOpen(LoadId),

    /// The operation requires an open dispute and the load has none.
    #[error("no active dispute on load {0}")]
    NoActiveDispute(LoadId),

    /// State-machine violation, including unrecognized resolution values.
    #[error(transparent)]
    State(#[from] StateError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Escrow/gateway failure, already recorded on the settlement row.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}
