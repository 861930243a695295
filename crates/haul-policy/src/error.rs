//! Policy error taxonomy.

use haul_state::LoadStatus;

/// Errors from the fee engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// No cancellation table covers this status.
    #[error("load in status {status} cannot be cancelled")]
    NotCancellable {
        /// Status at cancellation time.
        status: LoadStatus,
    },

    /// Carrier cancellation while material is on the truck is never
    /// permitted; in-transit failures go through the dispute path.
    #[error("carrier cannot cancel a load in transit")]
    CannotCancelInTransit,
}
