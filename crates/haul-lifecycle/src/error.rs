//! Lifecycle error taxonomy.
//!
//! Three families, mapped by the HTTP layer to status codes:
//!
//! - state-machine violations (`State`): never retried automatically;
//! - business preconditions (`ConfirmationRequired`, `TooEarly`,
//!   `TonuEvidenceRequired`, `AttestationRequired`, dispatch-detail
//!   failures): caller input problems, surfaced verbatim;
//! - gateway-layer failures (`Escrow`): already persisted on the
//!   invoice/payout row before they reach here.
//!
//! Nothing in this crate panics; every failure is a value scoped to one
//! load's operation.

use haul_core::LoadId;
use haul_escrow::EscrowError;
use haul_policy::PolicyError;
use haul_state::StateError;
use haul_store::StoreError;

/// Errors from the lifecycle managers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    /// Release issuance missing the shipper's required confirmations.
    #[error("confirmation required: {0}")]
    ConfirmationRequired(String),

    /// Release requested more than 24 hours before the pickup window.
    #[error("release is too early: pickup window opens in {hours_until_pickup:.1}h")]
    TooEarly {
        /// Hours until the scheduled pickup window.
        hours_until_pickup: f64,
    },

    /// TONU claim filed without the required evidence.
    #[error("tonu evidence required: {0}")]
    TonuEvidenceRequired(String),

    /// Pickup-location disclosure requested before the carrier signed the
    /// non-subcontracting attestation.
    #[error("attestation required before pickup disclosure for load {0}")]
    AttestationRequired(LoadId),

    /// Dispatch verification needs at least one of VIN, driver id, or
    /// driver name.
    #[error("dispatch details required: supply a VIN, driver id, or driver name")]
    DispatchDetailsRequired,

    /// The supplied VIN does not resolve to any known equipment.
    #[error("vin not found: {0}")]
    VinNotFound(String),

    /// The supplied VIN resolves to equipment owned by another carrier.
    #[error("vin not owned by carrier: {0}")]
    VinNotOwnedByCarrier(String),

    /// No carrier is assigned where the operation requires one.
    #[error("no carrier assigned on load {0}")]
    NoCarrierAssigned(LoadId),

    /// State-machine violation (invalid transition or stale expected
    /// status).
    #[error(transparent)]
    State(#[from] StateError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Fee policy rejection.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Escrow/gateway failure, already recorded on the settlement row.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}
