//! # Persistence Traits
//!
//! The seams between the lifecycle engines and whatever actually holds
//! the rows. Managers depend on these traits only; [`crate::MemoryStore`]
//! implements all of them for tests and single-node deployments.
//!
//! ## Design Choice: Compare-and-Swap Writes
//!
//! [`LoadStore::update_load`] is the single synchronization primitive for
//! the load row. The caller names the status it observed; the store
//! applies the patch only while that status still holds, under the row
//! lock, and returns [`StateError::StaleState`] otherwise. Managers never
//! hold locks across gateway calls — they re-read and retry at their own
//! discretion.
//!
//! All traits are synchronous. Gateway and store latency is bounded and
//! the managers are driven from a threaded HTTP layer, so a blocking seam
//! keeps the trait objects simple (`Arc<dyn LoadStore>` with no pinned
//! futures).

use haul_core::{DisputeId, InvoiceId, LoadId, PayoutId};
use haul_state::{
    Attestation, AttestationType, DisputeEvidence, GeoEvent, Invoice, Load, LoadStatus, Payout,
    StateError, SuspiciousActivity,
};

use crate::error::StoreError;

/// Storage for the load aggregate.
pub trait LoadStore: Send + Sync {
    /// Insert a new load. Fails with [`StoreError::Duplicate`] if the id
    /// is already present.
    fn create_load(&self, load: Load) -> Result<(), StoreError>;

    /// Fetch a load by id.
    fn get_load(&self, id: LoadId) -> Result<Load, StoreError>;

    /// Compare-and-swap write: apply `patch` to the load only while its
    /// persisted status equals `expected`, atomically, and return the
    /// patched row.
    fn update_load(
        &self,
        id: LoadId,
        expected: LoadStatus,
        patch: &mut dyn FnMut(&mut Load),
    ) -> Result<Load, StoreError>;

    /// All loads currently in `status`. Used by the release-expiry sweep.
    fn loads_with_status(&self, status: LoadStatus) -> Vec<Load>;
}

/// Storage for invoice and payout rows.
pub trait SettlementStore: Send + Sync {
    /// Insert a new invoice.
    fn create_invoice(&self, invoice: Invoice) -> Result<(), StoreError>;

    /// Fetch an invoice by id.
    fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError>;

    /// The invoice for a load, if one has been created.
    fn invoice_for_load(&self, load_id: LoadId) -> Option<Invoice>;

    /// Apply `patch` to an invoice under the row lock and return the
    /// patched row.
    fn update_invoice(
        &self,
        id: InvoiceId,
        patch: &mut dyn FnMut(&mut Invoice),
    ) -> Result<Invoice, StoreError>;

    /// Insert a new payout.
    fn create_payout(&self, payout: Payout) -> Result<(), StoreError>;

    /// Fetch a payout by id.
    fn get_payout(&self, id: PayoutId) -> Result<Payout, StoreError>;

    /// The payout for a load, if one has been created.
    fn payout_for_load(&self, load_id: LoadId) -> Option<Payout>;

    /// Apply `patch` to a payout under the row lock and return the
    /// patched row.
    fn update_payout(
        &self,
        id: PayoutId,
        patch: &mut dyn FnMut(&mut Payout),
    ) -> Result<Payout, StoreError>;
}

/// Append-only storage for dispute evidence.
pub trait EvidenceStore: Send + Sync {
    /// Append one evidence record. Evidence is never updated or removed.
    fn append_evidence(&self, evidence: DisputeEvidence) -> Result<(), StoreError>;

    /// All evidence for a dispute, in submission order.
    fn evidence_for_dispute(&self, dispute_id: DisputeId) -> Vec<DisputeEvidence>;
}

/// Append-only storage for geofence telemetry.
pub trait TelemetryStore: Send + Sync {
    /// Append one position ping.
    fn append_geo_event(&self, event: GeoEvent) -> Result<(), StoreError>;

    /// All pings for a load, in arrival order.
    fn geo_events_for_load(&self, load_id: LoadId) -> Vec<GeoEvent>;
}

/// Storage for carrier attestations and flagged activity.
pub trait AttestationStore: Send + Sync {
    /// Record an attestation. Idempotent per `(load, attestation_type)`:
    /// if one already exists, the existing record is returned unchanged.
    fn create_attestation(&self, attestation: Attestation) -> Result<Attestation, StoreError>;

    /// The attestation of the given type for a load, if signed.
    fn attestation_for_load(
        &self,
        load_id: LoadId,
        attestation_type: AttestationType,
    ) -> Option<Attestation>;

    /// Flag a suspicious-activity signal for manual review.
    fn record_suspicious_activity(&self, activity: SuspiciousActivity) -> Result<(), StoreError>;

    /// All flagged signals for a load.
    fn suspicious_activity_for_load(&self, load_id: LoadId) -> Vec<SuspiciousActivity>;
}

/// CAS failure value for an `update_load` whose guard tripped.
pub(crate) fn stale(expected: LoadStatus, actual: LoadStatus) -> StoreError {
    StoreError::State(StateError::StaleState { expected, actual })
}
