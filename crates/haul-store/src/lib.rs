//! # haul-store: Persistence Seams
//!
//! Trait definitions for every collaborator that holds rows — loads,
//! invoices and payouts, dispute evidence, geofence telemetry, and carrier
//! attestations — plus [`MemoryStore`], a DashMap-backed implementation of
//! all of them for tests and single-node deployments.
//!
//! The one non-negotiable contract is the compare-and-swap write on the
//! load row: see [`traits::LoadStore::update_load`].

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::{AttestationStore, EvidenceStore, LoadStore, SettlementStore, TelemetryStore};
