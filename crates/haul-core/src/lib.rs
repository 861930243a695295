//! # haul-core — Foundational Types for the Haul Stack
//!
//! This crate is the bedrock of the Haul Stack, a brokerage engine for
//! construction-freight shipments. It defines the primitives every other
//! crate in the workspace builds on; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `LoadId`, `OrgId`,
//!    `DriverId`, `InvoiceId`, `PayoutId`, `DisputeId` — all newtypes over
//!    UUIDs. No bare strings or naked UUIDs for identifiers, so a payout id
//!    can never be handed to a function expecting an invoice id.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision. Pickup windows, release expiries, and
//!    dispute deadlines all compare on the same clock.
//!
//! 3. **Integer cents for money.** Monetary fields throughout the stack are
//!    `i64` cents. No floats touch a financial value.
//!
//! 4. **Injected distance.** Geofencing and proximity checks consume the
//!    `DistanceCalculator` trait, with a haversine implementation provided.
//!    Tests substitute a fixed-distance double; nothing in the stack
//!    geocodes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `haul-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a persistence boundary.

pub mod actor;
pub mod error;
pub mod geo;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use actor::ActorRole;
pub use error::CoreError;
pub use geo::{haversine_miles, DistanceCalculator, GeoPoint, HaversineDistance, METERS_PER_MILE};
pub use identity::{
    AttestationId, DisputeId, DriverId, EvidenceId, GeoEventId, InvoiceId, LoadId, OrgId, PayoutId,
};
pub use temporal::Timestamp;
