//! # haul-lifecycle: The Load Lifecycle Engine
//!
//! The coordinating layer of the stack. [`LifecycleEngine`] owns the
//! single gate every status change passes through; around it sit the
//! managers for each path:
//!
//! - [`ReleaseManager`] — request-release → release → TONU, with the
//!   escrow hold placed at release time;
//! - [`CancellationService`] — terminal customer cancellation and carrier
//!   rollback, fees from `haul-policy`;
//! - [`GeofenceTrigger`] — GPS samples into status-advance proposals;
//! - [`DoubleBrokerGuard`] — attestation gating, dispatch verification,
//!   proximity cross-checks.
//!
//! ## Key Design Principles
//!
//! 1. **One gate.** All transitions funnel through
//!    [`LifecycleEngine::request_transition`]; managers never write
//!    `status` directly.
//! 2. **Money before status, or status before money — never ambiguous.**
//!    Each operation documents which side commits first and what a
//!    mid-flight failure leaves behind.
//! 3. **Notifications are data.** Operations return the messages they
//!    intend; dispatch is fire-and-forget through [`notify::Notifier`].
//! 4. **Injected collaborators.** Stores, gateway, distance function, and
//!    notifier arrive at construction — no process-wide singletons.

pub mod cancel;
pub mod engine;
pub mod error;
pub mod geofence;
pub mod guard;
pub mod notify;
pub mod release;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{CancellationOutcome, CancellationService};
pub use engine::{LifecycleEngine, TransitionOutcome};
pub use error::LifecycleError;
pub use geofence::{GeofenceTrigger, PingOutcome, GEOFENCE_RADIUS_METERS};
pub use guard::{DispatchDetails, DoubleBrokerGuard, EquipmentLookup, ProximityCheck};
pub use notify::{Audience, LogNotifier, Notification, NotificationKind, Notifier};
pub use release::{
    ReleaseManager, ReleaseRequest, TonuClaim, TonuOutcome, RELEASE_ISSUE_WINDOW_HOURS,
    RELEASE_VALIDITY_HOURS, TONU_MIN_WAIT_MINUTES,
};
