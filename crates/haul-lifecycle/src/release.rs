//! # Release / TONU Manager
//!
//! Governs the request-release → release → TONU path. A release is the
//! shipper's confirmation that material is physically ready for pickup —
//! and the moment the shipper's funds go on hold. TONU ("truck ordered,
//! not used") is the carrier's protection when it arrives under a valid
//! release and cannot load.
//!
//! ## Transition Graph
//!
//! ```text
//! ACCEPTED ──▶ RELEASE_REQUESTED ──▶ RELEASED ──▶ IN_TRANSIT
//!     │                                 │  ▲
//!     └──────────▶ (direct issue) ──────┘  │
//!                                          │
//!              EXPIRED_RELEASE ◀───────────┤   (24h lapse, lazy check)
//!                     └──── reissue ───────┘
//!                                          │
//!                                        TONU   (from RELEASED/IN_TRANSIT)
//! ```
//!
//! ## Invariants
//!
//! - A release is only issued within 24 hours of the pickup window
//!   (`TOO_EARLY` otherwise) and only with `confirmed_ready` and
//!   `acknowledged_tonu` both set (`CONFIRMATION_REQUIRED` otherwise).
//! - Issuing the release triggers the escrow hold. The status write
//!   happens first; a failed authorization leaves the load `RELEASED`
//!   with a `FAILED` invoice for manual retry, never a hold without a
//!   release.
//! - Expiry is evaluated lazily whenever the load is touched, not by a
//!   timer inside this crate.

use std::sync::Arc;

use haul_core::{ActorRole, LoadId, Timestamp};
use haul_policy::tonu_amounts;
use haul_state::{Invoice, Load, LoadStatus};

use crate::engine::{LifecycleEngine, TransitionOutcome};
use crate::error::LifecycleError;
use crate::notify::{dispatch_all, Audience, Notification, NotificationKind};

/// Hours before the pickup window within which a release may be issued.
pub const RELEASE_ISSUE_WINDOW_HOURS: f64 = 24.0;

/// Hours an issued release stays valid without a pickup.
pub const RELEASE_VALIDITY_HOURS: i64 = 24;

/// Minimum on-site dwell for a TONU claim, minutes.
pub const TONU_MIN_WAIT_MINUTES: i64 = 15;

/// Shipper inputs required to issue a release.
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    /// Material is physically ready for pickup.
    pub confirmed_ready: bool,
    /// Loaded quantity confirmed against the order.
    pub quantity_confirmed: bool,
    /// Shipper accepts TONU liability if the truck cannot load.
    pub acknowledged_tonu: bool,
    /// On-site contact for the driver.
    pub site_contact: Option<String>,
    /// Free-form pickup instructions.
    pub pickup_instructions: Option<String>,
}

/// Carrier inputs for a TONU claim. The HTTP layer has already verified
/// the GPS trail, proximity, and dwell before calling in; the values here
/// are what it validated.
#[derive(Debug, Clone)]
pub struct TonuClaim {
    /// Why the truck could not load.
    pub reason: String,
    /// When the truck arrived on site.
    pub arrival_time: Timestamp,
    /// Minutes the truck waited on site.
    pub wait_minutes: i64,
    /// Evidence attachment URLs.
    pub evidence_urls: Vec<String>,
}

/// Outcome of a TONU filing.
#[derive(Debug, Clone, PartialEq)]
pub struct TonuOutcome {
    /// The load, now in `TONU`.
    pub load: Load,
    /// The captured TONU invoice.
    pub invoice: Invoice,
    /// Notifications queued by the filing.
    pub notifications: Vec<Notification>,
}

/// Manager for the release protocol and TONU claims.
pub struct ReleaseManager {
    engine: Arc<LifecycleEngine>,
}

impl ReleaseManager {
    pub fn new(engine: Arc<LifecycleEngine>) -> Self {
        Self { engine }
    }

    /// Carrier asks the shipper to release the material.
    pub fn request_release(
        &self,
        load_id: LoadId,
        actor: ActorRole,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let now = Timestamp::now();
        let load = self.engine.request_transition(
            load_id,
            LoadStatus::Accepted,
            LoadStatus::ReleaseRequested,
            actor,
            None,
            &mut |load| {
                load.release.release_requested_at = Some(now);
            },
        )?;
        let notifications = vec![Notification::new(
            load_id,
            Audience::Shipper,
            NotificationKind::ReleaseRequested,
            "carrier is requesting material release",
        )];
        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(TransitionOutcome {
            load,
            notifications,
        })
    }

    /// Shipper issues the release: material is confirmed ready, the
    /// release number is minted, and the escrow hold is placed.
    pub fn issue_release(
        &self,
        load_id: LoadId,
        actor: ActorRole,
        request: ReleaseRequest,
    ) -> Result<TransitionOutcome, LifecycleError> {
        if !(request.confirmed_ready && request.acknowledged_tonu) {
            return Err(LifecycleError::ConfirmationRequired(
                "release requires confirmed_ready and acknowledged_tonu".to_string(),
            ));
        }

        let load = self.engine.loads().get_load(load_id)?;
        let now = Timestamp::now();
        let hours_until_pickup = load.hours_until_pickup(now);
        if hours_until_pickup > RELEASE_ISSUE_WINDOW_HOURS {
            return Err(LifecycleError::TooEarly { hours_until_pickup });
        }

        let release_number = mint_release_number(now);
        let expires_at = now.plus_hours(RELEASE_VALIDITY_HOURS);
        let load = self.engine.request_transition(
            load_id,
            load.status,
            LoadStatus::Released,
            actor,
            None,
            &mut |load| {
                load.release.release_number = Some(release_number.clone());
                load.release.released_at = Some(now);
                load.release.release_expires_at = Some(expires_at);
                load.release.shipper_confirmed_ready = request.confirmed_ready;
                load.release.shipper_acknowledged_tonu = request.acknowledged_tonu;
                load.release.quantity_confirmed = request.quantity_confirmed;
                load.release.site_contact = request.site_contact.clone();
                load.release.pickup_instructions = request.pickup_instructions.clone();
            },
        )?;

        // The hold goes on the moment material is confirmed ready.
        self.engine.escrow().authorize_payment(load_id)?;

        let notifications = vec![Notification::new(
            load_id,
            Audience::Carrier,
            NotificationKind::ReleaseIssued,
            format!("release {release_number} issued, valid 24h"),
        )];
        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(TransitionOutcome {
            load,
            notifications,
        })
    }

    /// Carrier files a TONU claim from `RELEASED` or `IN_TRANSIT`.
    ///
    /// The amount is 50% of gross for hauls of 50 miles or less, otherwise
    /// 75% of gross capped at $250; the carrier receives 85%.
    pub fn file_tonu(
        &self,
        load_id: LoadId,
        actor: ActorRole,
        claim: TonuClaim,
    ) -> Result<TonuOutcome, LifecycleError> {
        if claim.evidence_urls.is_empty() {
            return Err(LifecycleError::TonuEvidenceRequired(
                "at least one evidence attachment is required".to_string(),
            ));
        }
        if claim.wait_minutes < TONU_MIN_WAIT_MINUTES {
            return Err(LifecycleError::TonuEvidenceRequired(format!(
                "claim requires {TONU_MIN_WAIT_MINUTES} minutes on site, got {}",
                claim.wait_minutes
            )));
        }

        let load = self.engine.loads().get_load(load_id)?;
        let split = tonu_amounts(load.commercial.miles, load.commercial.gross_revenue_cents);
        let now = Timestamp::now();

        let load = self.engine.request_transition(
            load_id,
            load.status,
            LoadStatus::Tonu,
            actor,
            Some(claim.reason.clone()),
            &mut |load| {
                load.tonu.filed = true;
                load.tonu.filed_at = Some(now);
                load.tonu.amount_cents = Some(split.total_cents);
                load.tonu.carrier_cents = Some(split.carrier_cents);
                load.tonu.platform_cents = Some(split.platform_cents);
                load.tonu.reason = Some(claim.reason.clone());
            },
        )?;

        let (invoice, _payout) = self.engine.escrow().settle_tonu(load_id, split)?;

        let notifications = vec![Notification::new(
            load_id,
            Audience::Shipper,
            NotificationKind::TonuFiled,
            format!(
                "TONU filed: {} charged, carrier compensated",
                cents_display(split.total_cents)
            ),
        )];
        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(TonuOutcome {
            load,
            invoice,
            notifications,
        })
    }

    /// Lazily expire a lapsed release. Safe to call from any read path or
    /// the external scheduler: a no-op unless the load is `RELEASED` past
    /// its expiry.
    pub fn expire_release_if_due(
        &self,
        load_id: LoadId,
        now: Timestamp,
    ) -> Result<Option<TransitionOutcome>, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        if !load.release_expired(now) {
            return Ok(None);
        }
        let load = self.engine.request_transition(
            load_id,
            LoadStatus::Released,
            LoadStatus::ExpiredRelease,
            ActorRole::System,
            Some("release expired without pickup".to_string()),
            &mut |_| {},
        )?;
        let notifications = vec![Notification::new(
            load_id,
            Audience::Shipper,
            NotificationKind::ReleaseExpired,
            "release lapsed after 24h, re-confirmation required",
        )];
        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(Some(TransitionOutcome {
            load,
            notifications,
        }))
    }

    /// Sweep every `RELEASED` load for lapsed releases. Entry point for
    /// the external scheduler.
    ///
    /// One load failing to expire must not stall the rest of the sweep:
    /// a load that left `RELEASED` between the scan and the write was
    /// handled elsewhere, and any other per-load error is logged and
    /// retried on the next sweep.
    pub fn expire_due_releases(&self, now: Timestamp) -> Vec<LoadId> {
        let mut expired = Vec::new();
        for load in self.engine.loads().loads_with_status(LoadStatus::Released) {
            match self.expire_release_if_due(load.id, now) {
                Ok(Some(_)) => expired.push(load.id),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(load_id = %load.id, error = %err, "release expiry skipped");
                }
            }
        }
        expired
    }
}

/// Mint a release number: `RL-<year>-<8 hex chars>`.
fn mint_release_number(now: Timestamp) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("RL-{}-{}", now.year(), &uuid[..8])
}

fn cents_display(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}
