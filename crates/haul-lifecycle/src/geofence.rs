//! # Geofence Trigger
//!
//! Converts driver GPS samples into status-advance proposals. A pickup
//! ping inside the fence while the load is `RELEASED` proposes
//! `IN_TRANSIT`; a delivery ping inside the fence while `IN_TRANSIT`
//! proposes `DELIVERED`. Every sample is persisted as a [`GeoEvent`]
//! whether or not it triggers anything.
//!
//! ## Invariants
//!
//! - The fence radius is 500 meters, **inclusive**: a sample at exactly
//!   500m triggers, 501m does not.
//! - A pickup-stage ping outside the fence while `RELEASED` is forwarded
//!   as a suspicious-activity signal (possible double-brokering), never
//!   silently discarded.
//! - A ping losing a transition race is not an error: the sample is
//!   recorded and the proposal dropped.

use std::sync::Arc;

use haul_core::{ActorRole, DistanceCalculator, DriverId, GeoEventId, GeoPoint, LoadId, Timestamp,
    METERS_PER_MILE};
use haul_state::{GeoEvent, Load, LoadStatus, StateError, SuspiciousActivity, TripStage};
use haul_store::{AttestationStore, StoreError, TelemetryStore};

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use crate::notify::{dispatch_all, Audience, Notification, NotificationKind};

/// Fence radius around a stop, meters. Inclusive.
pub const GEOFENCE_RADIUS_METERS: f64 = 500.0;

/// Result of ingesting one GPS sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PingOutcome {
    /// The persisted telemetry record.
    pub event: GeoEvent,
    /// The load after any triggered transition.
    pub load: Load,
    /// Whether this sample advanced the status.
    pub triggered: bool,
    /// Notifications queued by the sample.
    pub notifications: Vec<Notification>,
}

/// Ingests GPS samples and proposes transitions through the engine.
pub struct GeofenceTrigger {
    engine: Arc<LifecycleEngine>,
    telemetry: Arc<dyn TelemetryStore>,
    attestations: Arc<dyn AttestationStore>,
    distance: Arc<dyn DistanceCalculator>,
}

impl GeofenceTrigger {
    pub fn new(
        engine: Arc<LifecycleEngine>,
        telemetry: Arc<dyn TelemetryStore>,
        attestations: Arc<dyn AttestationStore>,
        distance: Arc<dyn DistanceCalculator>,
    ) -> Self {
        Self {
            engine,
            telemetry,
            attestations,
            distance,
        }
    }

    /// Ingest one driver position sample.
    pub fn record_ping(
        &self,
        load_id: LoadId,
        driver_id: DriverId,
        position: GeoPoint,
        stage: TripStage,
        source: &str,
    ) -> Result<PingOutcome, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        let target = match stage {
            TripStage::AtPickup => load.origin.coordinates,
            TripStage::AtDelivery | TripStage::EnRoute => load.destination.coordinates,
        };
        let distance_meters = self.distance.distance_miles(position, target) * METERS_PER_MILE;
        let within_fence = distance_meters <= GEOFENCE_RADIUS_METERS;

        let mut triggered = false;
        let mut notifications = Vec::new();
        let mut load_after = load.clone();
        let now = Timestamp::now();

        match (stage, load.status, within_fence) {
            (TripStage::AtPickup, LoadStatus::Released, true) => {
                if let Some(updated) =
                    self.propose(load_id, LoadStatus::Released, LoadStatus::InTransit, &mut |l| {
                        l.release.actual_pickup_at = Some(now);
                    })
                {
                    load_after = updated;
                    triggered = true;
                    notifications.push(Notification::new(
                        load_id,
                        Audience::Shipper,
                        NotificationKind::PickupConfirmed,
                        "driver arrived on site, material picked up",
                    ));
                }
            }
            (TripStage::AtPickup, LoadStatus::Released, false) => {
                // Truck reporting "at pickup" nowhere near the site is a
                // double-brokering tell.
                if let Some(carrier) = load.carrier_org {
                    self.attestations.record_suspicious_activity(SuspiciousActivity {
                        load_id,
                        carrier_org: carrier,
                        code: "PICKUP_FAR_FROM_SITE".to_string(),
                        detail: format!(
                            "pickup-stage ping {distance_meters:.0}m from site while RELEASED"
                        ),
                        flagged_at: now,
                    })?;
                }
                notifications.push(Notification::new(
                    load_id,
                    Audience::Ops,
                    NotificationKind::SuspiciousActivityFlagged,
                    format!("pickup ping {distance_meters:.0}m outside fence"),
                ));
            }
            (TripStage::AtDelivery, LoadStatus::InTransit, true) => {
                if let Some(updated) =
                    self.propose(load_id, LoadStatus::InTransit, LoadStatus::Delivered, &mut |l| {
                        l.release.actual_delivery_at = Some(now);
                    })
                {
                    load_after = updated;
                    triggered = true;
                    notifications.push(Notification::new(
                        load_id,
                        Audience::Shipper,
                        NotificationKind::DeliveryConfirmed,
                        "driver arrived at delivery site",
                    ));
                }
            }
            _ => {}
        }

        let event = GeoEvent {
            id: GeoEventId::new(),
            load_id,
            driver_id,
            position,
            stage,
            source: source.to_string(),
            distance_meters,
            within_fence,
            triggered_transition: triggered,
            recorded_at: now,
        };
        self.telemetry.append_geo_event(event.clone())?;

        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(PingOutcome {
            event,
            load: load_after,
            triggered,
            notifications,
        })
    }

    /// Best-effort proposal: a sample losing the transition race yields
    /// `None` rather than an error.
    fn propose(
        &self,
        load_id: LoadId,
        expected: LoadStatus,
        target: LoadStatus,
        patch: &mut dyn FnMut(&mut Load),
    ) -> Option<Load> {
        match self.engine.request_transition(
            load_id,
            expected,
            target,
            ActorRole::System,
            Some("geofence trigger".to_string()),
            patch,
        ) {
            Ok(load) => Some(load),
            Err(LifecycleError::Store(StoreError::State(StateError::StaleState {
                ..
            }))) => {
                tracing::warn!(load_id = %load_id, "geofence proposal lost transition race");
                None
            }
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "geofence proposal rejected");
                None
            }
        }
    }
}
