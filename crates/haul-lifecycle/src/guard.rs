//! # Double-Broker Guard
//!
//! Defends against a carrier illicitly subcontracting an assigned load.
//! Three checks, none auto-blocking beyond its own operation:
//!
//! 1. pickup-location disclosure is gated on a signed non-subcontracting
//!    attestation;
//! 2. dispatch details must name equipment or a driver, and a supplied
//!    VIN must resolve to carrier-owned equipment;
//! 3. pickup-proximity cross-checks reuse the same distance function as
//!    the geofence, flagging (not blocking) mismatches for manual review.

use std::sync::Arc;

use haul_core::{AttestationId, DistanceCalculator, DriverId, GeoPoint, LoadId, OrgId, Timestamp,
    METERS_PER_MILE};
use haul_state::{Attestation, AttestationType, LoadStatus, Stop, SuspiciousActivity};
use haul_store::AttestationStore;

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use crate::geofence::GEOFENCE_RADIUS_METERS;

/// External lookup resolving a VIN to the organization that owns the
/// equipment.
pub trait EquipmentLookup: Send + Sync {
    fn vin_owner(&self, vin: &str) -> Option<OrgId>;
}

/// Dispatch details supplied by the carrier before pickup. At least one
/// field must be present.
#[derive(Debug, Clone, Default)]
pub struct DispatchDetails {
    /// VIN of the truck assigned to the haul.
    pub vin: Option<String>,
    /// Platform id of the assigned driver.
    pub driver_id: Option<DriverId>,
    /// Driver name as dispatched.
    pub driver_name: Option<String>,
}

/// Result of a pickup-proximity cross-check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityCheck {
    /// Distance from the reported position to the pickup site, meters.
    pub distance_meters: f64,
    /// Whether the position falls inside the geofence.
    pub within_fence: bool,
}

/// Gates disclosure and verifies dispatch against subcontracting.
pub struct DoubleBrokerGuard {
    engine: Arc<LifecycleEngine>,
    attestations: Arc<dyn AttestationStore>,
    equipment: Arc<dyn EquipmentLookup>,
    distance: Arc<dyn DistanceCalculator>,
}

impl DoubleBrokerGuard {
    pub fn new(
        engine: Arc<LifecycleEngine>,
        attestations: Arc<dyn AttestationStore>,
        equipment: Arc<dyn EquipmentLookup>,
        distance: Arc<dyn DistanceCalculator>,
    ) -> Self {
        Self {
            engine,
            attestations,
            equipment,
            distance,
        }
    }

    /// Record the carrier's signed non-subcontracting attestation.
    ///
    /// Idempotent per (load, type): signing twice returns the original
    /// record, no duplicate row.
    pub fn sign_attestation(
        &self,
        load_id: LoadId,
        ip_address: Option<String>,
    ) -> Result<Attestation, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        let carrier = load
            .carrier_org
            .ok_or(LifecycleError::NoCarrierAssigned(load_id))?;
        let attestation = Attestation {
            id: AttestationId::new(),
            load_id,
            carrier_org: carrier,
            attestation_type: AttestationType::NonSubcontracting,
            ip_address,
            signed_at: Timestamp::now(),
        };
        Ok(self.attestations.create_attestation(attestation)?)
    }

    /// Disclose the pickup stop, gated on the signed attestation.
    pub fn pickup_disclosure(&self, load_id: LoadId) -> Result<Stop, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        let signed = self
            .attestations
            .attestation_for_load(load_id, AttestationType::NonSubcontracting)
            .is_some();
        if !signed {
            return Err(LifecycleError::AttestationRequired(load_id));
        }
        Ok(load.origin)
    }

    /// Verify dispatch details: at least one identifier, and any supplied
    /// VIN must resolve to equipment the assigned carrier owns.
    pub fn verify_dispatch_details(
        &self,
        load_id: LoadId,
        details: &DispatchDetails,
    ) -> Result<(), LifecycleError> {
        if details.vin.is_none() && details.driver_id.is_none() && details.driver_name.is_none() {
            return Err(LifecycleError::DispatchDetailsRequired);
        }
        let Some(vin) = details.vin.as_deref() else {
            return Ok(());
        };

        let load = self.engine.loads().get_load(load_id)?;
        let carrier = load
            .carrier_org
            .ok_or(LifecycleError::NoCarrierAssigned(load_id))?;
        match self.equipment.vin_owner(vin) {
            None => Err(LifecycleError::VinNotFound(vin.to_string())),
            Some(owner) if owner == carrier => Ok(()),
            Some(_) => {
                // Someone else's truck on this load is the double-broker
                // signature; flag it before rejecting.
                self.attestations.record_suspicious_activity(SuspiciousActivity {
                    load_id,
                    carrier_org: carrier,
                    code: "VIN_NOT_OWNED_BY_CARRIER".to_string(),
                    detail: format!("dispatched VIN {vin} belongs to another organization"),
                    flagged_at: Timestamp::now(),
                })?;
                Err(LifecycleError::VinNotOwnedByCarrier(vin.to_string()))
            }
        }
    }

    /// Cross-check a reported position against the pickup site with the
    /// same distance function the geofence uses. A mismatch while the
    /// load is `RELEASED` is flagged for manual review, never blocked
    /// here.
    pub fn verify_pickup_proximity(
        &self,
        load_id: LoadId,
        position: GeoPoint,
    ) -> Result<ProximityCheck, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        let distance_meters =
            self.distance.distance_miles(position, load.origin.coordinates) * METERS_PER_MILE;
        let within_fence = distance_meters <= GEOFENCE_RADIUS_METERS;

        if !within_fence && load.status == LoadStatus::Released {
            if let Some(carrier) = load.carrier_org {
                self.attestations.record_suspicious_activity(SuspiciousActivity {
                    load_id,
                    carrier_org: carrier,
                    code: "PICKUP_FAR_FROM_SITE".to_string(),
                    detail: format!(
                        "proximity check {distance_meters:.0}m from pickup while RELEASED"
                    ),
                    flagged_at: Timestamp::now(),
                })?;
            }
        }
        Ok(ProximityCheck {
            distance_meters,
            within_fence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::testing::{Fixture, PICKUP_POINT};
    use haul_core::HaversineDistance;
    use haul_store::LoadStore;

    struct StaticEquipment(HashMap<String, OrgId>);

    impl EquipmentLookup for StaticEquipment {
        fn vin_owner(&self, vin: &str) -> Option<OrgId> {
            self.0.get(vin).copied()
        }
    }

    fn guard_with_fleet(f: &Fixture, fleet: HashMap<String, OrgId>) -> DoubleBrokerGuard {
        DoubleBrokerGuard::new(
            f.engine.clone(),
            Arc::new(f.store.clone()),
            Arc::new(StaticEquipment(fleet)),
            Arc::new(HaversineDistance),
        )
    }

    #[test]
    fn attestation_is_idempotent_per_load() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.accepted_load(100_000, 40.0, 12);

        let first = guard.sign_attestation(load_id, Some("203.0.113.9".to_string())).unwrap();
        let second = guard.sign_attestation(load_id, None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.ip_address, Some("203.0.113.9".to_string()));
    }

    #[test]
    fn disclosure_requires_attestation() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.accepted_load(100_000, 40.0, 12);

        let err = guard.pickup_disclosure(load_id).unwrap_err();
        assert_eq!(err, LifecycleError::AttestationRequired(load_id));

        guard.sign_attestation(load_id, None).unwrap();
        let stop = guard.pickup_disclosure(load_id).unwrap();
        assert_eq!(stop.coordinates, PICKUP_POINT);
    }

    #[test]
    fn dispatch_details_require_at_least_one_field() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.accepted_load(100_000, 40.0, 12);

        let err = guard
            .verify_dispatch_details(load_id, &DispatchDetails::default())
            .unwrap_err();
        assert_eq!(err, LifecycleError::DispatchDetailsRequired);

        // A driver name alone is sufficient.
        guard
            .verify_dispatch_details(
                load_id,
                &DispatchDetails {
                    driver_name: Some("R. Alvarez".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn unknown_vin_is_rejected() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.accepted_load(100_000, 40.0, 12);

        let err = guard
            .verify_dispatch_details(
                load_id,
                &DispatchDetails {
                    vin: Some("1FUJGLDR0CLBP8834".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, LifecycleError::VinNotFound("1FUJGLDR0CLBP8834".to_string()));
    }

    #[test]
    fn foreign_vin_is_rejected_and_flagged() {
        let f = Fixture::new();
        let load_id = f.accepted_load(100_000, 40.0, 12);
        let other_org = OrgId::new();
        let guard = guard_with_fleet(
            &f,
            HashMap::from([("1FUJGLDR0CLBP8834".to_string(), other_org)]),
        );

        let err = guard
            .verify_dispatch_details(
                load_id,
                &DispatchDetails {
                    vin: Some("1FUJGLDR0CLBP8834".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LifecycleError::VinNotOwnedByCarrier(_)));

        let flags = f.store.suspicious_activity_for_load(load_id);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].code, "VIN_NOT_OWNED_BY_CARRIER");
    }

    #[test]
    fn carrier_owned_vin_passes() {
        let f = Fixture::new();
        let load_id = f.accepted_load(100_000, 40.0, 12);
        let carrier = f.store.get_load(load_id).unwrap().carrier_org.unwrap();
        let guard = guard_with_fleet(
            &f,
            HashMap::from([("1FUJGLDR0CLBP8834".to_string(), carrier)]),
        );

        guard
            .verify_dispatch_details(
                load_id,
                &DispatchDetails {
                    vin: Some("1FUJGLDR0CLBP8834".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(f.store.suspicious_activity_for_load(load_id).is_empty());
    }

    #[test]
    fn proximity_mismatch_while_released_is_flagged_not_blocked() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.released_load(100_000, 40.0);

        // Ping from the delivery end of the haul, far outside the fence.
        let check = guard
            .verify_pickup_proximity(load_id, GeoPoint::new(39.55, -104.87))
            .unwrap();
        assert!(!check.within_fence);
        assert!(check.distance_meters > GEOFENCE_RADIUS_METERS);

        let flags = f.store.suspicious_activity_for_load(load_id);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].code, "PICKUP_FAR_FROM_SITE");
        // The load itself is untouched.
        assert_eq!(f.store.get_load(load_id).unwrap().status, LoadStatus::Released);
    }

    #[test]
    fn proximity_match_records_nothing() {
        let f = Fixture::new();
        let guard = guard_with_fleet(&f, HashMap::new());
        let load_id = f.released_load(100_000, 40.0);

        let check = guard.verify_pickup_proximity(load_id, PICKUP_POINT).unwrap();
        assert!(check.within_fence);
        assert!(f.store.suspicious_activity_for_load(load_id).is_empty());
    }
}
