//! Shared test fixtures: an in-memory stack with a scripted gateway.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use haul_core::{ActorRole, GeoPoint, LoadId, OrgId, Timestamp};
use haul_escrow::{
    EscrowConfig, EscrowOrchestrator, GatewayError, GatewayMetadata, GatewayRef, PaymentGateway,
};
use haul_state::{CommercialTerms, Load, LoadStatus, RateMode, Stop, TimeWindow};
use haul_store::{LoadStore, MemoryStore};

use crate::engine::LifecycleEngine;
use crate::notify::{LogNotifier, Notifier};

/// Scripted gateway: counts calls, fails on demand.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    pub fail_authorize: AtomicBool,
    pub fail_capture: AtomicBool,
    pub fail_transfer: AtomicBool,
    pub authorize_calls: AtomicUsize,
    pub capture_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub refund_calls: AtomicUsize,
    pub transfer_calls: AtomicUsize,
}

impl PaymentGateway for ScriptedGateway {
    fn authorize(
        &self,
        _customer_ref: &str,
        _method_ref: &str,
        _amount_cents: i64,
        _metadata: &GatewayMetadata,
    ) -> Result<GatewayRef, GatewayError> {
        let n = self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_authorize.load(Ordering::SeqCst) {
            return Err(GatewayError::Declined("card declined".to_string()));
        }
        Ok(GatewayRef {
            reference: format!("pi_{n}"),
            status: "requires_capture".to_string(),
        })
    }

    fn capture(&self, intent_ref: &str) -> Result<GatewayRef, GatewayError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("timeout".to_string()));
        }
        Ok(GatewayRef {
            reference: intent_ref.to_string(),
            status: "succeeded".to_string(),
        })
    }

    fn cancel(&self, _intent_ref: &str) -> Result<(), GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn refund(
        &self,
        intent_ref: &str,
        _amount_cents: Option<i64>,
    ) -> Result<GatewayRef, GatewayError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayRef {
            reference: format!("re_{intent_ref}"),
            status: "succeeded".to_string(),
        })
    }

    fn transfer(
        &self,
        _destination_ref: &str,
        _amount_cents: i64,
        _metadata: &GatewayMetadata,
    ) -> Result<GatewayRef, GatewayError> {
        let n = self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transfer.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("timeout".to_string()));
        }
        Ok(GatewayRef {
            reference: format!("tr_{n}"),
            status: "paid".to_string(),
        })
    }
}

/// Denver-area pickup coordinates used across fixtures.
pub(crate) const PICKUP_POINT: GeoPoint = GeoPoint {
    latitude: 39.78,
    longitude: -104.97,
};

/// Delivery coordinates roughly 18 miles south of [`PICKUP_POINT`].
pub(crate) const DELIVERY_POINT: GeoPoint = GeoPoint {
    latitude: 39.55,
    longitude: -104.87,
};

pub(crate) fn stop_at(point: GeoPoint, window_start: Timestamp) -> Stop {
    Stop {
        address: "4800 Brighton Blvd".to_string(),
        city: "Denver".to_string(),
        region: "CO".to_string(),
        coordinates: point,
        window: TimeWindow {
            start: window_start,
            end: window_start.plus_hours(4),
        },
    }
}

/// In-memory stack wired the way production wires it.
pub(crate) struct Fixture {
    pub store: MemoryStore,
    pub gateway: Arc<ScriptedGateway>,
    pub escrow: Arc<EscrowOrchestrator>,
    pub engine: Arc<LifecycleEngine>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let store = MemoryStore::new();
        let gateway = Arc::new(ScriptedGateway::default());
        let escrow = Arc::new(EscrowOrchestrator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            gateway.clone(),
            EscrowConfig::default(),
        ));
        let engine = Arc::new(LifecycleEngine::new(
            Arc::new(store.clone()),
            escrow.clone(),
            notifier,
        ));
        Self {
            store,
            gateway,
            escrow,
            engine,
        }
    }

    /// Insert a fresh DRAFT load with a stored payment method.
    pub fn draft_load(&self, gross: i64, miles: f64) -> LoadId {
        self.draft_load_with_pickup_in(gross, miles, 12)
    }

    /// Insert a DRAFT load whose pickup window opens `hours` from now.
    pub fn draft_load_with_pickup_in(&self, gross: i64, miles: f64, hours: i64) -> LoadId {
        let pickup_start = Timestamp::now().plus_hours(hours);
        let mut load = Load::new(
            OrgId::new(),
            CommercialTerms {
                rate_cents: gross,
                gross_revenue_cents: gross,
                rate_mode: RateMode::FlatRate,
                miles,
            },
            stop_at(PICKUP_POINT, pickup_start),
            stop_at(DELIVERY_POINT, pickup_start.plus_hours(5)),
        );
        load.payment_method_ref = Some("pm_test".to_string());
        let id = load.id;
        self.store.create_load(load).unwrap();
        id
    }

    /// Insert a load already in ACCEPTED with a carrier assigned, pickup
    /// window opening `hours` from now.
    pub fn accepted_load(&self, gross: i64, miles: f64, hours: i64) -> LoadId {
        let id = self.draft_load_with_pickup_in(gross, miles, hours);
        self.store
            .update_load(id, LoadStatus::Draft, &mut |load| {
                load.status = LoadStatus::Accepted;
                load.carrier_org = Some(OrgId::new());
            })
            .unwrap();
        id
    }

    /// Insert a load already RELEASED with release fields stamped.
    pub fn released_load(&self, gross: i64, miles: f64) -> LoadId {
        let id = self.accepted_load(gross, miles, 12);
        let now = Timestamp::now();
        self.store
            .update_load(id, LoadStatus::Accepted, &mut |load| {
                load.status = LoadStatus::Released;
                load.release.release_number = Some("RL-2026-0badf00d".to_string());
                load.release.shipper_confirmed_ready = true;
                load.release.shipper_acknowledged_tonu = true;
                load.release.released_at = Some(now);
                load.release.release_expires_at = Some(now.plus_hours(24));
            })
            .unwrap();
        id
    }

    /// Force a transition for setup, bypassing manager side effects.
    pub fn advance(&self, load_id: LoadId, from: LoadStatus, to: LoadStatus) {
        self.store
            .update_load(load_id, from, &mut |load| {
                load.apply_transition(to, ActorRole::System, None);
            })
            .unwrap();
    }
}
