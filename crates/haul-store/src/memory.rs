//! In-memory storage backend using DashMap.
//!
//! Each record type gets its own `DashMap`; the load map's entry lock is
//! what makes [`LoadStore::update_load`] a real compare-and-swap. Cheaply
//! cloneable via `Arc` — all clones share the same data.

use std::sync::Arc;

use dashmap::DashMap;

use haul_core::{DisputeId, InvoiceId, LoadId, PayoutId, Timestamp};
use haul_state::{
    Attestation, AttestationType, DisputeEvidence, GeoEvent, Invoice, Load, LoadStatus, Payout,
    SuspiciousActivity,
};

use crate::error::StoreError;
use crate::traits::{
    stale, AttestationStore, EvidenceStore, LoadStore, SettlementStore, TelemetryStore,
};

struct Inner {
    loads: DashMap<LoadId, Load>,
    invoices: DashMap<InvoiceId, Invoice>,
    payouts: DashMap<PayoutId, Payout>,
    evidence: DashMap<DisputeId, Vec<DisputeEvidence>>,
    geo_events: DashMap<LoadId, Vec<GeoEvent>>,
    attestations: DashMap<(LoadId, AttestationType), Attestation>,
    suspicious: DashMap<LoadId, Vec<SuspiciousActivity>>,
}

/// In-memory implementation of every persistence trait.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                loads: DashMap::new(),
                invoices: DashMap::new(),
                payouts: DashMap::new(),
                evidence: DashMap::new(),
                geo_events: DashMap::new(),
                attestations: DashMap::new(),
                suspicious: DashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadStore for MemoryStore {
    fn create_load(&self, load: Load) -> Result<(), StoreError> {
        if self.inner.loads.contains_key(&load.id) {
            return Err(StoreError::Duplicate(load.id.to_string()));
        }
        self.inner.loads.insert(load.id, load);
        Ok(())
    }

    fn get_load(&self, id: LoadId) -> Result<Load, StoreError> {
        self.inner
            .loads
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::LoadNotFound(id))
    }

    fn update_load(
        &self,
        id: LoadId,
        expected: LoadStatus,
        patch: &mut dyn FnMut(&mut Load),
    ) -> Result<Load, StoreError> {
        // get_mut holds the shard lock, so the status check and the patch
        // are a single atomic step with respect to other writers.
        let mut entry = self
            .inner
            .loads
            .get_mut(&id)
            .ok_or(StoreError::LoadNotFound(id))?;
        if entry.status != expected {
            return Err(stale(expected, entry.status));
        }
        patch(&mut entry);
        entry.updated_at = Timestamp::now();
        Ok(entry.clone())
    }

    fn loads_with_status(&self, status: LoadStatus) -> Vec<Load> {
        self.inner
            .loads
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.clone())
            .collect()
    }
}

impl SettlementStore for MemoryStore {
    fn create_invoice(&self, invoice: Invoice) -> Result<(), StoreError> {
        if self.inner.invoices.contains_key(&invoice.id) {
            return Err(StoreError::Duplicate(invoice.id.to_string()));
        }
        self.inner.invoices.insert(invoice.id, invoice);
        Ok(())
    }

    fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError> {
        self.inner
            .invoices
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::InvoiceNotFound(id))
    }

    fn invoice_for_load(&self, load_id: LoadId) -> Option<Invoice> {
        self.inner
            .invoices
            .iter()
            .find(|entry| entry.load_id == load_id)
            .map(|entry| entry.clone())
    }

    fn update_invoice(
        &self,
        id: InvoiceId,
        patch: &mut dyn FnMut(&mut Invoice),
    ) -> Result<Invoice, StoreError> {
        let mut entry = self
            .inner
            .invoices
            .get_mut(&id)
            .ok_or(StoreError::InvoiceNotFound(id))?;
        patch(&mut entry);
        entry.updated_at = Timestamp::now();
        Ok(entry.clone())
    }

    fn create_payout(&self, payout: Payout) -> Result<(), StoreError> {
        if self.inner.payouts.contains_key(&payout.id) {
            return Err(StoreError::Duplicate(payout.id.to_string()));
        }
        self.inner.payouts.insert(payout.id, payout);
        Ok(())
    }

    fn get_payout(&self, id: PayoutId) -> Result<Payout, StoreError> {
        self.inner
            .payouts
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::PayoutNotFound(id))
    }

    fn payout_for_load(&self, load_id: LoadId) -> Option<Payout> {
        self.inner
            .payouts
            .iter()
            .find(|entry| entry.load_id == load_id)
            .map(|entry| entry.clone())
    }

    fn update_payout(
        &self,
        id: PayoutId,
        patch: &mut dyn FnMut(&mut Payout),
    ) -> Result<Payout, StoreError> {
        let mut entry = self
            .inner
            .payouts
            .get_mut(&id)
            .ok_or(StoreError::PayoutNotFound(id))?;
        patch(&mut entry);
        entry.updated_at = Timestamp::now();
        Ok(entry.clone())
    }
}

impl EvidenceStore for MemoryStore {
    fn append_evidence(&self, evidence: DisputeEvidence) -> Result<(), StoreError> {
        self.inner
            .evidence
            .entry(evidence.dispute_id)
            .or_default()
            .push(evidence);
        Ok(())
    }

    fn evidence_for_dispute(&self, dispute_id: DisputeId) -> Vec<DisputeEvidence> {
        self.inner
            .evidence
            .get(&dispute_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

impl TelemetryStore for MemoryStore {
    fn append_geo_event(&self, event: GeoEvent) -> Result<(), StoreError> {
        self.inner
            .geo_events
            .entry(event.load_id)
            .or_default()
            .push(event);
        Ok(())
    }

    fn geo_events_for_load(&self, load_id: LoadId) -> Vec<GeoEvent> {
        self.inner
            .geo_events
            .get(&load_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

impl AttestationStore for MemoryStore {
    fn create_attestation(&self, attestation: Attestation) -> Result<Attestation, StoreError> {
        // entry() holds the shard lock, making the check-then-insert
        // idempotency race-free.
        let record = self
            .inner
            .attestations
            .entry((attestation.load_id, attestation.attestation_type))
            .or_insert(attestation);
        Ok(record.clone())
    }

    fn attestation_for_load(
        &self,
        load_id: LoadId,
        attestation_type: AttestationType,
    ) -> Option<Attestation> {
        self.inner
            .attestations
            .get(&(load_id, attestation_type))
            .map(|entry| entry.clone())
    }

    fn record_suspicious_activity(&self, activity: SuspiciousActivity) -> Result<(), StoreError> {
        self.inner
            .suspicious
            .entry(activity.load_id)
            .or_default()
            .push(activity);
        Ok(())
    }

    fn suspicious_activity_for_load(&self, load_id: LoadId) -> Vec<SuspiciousActivity> {
        self.inner
            .suspicious
            .get(&load_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haul_core::{ActorRole, GeoPoint, OrgId};
    use haul_state::{CommercialTerms, RateMode, StateError, Stop, TimeWindow};

    fn sample_stop() -> Stop {
        let start = Timestamp::parse("2026-03-02T08:00:00Z").unwrap();
        Stop {
            address: "1200 Alameda Ave".to_string(),
            city: "Denver".to_string(),
            region: "CO".to_string(),
            coordinates: GeoPoint::new(39.71, -105.02),
            window: TimeWindow {
                start,
                end: start.plus_hours(4),
            },
        }
    }

    fn sample_load() -> Load {
        Load::new(
            OrgId::new(),
            CommercialTerms {
                rate_cents: 120_000,
                gross_revenue_cents: 120_000,
                rate_mode: RateMode::FlatRate,
                miles: 42.0,
            },
            sample_stop(),
            sample_stop(),
        )
    }

    #[test]
    fn create_and_get_load_roundtrip() {
        let store = MemoryStore::new();
        let load = sample_load();
        let id = load.id;
        store.create_load(load.clone()).unwrap();
        assert_eq!(store.get_load(id).unwrap(), load);
    }

    #[test]
    fn create_load_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let load = sample_load();
        store.create_load(load.clone()).unwrap();
        let err = store.create_load(load).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn get_missing_load_is_not_found() {
        let store = MemoryStore::new();
        let id = LoadId::new();
        assert_eq!(store.get_load(id).unwrap_err(), StoreError::LoadNotFound(id));
    }

    #[test]
    fn update_load_applies_patch_when_status_matches() {
        let store = MemoryStore::new();
        let load = sample_load();
        let id = load.id;
        store.create_load(load).unwrap();

        let updated = store
            .update_load(id, LoadStatus::Draft, &mut |load| {
                load.apply_transition(LoadStatus::Posted, ActorRole::Customer, None);
            })
            .unwrap();
        assert_eq!(updated.status, LoadStatus::Posted);
        assert_eq!(store.get_load(id).unwrap().status, LoadStatus::Posted);
    }

    #[test]
    fn update_load_rejects_stale_expected_status() {
        let store = MemoryStore::new();
        let load = sample_load();
        let id = load.id;
        store.create_load(load).unwrap();

        let err = store
            .update_load(id, LoadStatus::Posted, &mut |_| {})
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::State(StateError::StaleState {
                expected: LoadStatus::Posted,
                actual: LoadStatus::Draft,
            })
        );
        // Patch must not have run.
        assert_eq!(store.get_load(id).unwrap().status, LoadStatus::Draft);
    }

    #[test]
    fn loads_with_status_filters() {
        let store = MemoryStore::new();
        let a = sample_load();
        let b = sample_load();
        let b_id = b.id;
        store.create_load(a).unwrap();
        store.create_load(b).unwrap();
        store
            .update_load(b_id, LoadStatus::Draft, &mut |load| {
                load.apply_transition(LoadStatus::Posted, ActorRole::Customer, None);
            })
            .unwrap();

        assert_eq!(store.loads_with_status(LoadStatus::Draft).len(), 1);
        assert_eq!(store.loads_with_status(LoadStatus::Posted).len(), 1);
        assert!(store.loads_with_status(LoadStatus::Released).is_empty());
    }

    #[test]
    fn invoice_lookup_by_load() {
        let store = MemoryStore::new();
        let load_id = LoadId::new();
        let invoice = Invoice::drafted(load_id, OrgId::new(), 120_000);
        let invoice_id = invoice.id;
        store.create_invoice(invoice).unwrap();

        assert_eq!(store.invoice_for_load(load_id).unwrap().id, invoice_id);
        assert!(store.invoice_for_load(LoadId::new()).is_none());
    }

    #[test]
    fn attestation_create_is_idempotent() {
        let store = MemoryStore::new();
        let load_id = LoadId::new();
        let carrier = OrgId::new();
        let first = Attestation {
            id: haul_core::AttestationId::new(),
            load_id,
            carrier_org: carrier,
            attestation_type: AttestationType::NonSubcontracting,
            ip_address: Some("203.0.113.7".to_string()),
            signed_at: Timestamp::now(),
        };
        let second = Attestation {
            id: haul_core::AttestationId::new(),
            load_id,
            carrier_org: carrier,
            attestation_type: AttestationType::NonSubcontracting,
            ip_address: Some("203.0.113.7".to_string()),
            signed_at: Timestamp::now(),
        };

        let stored_first = store.create_attestation(first.clone()).unwrap();
        let stored_second = store.create_attestation(second).unwrap();
        assert_eq!(stored_first.id, first.id);
        // Second signing returns the original record unchanged.
        assert_eq!(stored_second.id, first.id);
    }

    #[test]
    fn evidence_append_preserves_order() {
        let store = MemoryStore::new();
        let dispute_id = DisputeId::new();
        let load_id = LoadId::new();
        for artifact in ["s3://e/1", "s3://e/2", "s3://e/3"] {
            store
                .append_evidence(DisputeEvidence::new(
                    dispute_id,
                    load_id,
                    OrgId::new(),
                    haul_state::Party::Carrier,
                    haul_state::EvidenceType::Photo,
                    vec![artifact.to_string()],
                    None,
                ))
                .unwrap();
        }
        let evidence = store.evidence_for_dispute(dispute_id);
        assert_eq!(evidence.len(), 3);
        assert_eq!(evidence[0].file_urls, vec!["s3://e/1".to_string()]);
        assert_eq!(evidence[2].file_urls, vec!["s3://e/3".to_string()]);
    }
}
