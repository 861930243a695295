//! # Cancellation Service
//!
//! Terminal-path handler for both sides walking away. The fee comes from
//! the policy tables; this service owns the status write, the hold
//! release, and the record-keeping.
//!
//! ## Design Choice: Customer Cancels, Carrier Rolls Back
//!
//! A customer cancellation is terminal: the load goes to `CANCELLED` and
//! the escrow hold (if any) is released. A carrier cancellation is a
//! rollback: the load returns to `POSTED` for relisting with the carrier
//! assignment and release fields cleared — but the fee and attribution
//! still land in the cancellation record, because the carrier's walk-away
//! has a cost even though the load lives on.

use std::sync::Arc;

use haul_core::{ActorRole, LoadId, OrgId, Timestamp};
use haul_policy::{carrier_compensation_cents, fee_for, FeeDecision};
use haul_state::{Load, LoadStatus, Party};

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use crate::notify::{dispatch_all, Audience, Notification, NotificationKind};

/// Outcome of a cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationOutcome {
    /// The load after the write (`CANCELLED`, or `POSTED` for a carrier
    /// rollback).
    pub load: Load,
    /// The fee decision applied.
    pub fee: FeeDecision,
    /// Compensation owed to the carrier, when a customer cancelled a load
    /// with a carrier assigned.
    pub carrier_compensation_cents: Option<i64>,
    /// Notifications queued by the cancellation.
    pub notifications: Vec<Notification>,
}

/// Terminal-path handler for cancellations.
pub struct CancellationService {
    engine: Arc<LifecycleEngine>,
}

impl CancellationService {
    pub fn new(engine: Arc<LifecycleEngine>) -> Self {
        Self { engine }
    }

    /// Cancel a load on behalf of `cancelled_by` (`party` names the side).
    pub fn cancel(
        &self,
        load_id: LoadId,
        cancelled_by: OrgId,
        party: Party,
        reason: Option<String>,
    ) -> Result<CancellationOutcome, LifecycleError> {
        let load = self.engine.loads().get_load(load_id)?;
        let now = Timestamp::now();
        let hours_until_pickup = load.hours_until_pickup(now);
        let fee = fee_for(
            load.status,
            party,
            hours_until_pickup,
            load.commercial.gross_revenue_cents,
        )?;

        let compensation = match party {
            Party::Customer if load.carrier_org.is_some() && fee.fee_cents > 0 => {
                Some(carrier_compensation_cents(fee.fee_cents))
            }
            _ => None,
        };

        let (target, actor) = match party {
            Party::Customer => (LoadStatus::Cancelled, ActorRole::Customer),
            Party::Carrier => (LoadStatus::Posted, ActorRole::Carrier),
        };

        let fee_cents = fee.fee_cents;
        let reason_for_record = reason.clone();
        let load = self.engine.request_transition(
            load_id,
            load.status,
            target,
            actor,
            reason.clone(),
            &mut |load| {
                load.cancellation.cancelled_by = Some(cancelled_by);
                load.cancellation.cancellation_type = Some(party);
                load.cancellation.reason = reason_for_record.clone();
                load.cancellation.fee_cents = Some(fee_cents);
                load.cancellation.cancelled_at = Some(now);
                if party == Party::Carrier {
                    load.clear_assignment();
                }
            },
        )?;

        // Release any escrow hold; a no-op when nothing was authorized.
        self.engine.escrow().cancel_payment(load_id)?;

        let audience = match party {
            Party::Customer => Audience::Carrier,
            Party::Carrier => Audience::Shipper,
        };
        let notifications = vec![Notification::new(
            load_id,
            audience,
            NotificationKind::LoadCancelled,
            format!("load cancelled by {party}: {}", fee.reason),
        )];
        dispatch_all(self.engine.notifier().as_ref(), &notifications);
        Ok(CancellationOutcome {
            load,
            fee,
            carrier_compensation_cents: compensation,
            notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use haul_policy::PolicyError;
    use haul_state::{InvoiceStatus, StateError};
    use haul_store::{LoadStore, SettlementStore};

    fn service(f: &Fixture) -> CancellationService {
        CancellationService::new(f.engine.clone())
    }

    #[test]
    fn customer_cancel_accepted_30h_charges_ten_percent() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.accepted_load(200_000, 40.0, 30);
        let shipper = f.store.get_load(load_id).unwrap().shipper_org;

        let outcome = svc
            .cancel(load_id, shipper, Party::Customer, Some("job postponed".to_string()))
            .unwrap();
        assert_eq!(outcome.load.status, LoadStatus::Cancelled);
        assert_eq!(outcome.fee.fee_cents, 20_000);
        assert_eq!(outcome.carrier_compensation_cents, Some(15_000));
        assert_eq!(outcome.load.cancellation.cancellation_type, Some(Party::Customer));
        assert_eq!(outcome.load.cancellation.fee_cents, Some(20_000));
    }

    #[test]
    fn customer_cancel_posted_is_free_no_compensation() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.draft_load(200_000, 40.0);
        f.advance(load_id, LoadStatus::Draft, LoadStatus::Posted);
        let shipper = f.store.get_load(load_id).unwrap().shipper_org;

        let outcome = svc.cancel(load_id, shipper, Party::Customer, None).unwrap();
        assert_eq!(outcome.fee.fee_cents, 0);
        assert_eq!(outcome.carrier_compensation_cents, None);
    }

    #[test]
    fn customer_cancel_released_releases_hold() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.released_load(100_000, 40.0);
        f.escrow.authorize_payment(load_id).unwrap();
        let shipper = f.store.get_load(load_id).unwrap().shipper_org;

        let outcome = svc.cancel(load_id, shipper, Party::Customer, None).unwrap();
        assert_eq!(outcome.fee.fee_cents, 75_000);
        assert_eq!(
            f.store.invoice_for_load(load_id).unwrap().status,
            InvoiceStatus::Cancelled
        );
    }

    #[test]
    fn customer_cannot_cancel_in_transit() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.released_load(100_000, 40.0);
        f.advance(load_id, LoadStatus::Released, LoadStatus::InTransit);
        let shipper = f.store.get_load(load_id).unwrap().shipper_org;

        let err = svc.cancel(load_id, shipper, Party::Customer, None).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::State(StateError::InvalidTransition { .. })
        ));
        assert_eq!(f.store.get_load(load_id).unwrap().status, LoadStatus::InTransit);
    }

    #[test]
    fn carrier_cancel_rolls_back_to_posted_and_clears_assignment() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.accepted_load(100_000, 40.0, 6);
        let carrier = f.store.get_load(load_id).unwrap().carrier_org.unwrap();

        let outcome = svc
            .cancel(load_id, carrier, Party::Carrier, Some("truck broke down".to_string()))
            .unwrap();
        assert_eq!(outcome.load.status, LoadStatus::Posted);
        assert!(outcome.load.carrier_org.is_none());
        assert_eq!(outcome.load.release, Default::default());
        // 2-12h tier.
        assert_eq!(outcome.fee.fee_cents, 10_000);
        // Fee and attribution survive the rollback.
        assert_eq!(outcome.load.cancellation.cancelled_by, Some(carrier));
        assert_eq!(outcome.load.cancellation.fee_cents, Some(10_000));
    }

    #[test]
    fn carrier_cancel_in_transit_is_rejected_by_policy() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.released_load(100_000, 40.0);
        f.advance(load_id, LoadStatus::Released, LoadStatus::InTransit);
        let carrier = f.store.get_load(load_id).unwrap().carrier_org.unwrap();

        let err = svc.cancel(load_id, carrier, Party::Carrier, None).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::Policy(PolicyError::CannotCancelInTransit)
        );
    }

    #[test]
    fn carrier_cancel_after_release_is_severe() {
        let f = Fixture::new();
        let svc = service(&f);
        let load_id = f.released_load(100_000, 40.0);
        f.escrow.authorize_payment(load_id).unwrap();
        let carrier = f.store.get_load(load_id).unwrap().carrier_org.unwrap();

        let outcome = svc.cancel(load_id, carrier, Party::Carrier, None).unwrap();
        assert_eq!(outcome.fee.fee_cents, 50_000);
        assert_eq!(outcome.load.status, LoadStatus::Posted);
        // Hold released so the relisted load can re-authorize cleanly.
        assert_eq!(
            f.store.invoice_for_load(load_id).unwrap().status,
            InvoiceStatus::Cancelled
        );
    }
}
