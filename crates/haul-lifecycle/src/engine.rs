//! # Load State Machine Engine
//!
//! The single component that owns the adjacency table and the atomic
//! write. Every status change in the system — whether proposed by an API
//! call, a GPS ping, or a scheduled job — funnels through
//! [`LifecycleEngine::request_transition`]: legality is checked against
//! [`LoadStatus::valid_transitions`], then the patch and the transition
//! record are applied in one compare-and-swap against the store.
//!
//! ## Design Choice: One Gate, Thin Callers
//!
//! The release, cancellation, geofence, and arbitration managers never
//! touch `Load.status` themselves. They compute their side effects, then
//! hand the engine a patch closure. A concurrent writer that wins the
//! race surfaces as `STALE_STATE`; the loser re-reads and decides again.
//! No in-memory lock is ever held across a gateway call.

use std::sync::Arc;

use haul_core::{ActorRole, LoadId, OrgId};
use haul_escrow::EscrowOrchestrator;
use haul_state::{check_expected, validate_transition, Load, LoadStatus, Payout};
use haul_store::LoadStore;

use crate::error::LifecycleError;
use crate::notify::{dispatch_all, Audience, Notification, NotificationKind, Notifier};

/// A completed operation: the load as written, plus the notifications the
/// operation intends (already dispatched fire-and-forget).
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The load after the write.
    pub load: Load,
    /// Outbound messages this operation queued.
    pub notifications: Vec<Notification>,
}

/// Central coordinator for load status transitions.
pub struct LifecycleEngine {
    loads: Arc<dyn LoadStore>,
    escrow: Arc<EscrowOrchestrator>,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleEngine {
    pub fn new(
        loads: Arc<dyn LoadStore>,
        escrow: Arc<EscrowOrchestrator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            loads,
            escrow,
            notifier,
        }
    }

    pub(crate) fn loads(&self) -> &Arc<dyn LoadStore> {
        &self.loads
    }

    pub(crate) fn escrow(&self) -> &Arc<EscrowOrchestrator> {
        &self.escrow
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Validate and apply one transition atomically.
    ///
    /// `patch` runs inside the store's compare-and-swap, before the
    /// transition record is appended; it must not perform I/O.
    pub fn request_transition(
        &self,
        load_id: LoadId,
        expected: LoadStatus,
        target: LoadStatus,
        actor: ActorRole,
        reason: Option<String>,
        patch: &mut dyn FnMut(&mut Load),
    ) -> Result<Load, LifecycleError> {
        validate_transition(expected, target)?;
        let load = self.loads.update_load(load_id, expected, &mut |load| {
            patch(load);
            load.apply_transition(target, actor, reason.clone());
        })?;
        tracing::debug!(
            load_id = %load_id,
            from = %expected,
            to = %target,
            actor = %actor,
            "transition applied"
        );
        Ok(load)
    }

    /// Publish a drafted load to the board.
    pub fn post(&self, load_id: LoadId, actor: ActorRole) -> Result<Load, LifecycleError> {
        self.request_transition(
            load_id,
            LoadStatus::Draft,
            LoadStatus::Posted,
            actor,
            None,
            &mut |_| {},
        )
    }

    /// Assign a carrier to a posted load.
    pub fn assign_carrier(
        &self,
        load_id: LoadId,
        carrier: OrgId,
        actor: ActorRole,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let load = self.request_transition(
            load_id,
            LoadStatus::Posted,
            LoadStatus::Assigned,
            actor,
            None,
            &mut |load| {
                load.carrier_org = Some(carrier);
            },
        )?;
        let notifications = vec![Notification::new(
            load_id,
            Audience::Carrier,
            NotificationKind::LoadAssigned,
            "load assigned, awaiting your acceptance",
        )];
        dispatch_all(self.notifier.as_ref(), &notifications);
        Ok(TransitionOutcome {
            load,
            notifications,
        })
    }

    /// Carrier accepts the assignment.
    pub fn accept_assignment(&self, load_id: LoadId) -> Result<Load, LifecycleError> {
        self.request_transition(
            load_id,
            LoadStatus::Assigned,
            LoadStatus::Accepted,
            ActorRole::Carrier,
            None,
            &mut |_| {},
        )
    }

    /// Carrier declines the assignment; the load is relisted.
    pub fn decline_assignment(&self, load_id: LoadId) -> Result<Load, LifecycleError> {
        self.request_transition(
            load_id,
            LoadStatus::Assigned,
            LoadStatus::Posted,
            ActorRole::Carrier,
            Some("assignment declined".to_string()),
            &mut |load| {
                load.clear_assignment();
            },
        )
    }

    /// Move a delivered load into the shipper's approval queue.
    pub fn mark_pending_approval(&self, load_id: LoadId) -> Result<TransitionOutcome, LifecycleError> {
        let load = self.request_transition(
            load_id,
            LoadStatus::Delivered,
            LoadStatus::PendingApproval,
            ActorRole::System,
            None,
            &mut |_| {},
        )?;
        let notifications = vec![Notification::new(
            load_id,
            Audience::Shipper,
            NotificationKind::DeliveryConfirmed,
            "delivery confirmed, awaiting your approval",
        )];
        dispatch_all(self.notifier.as_ref(), &notifications);
        Ok(TransitionOutcome {
            load,
            notifications,
        })
    }

    /// Shipper approves the delivery: capture the escrow hold, complete
    /// the load, and queue the carrier payout.
    ///
    /// Capture runs first. If it fails the load stays `PENDING_APPROVAL`
    /// with the failure recorded on the invoice, and the error propagates
    /// for manual retry — the status is never advanced past a failed
    /// financial step.
    pub fn approve_delivery(
        &self,
        load_id: LoadId,
        quick_pay: bool,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let load = self.loads.get_load(load_id)?;
        // Exact-status gate: `DISPUTED -> COMPLETED` is also a legal arc,
        // and a capture must never run while a dispute is open.
        check_expected(LoadStatus::PendingApproval, load.status)?;

        self.escrow.capture_payment(load_id)?;

        let load = self.request_transition(
            load_id,
            LoadStatus::PendingApproval,
            LoadStatus::Completed,
            ActorRole::Customer,
            Some("delivery approved".to_string()),
            &mut |_| {},
        )?;

        self.escrow.create_payout(load_id, quick_pay)?;
        let mut notifications = vec![Notification::new(
            load_id,
            Audience::Carrier,
            NotificationKind::DeliveryApproved,
            "delivery approved, payout on its way",
        )];
        match self.escrow.process_payout(load_id) {
            Ok(_) => notifications.push(Notification::new(
                load_id,
                Audience::Carrier,
                NotificationKind::PayoutSent,
                "carrier payout submitted to the gateway",
            )),
            Err(err) => {
                let failed = [Notification::new(
                    load_id,
                    Audience::Ops,
                    NotificationKind::PayoutFailed,
                    format!("payout transfer failed: {err}"),
                )];
                dispatch_all(self.notifier.as_ref(), &failed);
                return Err(err.into());
            }
        }
        dispatch_all(self.notifier.as_ref(), &notifications);
        Ok(TransitionOutcome {
            load,
            notifications,
        })
    }

    /// Retry the carrier transfer after a payout failure.
    pub fn retry_payout(&self, load_id: LoadId) -> Result<Payout, LifecycleError> {
        match self.escrow.process_payout(load_id) {
            Ok(payout) => {
                let sent = [Notification::new(
                    load_id,
                    Audience::Carrier,
                    NotificationKind::PayoutSent,
                    "carrier payout submitted to the gateway",
                )];
                dispatch_all(self.notifier.as_ref(), &sent);
                Ok(payout)
            }
            Err(err) => {
                let failed = [Notification::new(
                    load_id,
                    Audience::Ops,
                    NotificationKind::PayoutFailed,
                    format!("payout transfer failed: {err}"),
                )];
                dispatch_all(self.notifier.as_ref(), &failed);
                Err(err.into())
            }
        }
    }
}
