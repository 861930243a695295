//! # Dispute Resolver
//!
//! Adjudication workflow for contested loads: open → evidence collection
//! → resolution. `DISPUTED` parks the load while both parties submit
//! evidence; resolution applies the financial remedy through the escrow
//! orchestrator and lands the load back on `COMPLETED` or `TONU`.
//!
//! ## Transition Graph
//!
//! ```text
//! DELIVERED ─────────┐
//! PENDING_APPROVAL ──┤
//! COMPLETED ─────────┼──▶ DISPUTED ──▶ COMPLETED | TONU
//! TONU ──────────────┘
//! ```
//!
//! ## Invariants
//!
//! - One dispute at a time: opening on a `DISPUTED` load fails with
//!   `DISPUTE_ALREADY_OPEN`.
//! - Evidence is append-only and only accepted while the dispute is
//!   open (`NO_ACTIVE_DISPUTE` otherwise). The 48-hour window is an
//!   advisory deadline returned to the caller, not a timer in here.
//! - Financial remedies run before the status write. A gateway failure
//!   leaves the load `DISPUTED` with the failure recorded on the
//!   settlement row, so resolution can be retried.
//! - Resolution restores `TONU` when the dispute was opened on a TONU
//!   load, or when the carrier prevails over a load that was never
//!   delivered; every other verdict lands on `COMPLETED`.

use std::sync::Arc;

use haul_core::{ActorRole, DisputeId, LoadId, OrgId, Timestamp};
use haul_escrow::EscrowOrchestrator;
use haul_state::{
    validate_transition, DisputeEvidence, DisputeResolution, EvidenceType, InvoiceStatus, Load,
    LoadStatus, Party,
};
use haul_lifecycle::{Audience, Notification, NotificationKind, Notifier};
use haul_store::{EvidenceStore, LoadStore, SettlementStore};

use crate::error::ArbitrationError;
use crate::recommend::{recommend, Recommendation};

/// Advisory evidence-collection window after a dispute opens.
pub const EVIDENCE_WINDOW_HOURS: i64 = 48;

/// Grounds for opening a dispute.
#[derive(Debug, Clone)]
pub struct DisputeRequest {
    /// Claimed grounds, recorded on the load.
    pub reason: String,
    /// Free-form elaboration.
    pub description: Option<String>,
}

/// One evidence submission from either party.
#[derive(Debug, Clone)]
pub struct EvidenceSubmission {
    /// Kind of evidence.
    pub evidence_type: EvidenceType,
    /// Storage URLs of the submitted artifacts.
    pub file_urls: Vec<String>,
    /// Submitter's description.
    pub description: Option<String>,
}

/// Result of opening a dispute.
#[derive(Debug)]
pub struct DisputeOutcome {
    /// The load, now `DISPUTED`.
    pub load: Load,
    /// Identifier the evidence log is keyed by.
    pub dispute_id: DisputeId,
    /// Advisory deadline for evidence submissions.
    pub evidence_deadline: Timestamp,
    /// Messages dispatched for this dispute.
    pub notifications: Vec<Notification>,
}

/// Result of resolving a dispute.
#[derive(Debug)]
pub struct ResolutionOutcome {
    /// The load, back on `COMPLETED` or `TONU`.
    pub load: Load,
    /// The verdict that was applied.
    pub resolution: DisputeResolution,
    /// Messages dispatched for the resolution.
    pub notifications: Vec<Notification>,
}

/// Adjudicates disputes between shipper and carrier.
pub struct DisputeResolver {
    loads: Arc<dyn LoadStore>,
    settlements: Arc<dyn SettlementStore>,
    evidence: Arc<dyn EvidenceStore>,
    escrow: Arc<EscrowOrchestrator>,
    notifier: Arc<dyn Notifier>,
}

impl DisputeResolver {
    pub fn new(
        loads: Arc<dyn LoadStore>,
        settlements: Arc<dyn SettlementStore>,
        evidence: Arc<dyn EvidenceStore>,
        escrow: Arc<EscrowOrchestrator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            loads,
            settlements,
            evidence,
            escrow,
            notifier,
        }
    }

    /// Open a dispute on a delivered, completed, or TONU load.
    ///
    /// Parks the load on `DISPUTED`, remembering the status it held so
    /// resolution can land on the correct terminal state, and returns
    /// the advisory 48-hour evidence deadline.
    pub fn open_dispute(
        &self,
        load_id: LoadId,
        opened_by: OrgId,
        role: Party,
        request: DisputeRequest,
    ) -> Result<DisputeOutcome, ArbitrationError> {
        let load = self.loads.get_load(load_id)?;
        if load.status == LoadStatus::Disputed {
            return Err(ArbitrationError::DisputeAlreadyOpen(load_id));
        }
        validate_transition(load.status, LoadStatus::Disputed)?;

        let dispute_id = DisputeId::new();
        let now = Timestamp::now();
        let evidence_deadline = now.plus_hours(EVIDENCE_WINDOW_HOURS);
        let actor = actor_for(role);
        let reason = request.reason.clone();

        let updated = self.loads.update_load(load_id, load.status, &mut |row| {
            row.dispute.dispute_id = Some(dispute_id);
            row.dispute.opened_at = Some(now);
            row.dispute.opened_by = Some(opened_by);
            row.dispute.reason = Some(reason.clone());
            row.dispute.pre_dispute_status = Some(row.status);
            row.dispute.evidence_deadline = Some(evidence_deadline);
            row.apply_transition(LoadStatus::Disputed, actor, Some(reason.clone()));
        })?;

        tracing::info!(
            load_id = %load_id,
            dispute_id = %dispute_id,
            opened_by = %opened_by,
            "dispute opened"
        );
        let notifications = vec![
            Notification::new(
                load_id,
                opposing_audience(role),
                NotificationKind::DisputeOpened,
                format!("a dispute was opened on load {load_id}: {}", request.reason),
            ),
            Notification::new(
                load_id,
                Audience::Ops,
                NotificationKind::DisputeOpened,
                format!("dispute {dispute_id} opened on load {load_id}"),
            ),
        ];
        self.dispatch(&notifications);
        Ok(DisputeOutcome {
            load: updated,
            dispute_id,
            evidence_deadline,
            notifications,
        })
    }

    /// Append one evidence record to the open dispute.
    ///
    /// Evidence is never overwritten or removed. Submissions after the
    /// advisory deadline are accepted with a logged warning; only a
    /// closed dispute rejects them.
    pub fn submit_evidence(
        &self,
        load_id: LoadId,
        submitted_by: OrgId,
        role: Party,
        submission: EvidenceSubmission,
    ) -> Result<DisputeEvidence, ArbitrationError> {
        let load = self.loads.get_load(load_id)?;
        if load.status != LoadStatus::Disputed {
            return Err(ArbitrationError::NoActiveDispute(load_id));
        }
        let dispute_id = load
            .dispute
            .dispute_id
            .ok_or(ArbitrationError::NoActiveDispute(load_id))?;

        if let Some(deadline) = load.dispute.evidence_deadline {
            if Timestamp::now() > deadline {
                tracing::warn!(
                    load_id = %load_id,
                    dispute_id = %dispute_id,
                    "evidence submitted after the advisory deadline"
                );
            }
        }

        let record = DisputeEvidence::new(
            dispute_id,
            load_id,
            submitted_by,
            role,
            submission.evidence_type,
            submission.file_urls,
            submission.description,
        );
        self.evidence.append_evidence(record.clone())?;
        let notifications = [Notification::new(
            load_id,
            opposing_audience(role),
            NotificationKind::EvidenceSubmitted,
            format!("new evidence submitted to dispute {dispute_id}"),
        )];
        self.dispatch(&notifications);
        Ok(record)
    }

    /// Resolve the open dispute with an admin verdict.
    ///
    /// `resolution` must be one of `CUSTOMER_WINS`, `CARRIER_WINS`,
    /// `SPLIT`, or `NO_FAULT`; anything else is rejected with
    /// `INVALID_RESOLUTION`. The financial remedy runs first, then the
    /// load lands on its final status:
    ///
    /// - `CUSTOMER_WINS`: a captured charge is refunded in full; a hold
    ///   still outstanding is released instead.
    /// - `CARRIER_WINS`: an outstanding hold is captured, then the
    ///   carrier payout is created and processed.
    /// - `SPLIT`: `financial_adjustment` is recorded on the load for
    ///   manual partial settlement.
    /// - `NO_FAULT`: the original settlement stands untouched.
    pub fn resolve_dispute(
        &self,
        load_id: LoadId,
        admin: OrgId,
        resolution: &str,
        financial_adjustment: Option<i64>,
    ) -> Result<ResolutionOutcome, ArbitrationError> {
        let verdict = resolution.parse::<DisputeResolution>()?;
        let load = self.loads.get_load(load_id)?;
        if load.status != LoadStatus::Disputed {
            return Err(ArbitrationError::NoActiveDispute(load_id));
        }

        self.apply_remedy(&load, verdict)?;

        let pre_dispute = load
            .dispute
            .pre_dispute_status
            .unwrap_or(LoadStatus::Completed);
        let never_delivered = load.release.actual_delivery_at.is_none();
        let final_status = if pre_dispute == LoadStatus::Tonu
            || (verdict == DisputeResolution::CarrierWins && never_delivered)
        {
            LoadStatus::Tonu
        } else {
            LoadStatus::Completed
        };

        let now = Timestamp::now();
        let updated = self
            .loads
            .update_load(load_id, LoadStatus::Disputed, &mut |row| {
                row.dispute.resolved_at = Some(now);
                row.dispute.resolved_by = Some(admin);
                row.dispute.resolution = Some(verdict.as_str().to_string());
                row.dispute.winner = verdict.winner();
                if verdict == DisputeResolution::Split {
                    row.dispute.financial_adjustment_cents = financial_adjustment;
                }
                row.apply_transition(
                    final_status,
                    ActorRole::Admin,
                    Some(format!("dispute resolved: {verdict}")),
                );
            })?;

        tracing::info!(
            load_id = %load_id,
            resolution = %verdict,
            final_status = %final_status,
            "dispute resolved"
        );
        let notifications = vec![
            Notification::new(
                load_id,
                Audience::Shipper,
                NotificationKind::DisputeResolved,
                format!("dispute on load {load_id} resolved: {verdict}"),
            ),
            Notification::new(
                load_id,
                Audience::Carrier,
                NotificationKind::DisputeResolved,
                format!("dispute on load {load_id} resolved: {verdict}"),
            ),
        ];
        self.dispatch(&notifications);
        Ok(ResolutionOutcome {
            load: updated,
            resolution: verdict,
            notifications,
        })
    }

    /// Advisory, non-binding recommendation ranked by evidence
    /// reliability. See [`crate::recommend`] for the ranking rules.
    pub fn calculate_recommendation(
        &self,
        load_id: LoadId,
    ) -> Result<Recommendation, ArbitrationError> {
        let load = self.loads.get_load(load_id)?;
        let dispute_id = load
            .dispute
            .dispute_id
            .ok_or(ArbitrationError::NoActiveDispute(load_id))?;
        let evidence = self.evidence.evidence_for_dispute(dispute_id);
        Ok(recommend(&load, &evidence))
    }

    /// Run the money movement for a verdict. Gateway failures propagate
    /// with the failure already recorded on the settlement row; the load
    /// stays `DISPUTED` for a retried resolution.
    fn apply_remedy(
        &self,
        load: &Load,
        verdict: DisputeResolution,
    ) -> Result<(), ArbitrationError> {
        let invoice_status = self
            .settlements
            .invoice_for_load(load.id)
            .map(|invoice| invoice.status);
        match verdict {
            DisputeResolution::CustomerWins => match invoice_status {
                Some(InvoiceStatus::Paid) => {
                    self.escrow.refund_payment(load.id, None)?;
                }
                Some(InvoiceStatus::Authorized) => {
                    self.escrow.cancel_payment(load.id)?;
                }
                _ => {}
            },
            DisputeResolution::CarrierWins => {
                if invoice_status == Some(InvoiceStatus::Authorized) {
                    self.escrow.capture_payment(load.id)?;
                }
                self.escrow.create_payout(load.id, false)?;
                self.escrow.process_payout(load.id)?;
            }
            DisputeResolution::Split => {
                // Partial settlement is a manual follow-up by ops.
                tracing::info!(load_id = %load.id, "split verdict recorded for manual settlement");
            }
            DisputeResolution::NoFault => {}
        }
        Ok(())
    }

    fn dispatch(&self, notifications: &[Notification]) {
        for notification in notifications {
            self.notifier.dispatch(notification);
        }
    }
}

fn actor_for(role: Party) -> ActorRole {
    match role {
        Party::Customer => ActorRole::Customer,
        Party::Carrier => ActorRole::Carrier,
    }
}

fn opposing_audience(role: Party) -> Audience {
    match role {
        Party::Customer => Audience::Carrier,
        Party::Carrier => Audience::Shipper,
    }
}
