//! # Escrow Payment Orchestrator
//!
//! Two-phase commit against the payment gateway, kept consistent with the
//! load lifecycle:
//!
//! - **authorize** at release time: the shipper's funds are held, not
//!   charged, the moment material is confirmed ready;
//! - **capture** at delivery approval: the hold becomes a charge;
//! - **cancel** on cancellation: the hold is released;
//! - **refund** on dispute loss: a captured charge is reversed.
//!
//! ## Design Choice: Idempotent Money Movement
//!
//! Gateway calls can be retried after network failures, so every step
//! checks the persisted invoice/payout row first: a second authorize on
//! an `AUTHORIZED` invoice returns it unchanged, a second capture on
//! `PAID` likewise, and payout creation returns the existing row rather
//! than minting a second transfer. No step double-moves funds.
//!
//! A failed authorization marks the invoice `FAILED` (no hold exists).
//! A failed capture or cancel leaves the invoice `AUTHORIZED` with the
//! gateway message in `failure_reason`: the hold still exists at the
//! gateway and the step can be retried. The load's lifecycle status is
//! never advanced past a failed financial step by this module.

use std::sync::Arc;

use haul_core::{LoadId, Timestamp};
use haul_policy::TonuSplit;
use haul_state::{
    Invoice, InvoiceStatus, Load, LoadStatus, Payout, PayoutStatus,
};
use haul_store::{LoadStore, SettlementStore};

use crate::config::EscrowConfig;
use crate::error::EscrowError;
use crate::gateway::{GatewayMetadata, PaymentGateway};

/// Orchestrates invoice and payout rows against the payment gateway.
pub struct EscrowOrchestrator {
    loads: Arc<dyn LoadStore>,
    settlements: Arc<dyn SettlementStore>,
    gateway: Arc<dyn PaymentGateway>,
    config: EscrowConfig,
}

impl EscrowOrchestrator {
    pub fn new(
        loads: Arc<dyn LoadStore>,
        settlements: Arc<dyn SettlementStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: EscrowConfig,
    ) -> Self {
        Self {
            loads,
            settlements,
            gateway,
            config,
        }
    }

    /// Place a hold for the load's gross revenue.
    ///
    /// Legal only while the load is `RELEASED` and the shipper has a
    /// stored payment method. Idempotent: an existing `AUTHORIZED` (or
    /// already `PAID`) invoice is returned unchanged with no gateway call.
    pub fn authorize_payment(&self, load_id: LoadId) -> Result<Invoice, EscrowError> {
        let load = self.loads.get_load(load_id)?;
        if load.status != LoadStatus::Released {
            return Err(EscrowError::NotEligible {
                load_id,
                detail: format!("authorize requires RELEASED, load is {}", load.status),
            });
        }
        let amount = load.commercial.gross_revenue_cents;
        self.authorize_row(&load, amount)
    }

    /// Convert the hold into a charge. Legal only from `AUTHORIZED`;
    /// idempotent on `PAID`.
    pub fn capture_payment(&self, load_id: LoadId) -> Result<Invoice, EscrowError> {
        let invoice = self
            .settlements
            .invoice_for_load(load_id)
            .ok_or(EscrowError::InvoiceMissing(load_id))?;
        match invoice.status {
            InvoiceStatus::Paid => return Ok(invoice),
            InvoiceStatus::Authorized => {}
            actual => return Err(EscrowError::InvoiceNotReady { load_id, actual }),
        }
        let intent = match invoice.payment_intent_ref.clone() {
            Some(intent) => intent,
            None => {
                return Err(EscrowError::CaptureFailed(
                    "authorized invoice has no payment intent reference".to_string(),
                ))
            }
        };

        match self.gateway.capture(&intent) {
            Ok(_) => Ok(self.settlements.update_invoice(invoice.id, &mut |inv| {
                inv.status = InvoiceStatus::Paid;
                inv.paid_at = Some(Timestamp::now());
                inv.failure_reason = None;
            })?),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "capture failed");
                // The hold still exists at the gateway: the invoice stays
                // AUTHORIZED so the capture can be retried.
                self.settlements.update_invoice(invoice.id, &mut |inv| {
                    inv.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::CaptureFailed(err.to_string()))
            }
        }
    }

    /// Release the hold without charging.
    ///
    /// A no-op returning `None` when no invoice exists or the invoice is
    /// not currently `AUTHORIZED` — safe to call from every cancellation
    /// path.
    pub fn cancel_payment(&self, load_id: LoadId) -> Result<Option<Invoice>, EscrowError> {
        let Some(invoice) = self.settlements.invoice_for_load(load_id) else {
            return Ok(None);
        };
        if invoice.status != InvoiceStatus::Authorized {
            return Ok(None);
        }
        let Some(intent) = invoice.payment_intent_ref.clone() else {
            return Ok(None);
        };

        match self.gateway.cancel(&intent) {
            Ok(()) => Ok(Some(self.settlements.update_invoice(
                invoice.id,
                &mut |inv| {
                    inv.status = InvoiceStatus::Cancelled;
                    inv.failure_reason = None;
                },
            )?)),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "hold cancellation failed");
                // The hold stays AUTHORIZED so a later cancel (or capture)
                // can still find it.
                self.settlements.update_invoice(invoice.id, &mut |inv| {
                    inv.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::CancellationFailed(err.to_string()))
            }
        }
    }

    /// Reverse a captured charge, in part or in full. Used exclusively by
    /// dispute resolution when the customer prevails after capture.
    pub fn refund_payment(
        &self,
        load_id: LoadId,
        amount_cents: Option<i64>,
    ) -> Result<Invoice, EscrowError> {
        let invoice = self
            .settlements
            .invoice_for_load(load_id)
            .ok_or(EscrowError::InvoiceMissing(load_id))?;
        if invoice.status != InvoiceStatus::Paid {
            return Err(EscrowError::InvoiceNotReady {
                load_id,
                actual: invoice.status,
            });
        }
        let intent = match invoice.payment_intent_ref.clone() {
            Some(intent) => intent,
            None => {
                return Err(EscrowError::RefundFailed(
                    "paid invoice has no payment intent reference".to_string(),
                ))
            }
        };
        let refunded = amount_cents.unwrap_or(invoice.amount_cents);

        match self.gateway.refund(&intent, amount_cents) {
            Ok(_) => Ok(self.settlements.update_invoice(invoice.id, &mut |inv| {
                inv.refunded_cents = Some(refunded);
                inv.refunded_at = Some(Timestamp::now());
                inv.failure_reason = None;
            })?),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "refund failed");
                // The charge stands; only the failure is recorded.
                self.settlements.update_invoice(invoice.id, &mut |inv| {
                    inv.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::RefundFailed(err.to_string()))
            }
        }
    }

    /// Create the carrier payout row for a completed load: gross revenue
    /// minus the platform fee, minus the QuickPay fee when elected.
    ///
    /// Double-pay guard: if a payout row already exists for the load, it
    /// is returned unchanged.
    pub fn create_payout(&self, load_id: LoadId, quick_pay: bool) -> Result<Payout, EscrowError> {
        if let Some(existing) = self.settlements.payout_for_load(load_id) {
            return Ok(existing);
        }
        let load = self.loads.get_load(load_id)?;
        let carrier = load
            .carrier_org
            .ok_or(EscrowError::NoCarrierAssigned(load_id))?;
        let gross = load.commercial.gross_revenue_cents;
        let platform_fee = gross * self.config.platform_fee_pct / 100;
        let quick_fee = if quick_pay {
            gross * self.config.quick_pay_fee_pct / 100
        } else {
            0
        };
        let payout = Payout::queued(
            load_id,
            carrier,
            gross - platform_fee - quick_fee,
            platform_fee,
            quick_fee,
            quick_pay,
            Timestamp::now().plus_hours(self.config.payout_delay_hours(quick_pay)),
        );
        self.settlements.create_payout(payout.clone())?;
        Ok(payout)
    }

    /// Submit the load's payout transfer to the gateway.
    ///
    /// Idempotent on `SENT` and in-flight `PROCESSING`; a `FAILED` payout
    /// is retried. Transfer failure marks the row `FAILED` with the
    /// recorded reason and propagates.
    pub fn process_payout(&self, load_id: LoadId) -> Result<Payout, EscrowError> {
        let payout = self
            .settlements
            .payout_for_load(load_id)
            .ok_or(EscrowError::NotEligible {
                load_id,
                detail: "no payout row exists".to_string(),
            })?;
        match payout.status {
            PayoutStatus::Sent | PayoutStatus::Processing => return Ok(payout),
            PayoutStatus::Queued | PayoutStatus::Failed => {}
        }
        self.settlements.update_payout(payout.id, &mut |row| {
            row.status = PayoutStatus::Processing;
        })?;

        let metadata = GatewayMetadata {
            load_id,
            description: format!("carrier payout for {load_id}"),
        };
        match self
            .gateway
            .transfer(&payout.carrier_org.to_string(), payout.amount_cents, &metadata)
        {
            Ok(reference) => Ok(self.settlements.update_payout(payout.id, &mut |row| {
                row.status = PayoutStatus::Sent;
                row.transfer_ref = Some(reference.reference.clone());
                row.sent_at = Some(Timestamp::now());
                row.failure_reason = None;
            })?),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "payout transfer failed");
                self.settlements.update_payout(payout.id, &mut |row| {
                    row.status = PayoutStatus::Failed;
                    row.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::TransferFailed(err.to_string()))
            }
        }
    }

    /// Settle a TONU claim: release the gross hold, charge the shipper the
    /// TONU amount, and pay the carrier its 85% share immediately.
    ///
    /// The load's single invoice row is re-armed at the TONU amount rather
    /// than replaced, keeping one invoice per load.
    pub fn settle_tonu(
        &self,
        load_id: LoadId,
        split: TonuSplit,
    ) -> Result<(Invoice, Payout), EscrowError> {
        let load = self.loads.get_load(load_id)?;
        let carrier = load
            .carrier_org
            .ok_or(EscrowError::NoCarrierAssigned(load_id))?;

        // Release the gross hold, if one was placed. No-op otherwise.
        if let Some(invoice) = self.settlements.invoice_for_load(load_id) {
            // An already-captured charge must be refunded through dispute
            // resolution, never silently replaced by a TONU charge.
            if invoice.status == InvoiceStatus::Paid {
                return Err(EscrowError::InvoiceNotReady {
                    load_id,
                    actual: invoice.status,
                });
            }
            if invoice.status == InvoiceStatus::Authorized {
                if let Some(intent) = invoice.payment_intent_ref.clone() {
                    if let Err(err) = self.gateway.cancel(&intent) {
                        tracing::warn!(load_id = %load_id, error = %err, "hold cancellation failed");
                        self.settlements.update_invoice(invoice.id, &mut |inv| {
                            inv.failure_reason = Some(err.to_string());
                        })?;
                        return Err(EscrowError::CancellationFailed(err.to_string()));
                    }
                }
            }
            self.settlements.update_invoice(invoice.id, &mut |inv| {
                inv.status = InvoiceStatus::Drafted;
                inv.amount_cents = split.total_cents;
                inv.payment_intent_ref = None;
                inv.authorized_at = None;
                inv.failure_reason = None;
            })?;
        }

        let invoice = self.authorize_row(&load, split.total_cents)?;
        let invoice = self.capture_row(load_id, invoice)?;

        if self.settlements.payout_for_load(load_id).is_none() {
            self.settlements.create_payout(Payout::queued(
                load_id,
                carrier,
                split.carrier_cents,
                split.platform_cents,
                0,
                false,
                Timestamp::now(),
            ))?;
        }
        let payout = self.process_payout(load_id)?;
        Ok((invoice, payout))
    }

    /// Place (or re-place) the hold for `amount` on the load's invoice
    /// row, creating the row if needed. No lifecycle-status gate — the
    /// public entry points gate before calling.
    fn authorize_row(&self, load: &Load, amount: i64) -> Result<Invoice, EscrowError> {
        let load_id = load.id;
        let method = load
            .payment_method_ref
            .clone()
            .ok_or(EscrowError::NoPaymentMethod(load_id))?;

        let invoice = match self.settlements.invoice_for_load(load_id) {
            Some(existing) => match existing.status {
                InvoiceStatus::Authorized | InvoiceStatus::Paid => return Ok(existing),
                // A cancelled hold re-arms on the same row when the load
                // is re-released.
                InvoiceStatus::Drafted | InvoiceStatus::Failed | InvoiceStatus::Cancelled => {
                    existing
                }
            },
            None => {
                let invoice = Invoice::drafted(load_id, load.shipper_org, amount);
                self.settlements.create_invoice(invoice.clone())?;
                invoice
            }
        };

        let metadata = GatewayMetadata {
            load_id,
            description: format!("escrow hold for {load_id}"),
        };
        match self
            .gateway
            .authorize(&load.shipper_org.to_string(), &method, amount, &metadata)
        {
            Ok(reference) => Ok(self.settlements.update_invoice(invoice.id, &mut |inv| {
                inv.status = InvoiceStatus::Authorized;
                inv.amount_cents = amount;
                inv.payment_intent_ref = Some(reference.reference.clone());
                inv.authorized_at = Some(Timestamp::now());
                inv.failure_reason = None;
            })?),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "authorization failed");
                self.settlements.update_invoice(invoice.id, &mut |inv| {
                    inv.status = InvoiceStatus::Failed;
                    inv.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::AuthorizationFailed(err.to_string()))
            }
        }
    }

    /// Capture a freshly authorized invoice without re-fetching by load.
    fn capture_row(&self, load_id: LoadId, invoice: Invoice) -> Result<Invoice, EscrowError> {
        let intent = match invoice.payment_intent_ref.clone() {
            Some(intent) => intent,
            None => {
                return Err(EscrowError::CaptureFailed(
                    "authorized invoice has no payment intent reference".to_string(),
                ))
            }
        };
        match self.gateway.capture(&intent) {
            Ok(_) => Ok(self.settlements.update_invoice(invoice.id, &mut |inv| {
                inv.status = InvoiceStatus::Paid;
                inv.paid_at = Some(Timestamp::now());
                inv.failure_reason = None;
            })?),
            Err(err) => {
                tracing::warn!(load_id = %load_id, error = %err, "capture failed");
                self.settlements.update_invoice(invoice.id, &mut |inv| {
                    inv.failure_reason = Some(err.to_string());
                })?;
                Err(EscrowError::CaptureFailed(err.to_string()))
            }
        }
    }
}
