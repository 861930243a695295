//! # The Load Aggregate
//!
//! Typed model of a construction-freight load: commercial terms, origin and
//! destination stops, and the release / TONU / cancellation / dispute field
//! groups that the lifecycle managers stamp as the load moves through its
//! states.
//!
//! Origin and destination are structured [`Stop`] values — street address,
//! coordinates, and a pickup/delivery window — decoded once at the
//! persistence boundary rather than re-parsed from JSON blobs on every
//! read.
//!
//! ## Invariants
//!
//! - Release fields are only stamped while the status is in the release
//!   corridor (`ACCEPTED ..= TONU`); the managers enforce this, the model
//!   records it.
//! - `transition_log` is append-only. Every status change lands here with
//!   the acting role and a reason.

use serde::{Deserialize, Serialize};

use haul_core::{ActorRole, DisputeId, GeoPoint, LoadId, OrgId, Timestamp};

use crate::status::LoadStatus;

// ─── Parties ─────────────────────────────────────────────────────────

/// Which side of the brokered contract a record belongs to.
///
/// Used for cancellation attribution, evidence submitter roles, and
/// dispute winners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Party {
    /// The shipper (paying customer).
    Customer,
    /// The assigned carrier.
    Carrier,
}

impl Party {
    /// The canonical string name of this party.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Carrier => "CARRIER",
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Commercial terms ────────────────────────────────────────────────

/// How the agreed rate is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateMode {
    /// Single all-in price for the haul.
    FlatRate,
    /// Price per loaded mile.
    PerMile,
}

/// The money side of the load. All amounts are integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommercialTerms {
    /// Quoted rate in cents (per-mile or flat per `rate_mode`).
    pub rate_cents: i64,
    /// Total gross revenue for the haul in cents.
    pub gross_revenue_cents: i64,
    /// How `rate_cents` is applied.
    pub rate_mode: RateMode,
    /// Loaded miles between origin and destination.
    pub miles: f64,
}

// ─── Stops ───────────────────────────────────────────────────────────

/// A pickup or delivery time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest scheduled time.
    pub start: Timestamp,
    /// Latest scheduled time.
    pub end: Timestamp,
}

/// A physical stop: street address, geocoded point, and scheduled window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Street address line.
    pub address: String,
    /// City name.
    pub city: String,
    /// Region/state code.
    pub region: String,
    /// Geocoded coordinates of the site gate.
    pub coordinates: GeoPoint,
    /// Scheduled arrival window at this stop.
    pub window: TimeWindow,
}

// ─── Field groups stamped by the managers ────────────────────────────

/// Release-protocol fields (§ release/TONU path).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFields {
    /// Unique release number, format `RL-<year>-<8 hex>`.
    pub release_number: Option<String>,
    /// When the carrier asked for release.
    pub release_requested_at: Option<Timestamp>,
    /// When the shipper issued the release.
    pub released_at: Option<Timestamp>,
    /// When the release lapses without pickup (24h after issue).
    pub release_expires_at: Option<Timestamp>,
    /// Shipper confirmed material is physically ready.
    pub shipper_confirmed_ready: bool,
    /// Shipper acknowledged TONU liability if the truck shows and cannot load.
    pub shipper_acknowledged_tonu: bool,
    /// Shipper confirmed the loaded quantity.
    pub quantity_confirmed: bool,
    /// On-site contact supplied with the release.
    pub site_contact: Option<String>,
    /// Free-form pickup instructions supplied with the release.
    pub pickup_instructions: Option<String>,
    /// Geofence-stamped actual pickup time.
    pub actual_pickup_at: Option<Timestamp>,
    /// Geofence-stamped actual delivery time.
    pub actual_delivery_at: Option<Timestamp>,
}

/// TONU filing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonuFields {
    /// Whether a TONU claim has been filed.
    pub filed: bool,
    /// When the claim was filed.
    pub filed_at: Option<Timestamp>,
    /// Total TONU compensation in cents (before the 85/15 split).
    pub amount_cents: Option<i64>,
    /// Carrier share of the TONU amount in cents.
    pub carrier_cents: Option<i64>,
    /// Platform share of the TONU amount in cents.
    pub platform_cents: Option<i64>,
    /// Carrier-stated reason for the claim.
    pub reason: Option<String>,
}

/// Cancellation bookkeeping.
///
/// Recorded for both terminal customer cancellations and carrier rollbacks
/// to `POSTED` — in the latter case the load lives on, but the fee and
/// attribution are still on the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancellationFields {
    /// Organization that cancelled.
    pub cancelled_by: Option<OrgId>,
    /// Which side cancelled.
    pub cancellation_type: Option<Party>,
    /// Stated reason.
    pub reason: Option<String>,
    /// Fee charged to the cancelling side, in cents.
    pub fee_cents: Option<i64>,
    /// When the cancellation was applied.
    pub cancelled_at: Option<Timestamp>,
}

/// Dispute bookkeeping on the load row. Evidence is stored separately and
/// is append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisputeFields {
    /// Identifier the evidence log is keyed by.
    pub dispute_id: Option<DisputeId>,
    /// When the open dispute was filed.
    pub opened_at: Option<Timestamp>,
    /// Organization that opened the dispute.
    pub opened_by: Option<OrgId>,
    /// Claimed grounds.
    pub reason: Option<String>,
    /// When the dispute was resolved.
    pub resolved_at: Option<Timestamp>,
    /// Admin that resolved the dispute.
    pub resolved_by: Option<OrgId>,
    /// Recorded resolution verdict.
    pub resolution: Option<String>,
    /// Winning party, if the verdict named one.
    pub winner: Option<Party>,
    /// Manual adjustment recorded alongside a `SPLIT` verdict, in cents.
    pub financial_adjustment_cents: Option<i64>,
    /// Deadline for evidence submissions, advisory for both parties.
    pub evidence_deadline: Option<Timestamp>,
    /// Status the load held when the dispute opened, so resolution can
    /// restore the correct terminal state.
    pub pre_dispute_status: Option<LoadStatus>,
}

// ─── Transition log ──────────────────────────────────────────────────

/// Record of a single status transition.
///
/// Every transition is logged with the acting role and timestamp, creating
/// an immutable audit trail for adjudication and support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Status before the transition.
    pub from_status: LoadStatus,
    /// Status after the transition.
    pub to_status: LoadStatus,
    /// Role that requested the transition.
    pub actor: ActorRole,
    /// When the transition was applied (UTC).
    pub timestamp: Timestamp,
    /// Human-readable reason.
    pub reason: Option<String>,
}

// ─── The Load ────────────────────────────────────────────────────────

/// A brokered construction-freight load, the central aggregate.
///
/// Mutated exclusively through the state machine: managers validate the
/// transition, then stamp the relevant field group and append to
/// `transition_log` inside a single compare-and-swap write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Unique load identifier.
    pub id: LoadId,
    /// Current lifecycle status.
    pub status: LoadStatus,
    /// The shipper organization that posted the load.
    pub shipper_org: OrgId,
    /// The assigned carrier organization, if any.
    pub carrier_org: Option<OrgId>,
    /// Money terms.
    pub commercial: CommercialTerms,
    /// Pickup stop.
    pub origin: Stop,
    /// Delivery stop.
    pub destination: Stop,
    /// Gateway reference for the shipper's stored payment method.
    pub payment_method_ref: Option<String>,
    /// Release-protocol fields.
    pub release: ReleaseFields,
    /// TONU filing fields.
    pub tonu: TonuFields,
    /// Cancellation bookkeeping.
    pub cancellation: CancellationFields,
    /// Dispute bookkeeping.
    pub dispute: DisputeFields,
    /// Append-only status transition log.
    pub transition_log: Vec<TransitionRecord>,
    /// When the load was created.
    pub created_at: Timestamp,
    /// When the load was last written.
    pub updated_at: Timestamp,
}

impl Load {
    /// Create a new load in `DRAFT` with empty field groups.
    pub fn new(
        shipper_org: OrgId,
        commercial: CommercialTerms,
        origin: Stop,
        destination: Stop,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: LoadId::new(),
            status: LoadStatus::Draft,
            shipper_org,
            carrier_org: None,
            commercial,
            origin,
            destination,
            payment_method_ref: None,
            release: ReleaseFields::default(),
            tonu: TonuFields::default(),
            cancellation: CancellationFields::default(),
            dispute: DisputeFields::default(),
            transition_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a transition record and flip the status. Callers must have
    /// validated legality first; this is the recording half.
    pub fn apply_transition(&mut self, to: LoadStatus, actor: ActorRole, reason: Option<String>) {
        let now = Timestamp::now();
        self.transition_log.push(TransitionRecord {
            from_status: self.status,
            to_status: to,
            actor,
            timestamp: now,
            reason,
        });
        self.status = to;
        self.updated_at = now;
    }

    /// Whether the issued release has lapsed as of `now`.
    pub fn release_expired(&self, now: Timestamp) -> bool {
        self.status == LoadStatus::Released
            && self
                .release
                .release_expires_at
                .is_some_and(|expires| now > expires)
    }

    /// Hours from `now` until the scheduled pickup window opens.
    pub fn hours_until_pickup(&self, now: Timestamp) -> f64 {
        now.hours_until(self.origin.window.start)
    }

    /// Clear carrier assignment and release fields for relisting after a
    /// carrier-initiated cancellation.
    pub fn clear_assignment(&mut self) {
        self.carrier_org = None;
        self.release = ReleaseFields::default();
    }
}
