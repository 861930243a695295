//! # Satellite Records
//!
//! Append-only records that hang off a load but are stored in their own
//! collections: dispute evidence, geofence telemetry, anti-double-broker
//! attestations, and flagged suspicious activity.
//!
//! ## Design Choice: Append-Only
//!
//! None of these records are ever updated in place. Evidence cannot be
//! retracted once submitted; geo events are a raw telemetry trail;
//! attestations exist or do not. This keeps the adjudication record
//! trustworthy without row-level locking.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use haul_core::{
    AttestationId, DisputeId, DriverId, EvidenceId, GeoEventId, GeoPoint, LoadId, OrgId, Timestamp,
};

use crate::load::Party;
use crate::status::StateError;

// ─── Dispute evidence ────────────────────────────────────────────────

/// Kind of evidence attached to a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    /// GPS trail exported from the telemetry log.
    GpsTrail,
    /// Photo of the site, material, or ticket.
    Photo,
    /// Scanned document (BOL, scale ticket, invoice).
    Document,
}

/// One piece of evidence submitted to an open dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeEvidence {
    /// Unique evidence identifier.
    pub id: EvidenceId,
    /// Dispute this evidence belongs to.
    pub dispute_id: DisputeId,
    /// Load under dispute.
    pub load_id: LoadId,
    /// Organization that submitted.
    pub submitted_by: OrgId,
    /// Which side of the contract the submitter is on.
    pub submitter_role: Party,
    /// Kind of evidence.
    pub evidence_type: EvidenceType,
    /// Storage URLs of the submitted artifacts.
    pub file_urls: Vec<String>,
    /// Submitter's description.
    pub description: Option<String>,
    /// When the evidence was submitted.
    pub submitted_at: Timestamp,
}

impl DisputeEvidence {
    /// Create a new evidence record stamped now.
    pub fn new(
        dispute_id: DisputeId,
        load_id: LoadId,
        submitted_by: OrgId,
        submitter_role: Party,
        evidence_type: EvidenceType,
        file_urls: Vec<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: EvidenceId::new(),
            dispute_id,
            load_id,
            submitted_by,
            submitter_role,
            evidence_type,
            file_urls,
            description,
            submitted_at: Timestamp::now(),
        }
    }
}

// ─── Geofence telemetry ──────────────────────────────────────────────

/// Where in the trip a position ping was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStage {
    /// Driver reports arrival at the pickup site.
    AtPickup,
    /// Driver is between stops.
    EnRoute,
    /// Driver reports arrival at the delivery site.
    AtDelivery,
}

impl TripStage {
    /// The canonical string name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtPickup => "AT_PICKUP",
            Self::EnRoute => "EN_ROUTE",
            Self::AtDelivery => "AT_DELIVERY",
        }
    }
}

/// A raw driver position ping, persisted whether or not it triggered a
/// transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEvent {
    /// Unique event identifier.
    pub id: GeoEventId,
    /// Load the ping belongs to.
    pub load_id: LoadId,
    /// Reporting driver.
    pub driver_id: DriverId,
    /// Reported position.
    pub position: GeoPoint,
    /// Stage the driver reported for.
    pub stage: TripStage,
    /// Where the sample came from (driver app, ELD feed).
    pub source: String,
    /// Distance from the relevant stop, in meters.
    pub distance_meters: f64,
    /// Whether the ping fell inside the geofence radius.
    pub within_fence: bool,
    /// Whether the ping triggered a status transition.
    pub triggered_transition: bool,
    /// When the ping was received.
    pub recorded_at: Timestamp,
}

// ─── Double-broker guard ─────────────────────────────────────────────

/// Kind of attestation a carrier signs at dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationType {
    /// Carrier attests it will not re-broker the load.
    NonSubcontracting,
}

impl AttestationType {
    /// The canonical string name of this attestation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonSubcontracting => "NON_SUBCONTRACTING",
        }
    }
}

/// A signed carrier attestation. At most one exists per load and type;
/// stores enforce the uniqueness, returning the existing record on a
/// repeated signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// Unique attestation identifier.
    pub id: AttestationId,
    /// Load the attestation covers.
    pub load_id: LoadId,
    /// Attesting carrier organization.
    pub carrier_org: OrgId,
    /// Kind of attestation.
    pub attestation_type: AttestationType,
    /// IP address recorded at signing time.
    pub ip_address: Option<String>,
    /// When the attestation was signed.
    pub signed_at: Timestamp,
}

/// A flagged signal from the double-broker guard, surfaced for manual
/// review rather than auto-enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousActivity {
    /// Load the signal relates to.
    pub load_id: LoadId,
    /// Carrier the signal points at.
    pub carrier_org: OrgId,
    /// Machine-readable signal code (e.g. `VIN_NOT_OWNED_BY_CARRIER`,
    /// `PICKUP_FAR_FROM_SITE`).
    pub code: String,
    /// Human-readable detail.
    pub detail: String,
    /// When the signal was flagged.
    pub flagged_at: Timestamp,
}

// ─── Dispute resolution ──────────────────────────────────────────────

/// Admin verdict on a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeResolution {
    /// Full refund to the customer.
    CustomerWins,
    /// Full payout to the carrier.
    CarrierWins,
    /// Negotiated split adjustment.
    Split,
    /// Dispute dismissed, original settlement stands.
    NoFault,
}

impl DisputeResolution {
    /// The canonical string name of this verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerWins => "CUSTOMER_WINS",
            Self::CarrierWins => "CARRIER_WINS",
            Self::Split => "SPLIT",
            Self::NoFault => "NO_FAULT",
        }
    }

    /// Winning party named by this verdict, if any.
    pub fn winner(&self) -> Option<Party> {
        match self {
            Self::CustomerWins => Some(Party::Customer),
            Self::CarrierWins => Some(Party::Carrier),
            Self::Split | Self::NoFault => None,
        }
    }
}

impl std::fmt::Display for DisputeResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisputeResolution {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER_WINS" => Ok(Self::CustomerWins),
            "CARRIER_WINS" => Ok(Self::CarrierWins),
            "SPLIT" => Ok(Self::Split),
            "NO_FAULT" => Ok(Self::NoFault),
            other => Err(StateError::InvalidResolution {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_constructor_stamps_id_and_time() {
        let dispute_id = DisputeId::new();
        let load_id = LoadId::new();
        let carrier = OrgId::new();
        let a = DisputeEvidence::new(
            dispute_id,
            load_id,
            carrier,
            Party::Carrier,
            EvidenceType::GpsTrail,
            vec!["s3://evidence/trail.json".to_string()],
            None,
        );
        let b = DisputeEvidence::new(
            dispute_id,
            load_id,
            carrier,
            Party::Carrier,
            EvidenceType::GpsTrail,
            vec!["s3://evidence/trail.json".to_string()],
            None,
        );
        assert_ne!(a.id, b.id);
        assert_eq!(a.dispute_id, dispute_id);
    }

    #[test]
    fn trip_stage_serde_names() {
        assert_eq!(serde_json::to_string(&TripStage::AtPickup).unwrap(), "\"AT_PICKUP\"");
        assert_eq!(serde_json::to_string(&TripStage::EnRoute).unwrap(), "\"EN_ROUTE\"");
        assert_eq!(
            serde_json::to_string(&TripStage::AtDelivery).unwrap(),
            "\"AT_DELIVERY\""
        );
    }

    #[test]
    fn resolution_parse_roundtrip() {
        for verdict in [
            DisputeResolution::CustomerWins,
            DisputeResolution::CarrierWins,
            DisputeResolution::Split,
            DisputeResolution::NoFault,
        ] {
            let parsed: DisputeResolution = verdict.as_str().parse().unwrap();
            assert_eq!(parsed, verdict);
        }
    }

    #[test]
    fn resolution_parse_rejects_unknown() {
        let err = "BOTH_WIN".parse::<DisputeResolution>().unwrap_err();
        assert!(matches!(err, StateError::InvalidResolution { .. }));
    }

    #[test]
    fn resolution_winner_mapping() {
        assert_eq!(DisputeResolution::CustomerWins.winner(), Some(Party::Customer));
        assert_eq!(DisputeResolution::CarrierWins.winner(), Some(Party::Carrier));
        assert_eq!(DisputeResolution::Split.winner(), None);
        assert_eq!(DisputeResolution::NoFault.winner(), None);
    }
}
