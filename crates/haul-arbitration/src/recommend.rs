//! # Recommendation Heuristic
//!
//! Advisory ranking of dispute evidence by reliability. The output is a
//! suggestion for the adjudicating admin, never a binding verdict.
//!
//! ## Ranking
//!
//! 1. A GPS trail is the most reliable artifact: one side submitting GPS
//!    evidence drives a HIGH-confidence recommendation toward that side.
//!    GPS trails from both sides cancel out to a LOW-confidence split.
//! 2. Without GPS, four or more photos lean MEDIUM toward whichever side
//!    submitted the majority of them.
//! 3. A TONU filing the customer never rebutted with evidence of their
//!    own leans MEDIUM toward the carrier.
//! 4. Anything else is a LOW-confidence split.

use serde::{Deserialize, Serialize};

use haul_state::{DisputeEvidence, DisputeResolution, EvidenceType, Load, Party};

/// Photo submissions needed before photos alone move the recommendation.
pub const PHOTO_RECOMMENDATION_THRESHOLD: usize = 4;

/// How strongly the evidence supports the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Advisory resolution suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Suggested verdict.
    pub resolution: DisputeResolution,
    /// How strongly the evidence supports it.
    pub confidence: Confidence,
    /// Why the heuristic landed here.
    pub rationale: String,
}

/// Rank the submitted evidence and suggest a verdict.
pub fn recommend(load: &Load, evidence: &[DisputeEvidence]) -> Recommendation {
    let gps_customer = count(evidence, Party::Customer, EvidenceType::GpsTrail);
    let gps_carrier = count(evidence, Party::Carrier, EvidenceType::GpsTrail);
    match (gps_customer > 0, gps_carrier > 0) {
        (true, false) => {
            return Recommendation {
                resolution: DisputeResolution::CustomerWins,
                confidence: Confidence::High,
                rationale: "GPS trail submitted by the customer".to_string(),
            }
        }
        (false, true) => {
            return Recommendation {
                resolution: DisputeResolution::CarrierWins,
                confidence: Confidence::High,
                rationale: "GPS trail submitted by the carrier".to_string(),
            }
        }
        (true, true) => {
            return Recommendation {
                resolution: DisputeResolution::Split,
                confidence: Confidence::Low,
                rationale: "conflicting GPS trails from both sides".to_string(),
            }
        }
        (false, false) => {}
    }

    let photos_customer = count(evidence, Party::Customer, EvidenceType::Photo);
    let photos_carrier = count(evidence, Party::Carrier, EvidenceType::Photo);
    if photos_customer + photos_carrier >= PHOTO_RECOMMENDATION_THRESHOLD {
        let (resolution, rationale) = if photos_customer > photos_carrier {
            (
                DisputeResolution::CustomerWins,
                "photo evidence favors the customer",
            )
        } else if photos_carrier > photos_customer {
            (
                DisputeResolution::CarrierWins,
                "photo evidence favors the carrier",
            )
        } else {
            (
                DisputeResolution::Split,
                "photo evidence is evenly matched",
            )
        };
        return Recommendation {
            resolution,
            confidence: Confidence::Medium,
            rationale: rationale.to_string(),
        };
    }

    let customer_submissions = evidence
        .iter()
        .filter(|item| item.submitter_role == Party::Customer)
        .count();
    if load.tonu.filed && customer_submissions == 0 {
        return Recommendation {
            resolution: DisputeResolution::CarrierWins,
            confidence: Confidence::Medium,
            rationale: "unrebutted TONU filing".to_string(),
        };
    }

    Recommendation {
        resolution: DisputeResolution::Split,
        confidence: Confidence::Low,
        rationale: "no decisive evidence".to_string(),
    }
}

fn count(evidence: &[DisputeEvidence], role: Party, evidence_type: EvidenceType) -> usize {
    evidence
        .iter()
        .filter(|item| item.submitter_role == role && item.evidence_type == evidence_type)
        .count()
}

#[cfg(test)]
mod tests {
    use haul_core::{DisputeId, GeoPoint, LoadId, OrgId, Timestamp};
    use haul_state::{CommercialTerms, RateMode, Stop, TimeWindow};

    use super::*;

    fn sample_stop() -> Stop {
        let start = Timestamp::parse("2026-03-02T08:00:00Z").unwrap();
        Stop {
            address: "900 W 6th Ave".to_string(),
            city: "Denver".to_string(),
            region: "CO".to_string(),
            coordinates: GeoPoint::new(39.72, -105.0),
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
                rate_cents: 100_000,
                gross_revenue_cents: 100_000,
                rate_mode: RateMode::FlatRate,
                miles: 40.0,
            },
            sample_stop(),
            sample_stop(),
        )
    }

    fn item(load_id: LoadId, role: Party, evidence_type: EvidenceType) -> DisputeEvidence {
        DisputeEvidence::new(
            DisputeId::new(),
            load_id,
            OrgId::new(),
            role,
            evidence_type,
            vec!["https://cdn.example/e.bin".to_string()],
            None,
        )
    }

    #[test]
    fn gps_trail_drives_high_confidence_toward_submitter() {
        let load = sample_load();
        let evidence = vec![
            item(load.id, Party::Carrier, EvidenceType::GpsTrail),
            item(load.id, Party::Customer, EvidenceType::Photo),
        ];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::CarrierWins);
        assert_eq!(rec.confidence, Confidence::High);
    }

    #[test]
    fn conflicting_gps_trails_fall_back_to_low_split() {
        let load = sample_load();
        let evidence = vec![
            item(load.id, Party::Carrier, EvidenceType::GpsTrail),
            item(load.id, Party::Customer, EvidenceType::GpsTrail),
        ];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::Split);
        assert_eq!(rec.confidence, Confidence::Low);
    }

    #[test]
    fn four_photos_without_gps_yield_medium_confidence() {
        let load = sample_load();
        let evidence = vec![
            item(load.id, Party::Customer, EvidenceType::Photo),
            item(load.id, Party::Customer, EvidenceType::Photo),
            item(load.id, Party::Customer, EvidenceType::Photo),
            item(load.id, Party::Carrier, EvidenceType::Photo),
        ];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::CustomerWins);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn three_photos_are_not_enough() {
        let load = sample_load();
        let evidence = vec![
            item(load.id, Party::Customer, EvidenceType::Photo),
            item(load.id, Party::Customer, EvidenceType::Photo),
            item(load.id, Party::Customer, EvidenceType::Photo),
        ];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::Split);
        assert_eq!(rec.confidence, Confidence::Low);
    }

    #[test]
    fn unrebutted_tonu_leans_carrier_at_medium() {
        let mut load = sample_load();
        load.tonu.filed = true;
        let evidence = vec![item(load.id, Party::Carrier, EvidenceType::Document)];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::CarrierWins);
        assert_eq!(rec.confidence, Confidence::Medium);
    }

    #[test]
    fn rebutted_tonu_defaults_to_low_split() {
        let mut load = sample_load();
        load.tonu.filed = true;
        let evidence = vec![
            item(load.id, Party::Carrier, EvidenceType::Document),
            item(load.id, Party::Customer, EvidenceType::Document),
        ];

        let rec = recommend(&load, &evidence);
        assert_eq!(rec.resolution, DisputeResolution::Split);
        assert_eq!(rec.confidence, Confidence::Low);
    }

    #[test]
    fn no_evidence_defaults_to_low_split() {
        let load = sample_load();

        let rec = recommend(&load, &[]);
        assert_eq!(rec.resolution, DisputeResolution::Split);
        assert_eq!(rec.confidence, Confidence::Low);
    }

    #[test]
    fn recommendation_serializes_with_canonical_names() {
        let rec = recommend(&sample_load(), &[]);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["resolution"], "SPLIT");
        assert_eq!(json["confidence"], "LOW");
    }
}
