//! # Load Status State Machine
//!
//! The authoritative set of legal load status transitions. Every other
//! component requests transitions through this table; nothing else in the
//! stack flips a status.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Loads are persisted rows whose state is not known at compile time, and
//! several transitions (cancellation, dispute opening) are legal from many
//! source states. A validated enum with a single adjacency table serializes
//! directly via serde and keeps the legality question in one place;
//! typestate would scatter identical cancellation logic across a dozen
//! `impl` blocks.
//!
//! ## Transition Graph
//!
//! ```text
//! DRAFT ─▶ POSTED ─▶ ASSIGNED ─▶ ACCEPTED ─▶ RELEASE_REQUESTED ─▶ RELEASED
//!                                    │                               │
//!                                    └──────────▶ RELEASED ◀─────────┘
//!                                                    │
//!                      EXPIRED_RELEASE ◀──expiry─────┼────geofence──▶ IN_TRANSIT
//!                             │                      │                   │
//!                             └──reconfirm──▶ RELEASED          ┌────────┤
//!                                                    │          ▼        ▼
//!                                                  TONU ◀── IN_TRANSIT  DELIVERED
//!                                                    │                   │
//!                                                    ▼                   ▼
//!                                                DISPUTED ◀────── PENDING_APPROVAL
//!                                                    │                   │
//!                                             COMPLETED | TONU       COMPLETED
//! ```
//!
//! Carrier-initiated cancellation rolls an assigned load back to `POSTED`
//! for relisting; customer-initiated cancellation lands in the terminal
//! `CANCELLED`. `IN_TRANSIT` is never cancellable — material is on a truck.
//! `COMPLETED → DISPUTED` is the single post-completion exception: a
//! completed load may still be disputed, and resolution returns it to
//! `COMPLETED` or `TONU`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle state of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    /// Shipper is still drafting the load.
    Draft,
    /// Visible on the board, open for bids.
    Posted,
    /// A carrier has been assigned but has not accepted.
    Assigned,
    /// The assigned carrier accepted the haul.
    Accepted,
    /// Carrier asked the shipper to confirm material is ready.
    ReleaseRequested,
    /// Shipper confirmed material ready; the escrow hold is placed here.
    Released,
    /// The 24-hour release window lapsed without pickup.
    ExpiredRelease,
    /// Truck picked up material and is moving.
    InTransit,
    /// Material arrived at the delivery site.
    Delivered,
    /// Delivered, awaiting shipper approval of the proof of delivery.
    PendingApproval,
    /// Settled and closed (terminal, barring a late dispute).
    Completed,
    /// Truck ordered, not used — carrier compensated, load closed.
    Tonu,
    /// A dispute is open; resolution returns to COMPLETED or TONU.
    Disputed,
    /// Cancelled by the customer (terminal).
    Cancelled,
}

impl LoadStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Assigned => "ASSIGNED",
            Self::Accepted => "ACCEPTED",
            Self::ReleaseRequested => "RELEASE_REQUESTED",
            Self::Released => "RELEASED",
            Self::ExpiredRelease => "EXPIRED_RELEASE",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Completed => "COMPLETED",
            Self::Tonu => "TONU",
            Self::Disputed => "DISPUTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Valid target states from this state.
    ///
    /// The `POSTED` targets on assigned/accepted/released states are the
    /// carrier-cancellation rollback: the load is relisted rather than
    /// terminally cancelled.
    pub fn valid_transitions(&self) -> &'static [LoadStatus] {
        match self {
            Self::Draft => &[Self::Posted],
            Self::Posted => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::Accepted, Self::Posted, Self::Cancelled],
            Self::Accepted => &[
                Self::ReleaseRequested,
                Self::Released,
                Self::Posted,
                Self::Cancelled,
            ],
            Self::ReleaseRequested => &[Self::Released, Self::Posted, Self::Cancelled],
            Self::Released => &[
                Self::InTransit,
                Self::Tonu,
                Self::ExpiredRelease,
                Self::Posted,
                Self::Cancelled,
            ],
            Self::ExpiredRelease => &[Self::Released, Self::Cancelled],
            Self::InTransit => &[Self::Delivered, Self::Tonu],
            Self::Delivered => &[Self::PendingApproval, Self::Disputed],
            Self::PendingApproval => &[Self::Completed, Self::Disputed],
            Self::Completed => &[Self::Disputed],
            Self::Tonu => &[Self::Disputed],
            Self::Disputed => &[Self::Completed, Self::Tonu],
            Self::Cancelled => &[],
        }
    }

    /// Whether a transition from this status to `target` is legal.
    pub fn can_transition_to(&self, target: LoadStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether this status is terminal for settlement purposes.
    ///
    /// `COMPLETED` still admits the dispute branch; `CANCELLED` admits
    /// nothing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a dispute may be opened while the load is in this status.
    pub fn is_disputable(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::PendingApproval | Self::Completed | Self::Tonu
        )
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// State machine violations. Always rejected, never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested transition is not in the adjacency table.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Persisted status at validation time.
        from: LoadStatus,
        /// Requested target status.
        to: LoadStatus,
    },

    /// The caller's expected status no longer matches the persisted status.
    ///
    /// A concurrent actor won the compare-and-swap; the caller must re-read
    /// and decide again (HTTP layer maps this to 409).
    #[error("stale state: expected {expected}, found {actual}")]
    StaleState {
        /// Status the caller observed before requesting the transition.
        expected: LoadStatus,
        /// Status actually persisted.
        actual: LoadStatus,
    },

    /// A dispute verdict string did not name a known resolution.
    #[error("invalid dispute resolution: {value}")]
    InvalidResolution {
        /// The rejected input.
        value: String,
    },
}

/// Validate a transition against the adjacency table.
pub fn validate_transition(from: LoadStatus, to: LoadStatus) -> Result<(), StateError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StateError::InvalidTransition { from, to })
    }
}

/// Validate the optimistic-concurrency guard: the caller's expected status
/// must equal the persisted status.
pub fn check_expected(expected: LoadStatus, actual: LoadStatus) -> Result<(), StateError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StateError::StaleState { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LoadStatus; 14] = [
        LoadStatus::Draft,
        LoadStatus::Posted,
        LoadStatus::Assigned,
        LoadStatus::Accepted,
        LoadStatus::ReleaseRequested,
        LoadStatus::Released,
        LoadStatus::ExpiredRelease,
        LoadStatus::InTransit,
        LoadStatus::Delivered,
        LoadStatus::PendingApproval,
        LoadStatus::Completed,
        LoadStatus::Tonu,
        LoadStatus::Disputed,
        LoadStatus::Cancelled,
    ];

    #[test]
    fn happy_path_is_legal_end_to_end() {
        let path = [
            LoadStatus::Draft,
            LoadStatus::Posted,
            LoadStatus::Assigned,
            LoadStatus::Accepted,
            LoadStatus::ReleaseRequested,
            LoadStatus::Released,
            LoadStatus::InTransit,
            LoadStatus::Delivered,
            LoadStatus::PendingApproval,
            LoadStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn cancelled_is_a_dead_end() {
        for target in ALL {
            assert!(!LoadStatus::Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn in_transit_is_not_cancellable() {
        assert!(!LoadStatus::InTransit.can_transition_to(LoadStatus::Cancelled));
        assert!(!LoadStatus::InTransit.can_transition_to(LoadStatus::Posted));
    }

    #[test]
    fn carrier_rollback_targets_posted() {
        for from in [
            LoadStatus::Assigned,
            LoadStatus::Accepted,
            LoadStatus::ReleaseRequested,
            LoadStatus::Released,
        ] {
            assert!(from.can_transition_to(LoadStatus::Posted), "from {from}");
        }
    }

    #[test]
    fn dispute_sources_match_is_disputable() {
        for status in ALL {
            assert_eq!(
                status.can_transition_to(LoadStatus::Disputed),
                status.is_disputable(),
                "status {status}"
            );
        }
    }

    #[test]
    fn disputed_resolves_to_completed_or_tonu_only() {
        assert_eq!(
            LoadStatus::Disputed.valid_transitions(),
            &[LoadStatus::Completed, LoadStatus::Tonu]
        );
    }

    #[test]
    fn expired_release_requires_reconfirmation() {
        assert!(LoadStatus::Released.can_transition_to(LoadStatus::ExpiredRelease));
        assert!(LoadStatus::ExpiredRelease.can_transition_to(LoadStatus::Released));
        assert!(!LoadStatus::ExpiredRelease.can_transition_to(LoadStatus::InTransit));
    }

    #[test]
    fn tonu_only_from_released_or_in_transit() {
        for status in ALL {
            let expected = matches!(status, LoadStatus::Released | LoadStatus::InTransit);
            assert_eq!(status.can_transition_to(LoadStatus::Tonu), expected, "{status}");
        }
    }

    #[test]
    fn validate_transition_rejects_illegal_pairs() {
        let err = validate_transition(LoadStatus::Posted, LoadStatus::Delivered).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: LoadStatus::Posted,
                to: LoadStatus::Delivered
            }
        );
        assert!(validate_transition(LoadStatus::Posted, LoadStatus::Assigned).is_ok());
    }

    #[test]
    fn check_expected_detects_stale_state() {
        assert!(check_expected(LoadStatus::Released, LoadStatus::Released).is_ok());
        let err = check_expected(LoadStatus::Released, LoadStatus::InTransit).unwrap_err();
        assert_eq!(
            err,
            StateError::StaleState {
                expected: LoadStatus::Released,
                actual: LoadStatus::InTransit
            }
        );
    }

    #[test]
    fn serde_uses_screaming_snake_names() {
        assert_eq!(
            serde_json::to_string(&LoadStatus::ReleaseRequested).unwrap(),
            "\"RELEASE_REQUESTED\""
        );
        let parsed: LoadStatus = serde_json::from_str("\"EXPIRED_RELEASE\"").unwrap();
        assert_eq!(parsed, LoadStatus::ExpiredRelease);
    }

    #[test]
    fn as_str_matches_serde_name() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
