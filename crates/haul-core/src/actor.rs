//! # Actor Roles
//!
//! The authenticated role of whoever requests a transition. Authentication
//! itself happens upstream; by the time a request reaches this stack it has
//! been resolved to an organization (or system) identity plus one of these
//! roles.

use serde::{Deserialize, Serialize};

/// The role of the actor proposing a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// The shipper organization that posted the load (the paying customer).
    Customer,
    /// The carrier organization assigned to haul the load.
    Carrier,
    /// A platform administrator (dispute adjudication, manual overrides).
    Admin,
    /// Automated actors: GPS ping ingestion, scheduled expiry sweeps.
    System,
}

impl ActorRole {
    /// The canonical string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Carrier => "CARRIER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ActorRole::Customer).unwrap(),
            "\"CUSTOMER\""
        );
        let parsed: ActorRole = serde_json::from_str("\"SYSTEM\"").unwrap();
        assert_eq!(parsed, ActorRole::System);
    }

    #[test]
    fn display_matches_as_str() {
        for role in [
            ActorRole::Customer,
            ActorRole::Carrier,
            ActorRole::Admin,
            ActorRole::System,
        ] {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
