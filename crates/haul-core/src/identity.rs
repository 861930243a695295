//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the Haul Stack.
//! These prevent accidental identifier confusion — you cannot pass
//! an `OrgId` where a `LoadId` is expected.
//!
//! ## Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion where one kind of identifier is substituted
//! for another, e.g. settling a payout against an invoice id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declare a UUID-backed identifier newtype with constructor, accessor,
/// and a namespaced `Display` impl.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a freight load (the central aggregate).
    LoadId,
    "load"
);

uuid_id!(
    /// Unique identifier for an organization (shipper or carrier).
    OrgId,
    "org"
);

uuid_id!(
    /// Unique identifier for a carrier driver.
    DriverId,
    "driver"
);

uuid_id!(
    /// Unique identifier for a customer-side invoice.
    InvoiceId,
    "invoice"
);

uuid_id!(
    /// Unique identifier for a carrier-side payout.
    PayoutId,
    "payout"
);

uuid_id!(
    /// Unique identifier for a dispute proceeding.
    DisputeId,
    "dispute"
);

uuid_id!(
    /// Unique identifier for a dispute evidence record.
    EvidenceId,
    "evidence"
);

uuid_id!(
    /// Unique identifier for a persisted GPS sample.
    GeoEventId,
    "geoevent"
);

uuid_id!(
    /// Unique identifier for a signed carrier attestation.
    AttestationId,
    "attestation"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(LoadId::new(), LoadId::new());
        assert_ne!(OrgId::new(), OrgId::new());
    }

    #[test]
    fn display_is_namespaced() {
        let id = LoadId::new();
        let rendered = id.to_string();
        assert!(rendered.starts_with("load:"));
        assert!(rendered.contains(&id.as_uuid().to_string()));
        assert!(PayoutId::new().to_string().starts_with("payout:"));
    }

    #[test]
    fn serde_roundtrip() {
        let id = DisputeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: DisputeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
