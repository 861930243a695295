//! # Outbound Notifications
//!
//! Every lifecycle operation returns the notifications it intends as an
//! explicit list, and the manager hands them to a [`Notifier`]
//! fire-and-forget. The core's correctness never depends on dispatch
//! succeeding, and tests assert exactly which events an operation
//! intended without any delivery machinery.

use serde::{Deserialize, Serialize};

use haul_core::LoadId;

/// Who a notification should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
    /// The shipper organization.
    Shipper,
    /// The assigned carrier organization.
    Carrier,
    /// Platform operations staff.
    Ops,
}

/// What happened, keyed for template selection downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    LoadAssigned,
    ReleaseRequested,
    ReleaseIssued,
    ReleaseExpired,
    TonuFiled,
    LoadCancelled,
    PickupConfirmed,
    DeliveryConfirmed,
    DeliveryApproved,
    SuspiciousActivityFlagged,
    DisputeOpened,
    EvidenceSubmitted,
    DisputeResolved,
    PayoutSent,
    PayoutFailed,
}

/// One intended outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Load the message concerns.
    pub load_id: LoadId,
    /// Who it should reach.
    pub audience: Audience,
    /// Which event it reports.
    pub kind: NotificationKind,
    /// Short human-readable body.
    pub body: String,
}

impl Notification {
    pub fn new(
        load_id: LoadId,
        audience: Audience,
        kind: NotificationKind,
        body: impl Into<String>,
    ) -> Self {
        Self {
            load_id,
            audience,
            kind,
            body: body.into(),
        }
    }
}

/// Outbound dispatch seam. Implementations must not fail the caller:
/// delivery errors are logged and swallowed inside the implementation.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, notification: &Notification);
}

/// Notifier that logs every intended message. The default wiring for
/// tests and environments without an email/SMS provider.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn dispatch(&self, notification: &Notification) {
        tracing::info!(
            load_id = %notification.load_id,
            audience = ?notification.audience,
            kind = ?notification.kind,
            body = %notification.body,
            "notification queued"
        );
    }
}

/// Dispatch a batch fire-and-forget.
pub(crate) fn dispatch_all(notifier: &dyn Notifier, notifications: &[Notification]) {
    for notification in notifications {
        notifier.dispatch(notification);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{Notification, Notifier};

    /// Notifier that records everything dispatched, for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn dispatch(&self, notification: &Notification) {
            self.sent.lock().unwrap().push(notification.clone());
        }
    }
}
