//! Notification counter fed by a subscription.

use fhir::{NotificationData, NotificationKind};
use medview_client::SubscriptionEvent;

/// Counts event notifications and tracks whether the channel is reconnecting.
///
/// Handshakes and heartbeats keep the channel alive but are not counted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationWatcher {
    count: u64,
    reconnecting: bool,
    last: Option<NotificationData>,
}

impl NotificationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting
    }

    /// The most recent counted notification.
    pub fn last(&self) -> Option<&NotificationData> {
        self.last.as_ref()
    }

    /// Fold one subscription event in. Returns true if it was a counted notification.
    pub fn apply(&mut self, event: SubscriptionEvent) -> bool {
        match event {
            SubscriptionEvent::Open => {
                self.reconnecting = false;
                false
            }
            SubscriptionEvent::Closed => {
                tracing::warn!(count = self.count, "subscription closed, reconnecting");
                self.reconnecting = true;
                false
            }
            SubscriptionEvent::Notification(notification) => match notification.kind {
                NotificationKind::Handshake | NotificationKind::Heartbeat => false,
                _ => {
                    self.count += 1;
                    tracing::info!(focus = ?notification.focus, "notification received");
                    self.last = Some(notification);
                    true
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: NotificationKind) -> SubscriptionEvent {
        SubscriptionEvent::Notification(NotificationData {
            kind,
            subscription: Some("Subscription/s1".into()),
            focus: vec!["Patient/p1".into()],
        })
    }

    #[test]
    fn test_counts_event_notifications_only() {
        let mut watcher = NotificationWatcher::new();
        assert!(!watcher.apply(SubscriptionEvent::Open));
        assert!(!watcher.apply(notification(NotificationKind::Handshake)));
        assert!(!watcher.apply(notification(NotificationKind::Heartbeat)));
        assert!(watcher.apply(notification(NotificationKind::EventNotification)));
        assert!(watcher.apply(notification(NotificationKind::EventNotification)));
        assert_eq!(watcher.count(), 2);
        assert_eq!(watcher.last().map(|n| n.focus.clone()), Some(vec!["Patient/p1".into()]));
    }

    #[test]
    fn test_reconnecting_set_on_close_and_cleared_on_open() {
        let mut watcher = NotificationWatcher::new();
        assert!(!watcher.is_reconnecting());
        watcher.apply(SubscriptionEvent::Closed);
        assert!(watcher.is_reconnecting());
        watcher.apply(notification(NotificationKind::EventNotification));
        assert!(watcher.is_reconnecting());
        watcher.apply(SubscriptionEvent::Open);
        assert!(!watcher.is_reconnecting());
        assert_eq!(watcher.count(), 1);
    }
}
