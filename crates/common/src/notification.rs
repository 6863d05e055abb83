//! Single-slot queue of transient user-visible messages.
//!
//! A new message replaces whatever is showing. Renderers poll
//! [`NotificationChannel::is_visible`] to decide when to hide it.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// How long a notice stays up unless overridden
pub const DEFAULT_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub delay: Duration,
    pub timestamp: DateTime<Utc>,
    pub open: bool,
}

#[derive(Debug, Clone)]
pub struct NotificationChannel {
    slot: Notification,
    shown: u64,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl NotificationChannel {
    pub fn new(delay: Duration) -> Self {
        Self {
            slot: Notification {
                message: String::new(),
                delay,
                timestamp: Utc::now(),
                open: false,
            },
            shown: 0,
        }
    }

    /// Replace the slot with `message` and open it
    pub fn show(&mut self, message: impl Into<String>) {
        self.slot.message = message.into();
        self.slot.timestamp = Utc::now();
        self.slot.open = true;
        self.shown += 1;
        tracing::debug!(message = %self.slot.message, "notification shown");
    }

    pub fn set_open(&mut self, open: bool) {
        self.slot.open = open;
    }

    pub fn dismiss(&mut self) {
        self.set_open(false);
    }

    pub fn current(&self) -> &Notification {
        &self.slot
    }

    /// Open and still within its display duration at `now`
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        if !self.slot.open {
            return false;
        }
        let elapsed = (now - self.slot.timestamp).to_std().unwrap_or_default();
        elapsed < self.slot.delay
    }

    /// Total number of notices shown since creation
    pub fn shown_count(&self) -> u64 {
        self.shown
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_show_replaces_slot() {
        let mut channel = NotificationChannel::default();
        assert!(!channel.current().open);

        channel.show("first");
        channel.show("second");
        assert_eq!(channel.current().message, "second");
        assert!(channel.current().open);
        assert_eq!(channel.shown_count(), 2);
    }

    #[test]
    fn test_visibility_window() {
        let mut channel = NotificationChannel::new(Duration::from_millis(3000));
        channel.show("network error");
        let shown_at = channel.current().timestamp;

        assert!(channel.is_visible(shown_at));
        assert!(channel.is_visible(shown_at + chrono::Duration::milliseconds(2999)));
        assert!(!channel.is_visible(shown_at + chrono::Duration::milliseconds(3000)));

        channel.dismiss();
        assert!(!channel.is_visible(shown_at));
    }
}
