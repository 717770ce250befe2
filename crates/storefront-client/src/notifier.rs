//! Local notifications fired after a successful submission.
//!
//! Delivery to the device is the UI shell's job; it either subscribes to a
//! [`ChannelNotifier`] or the engine just logs through [`LogNotifier`].

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What the user sees in the notification tray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Notification {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Notification sink. Never fails: a lost notification must not turn a
/// successful submission into an error.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!(title = %notification.title, body = %notification.body, "Notification");
    }
}

/// Drops everything; used when notifications are disabled in config.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, notification: Notification) {
        debug!(title = %notification.title, "Notifications disabled");
    }
}

/// Forwards notifications to a receiver owned by the UI bridge.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}
