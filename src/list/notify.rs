//! User-facing notifications raised by list operations.

use std::sync::Arc;
use std::time::Instant;

use owo_colors::AnsiColors;
use parking_lot::Mutex;

/// A short message shown after an operation finishes.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// When the notification was raised
    pub timestamp: Instant,
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Warning)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Info)
    }

    /// Terminal color for this notification's kind
    pub fn color(&self) -> AnsiColors {
        match self.kind {
            NotificationKind::Success => AnsiColors::Green,
            NotificationKind::Error => AnsiColors::Red,
            NotificationKind::Warning => AnsiColors::Yellow,
            NotificationKind::Info => AnsiColors::Cyan,
        }
    }
}

/// Receives notifications from a list controller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Sink that drops everything.
pub fn silent() -> Arc<dyn NotificationSink> {
    Arc::new(|_: Notification| {})
}

/// Sink that keeps every notification, for callers that render later.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.entries.lock().iter().map(|n| n.kind).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink_receives_notifications() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |n: Notification| seen.lock().push(n.message)
        };

        sink.notify(Notification::success("Saved"));
        assert_eq!(seen.lock().as_slice(), ["Saved".to_string()]);
    }

    #[test]
    fn test_log_collects_in_order() {
        let log = NotificationLog::new();
        log.notify(Notification::info("loading"));
        log.notify(Notification::error("failed"));

        assert_eq!(
            log.kinds(),
            vec![NotificationKind::Info, NotificationKind::Error]
        );
        assert_eq!(log.last().map(|n| n.message), Some("failed".to_string()));

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_colors_by_kind() {
        assert!(matches!(Notification::success("").color(), AnsiColors::Green));
        assert!(matches!(Notification::error("").color(), AnsiColors::Red));
        assert!(matches!(Notification::warning("").color(), AnsiColors::Yellow));
        assert!(matches!(Notification::info("").color(), AnsiColors::Cyan));
    }
}
