//! Metrics collection for snapcircle.
//!
//! Application-level counters for tracking usage and surfacing
//! best-effort failures (notification fan-out) to an observability
//! channel instead of swallowing them silently.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    // === Account Metrics ===
    /// Users registered
    pub users_registered: AtomicU64,
    /// Failed authentication attempts
    pub auth_failures: AtomicU64,

    // === Content Metrics ===
    /// Posts created
    pub posts_created: AtomicU64,
    /// Posts deleted
    pub posts_deleted: AtomicU64,
    /// Comments created
    pub comments_created: AtomicU64,
    /// Like toggles applied (either direction)
    pub likes_toggled: AtomicU64,
    /// Saved-post toggles applied (either direction)
    pub saves_toggled: AtomicU64,

    // === Graph Metrics ===
    /// Friendships created
    pub friendships_created: AtomicU64,
    /// Friendships removed
    pub friendships_removed: AtomicU64,

    // === Messaging Metrics ===
    /// Direct messages sent
    pub messages_sent: AtomicU64,

    // === Fan-out Metrics ===
    /// Notifications created
    pub notifications_created: AtomicU64,
    /// Notification fan-out failures (swallowed, logged, counted here)
    pub notification_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            users_registered: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),

            posts_created: AtomicU64::new(0),
            posts_deleted: AtomicU64::new(0),
            comments_created: AtomicU64::new(0),
            likes_toggled: AtomicU64::new(0),
            saves_toggled: AtomicU64::new(0),

            friendships_created: AtomicU64::new(0),
            friendships_removed: AtomicU64::new(0),

            messages_sent: AtomicU64::new(0),

            notifications_created: AtomicU64::new(0),
            notification_failures: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a notification fan-out outcome.
    pub fn record_notification(&self, success: bool) {
        if success {
            self.notifications_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notification_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_registered: self.users_registered.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            posts_created: self.posts_created.load(Ordering::Relaxed),
            posts_deleted: self.posts_deleted.load(Ordering::Relaxed),
            comments_created: self.comments_created.load(Ordering::Relaxed),
            likes_toggled: self.likes_toggled.load(Ordering::Relaxed),
            saves_toggled: self.saves_toggled.load(Ordering::Relaxed),
            friendships_created: self.friendships_created.load(Ordering::Relaxed),
            friendships_removed: self.friendships_removed.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            notifications_created: self.notifications_created.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of all counters, serializable for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub users_registered: u64,
    pub auth_failures: u64,
    pub posts_created: u64,
    pub posts_deleted: u64,
    pub comments_created: u64,
    pub likes_toggled: u64,
    pub saves_toggled: u64,
    pub friendships_created: u64,
    pub friendships_removed: u64,
    pub messages_sent: u64,
    pub notifications_created: u64,
    pub notification_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = Metrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.posts_created, 0);
        assert_eq!(snapshot.notification_failures, 0);
    }

    #[test]
    fn test_record_notification() {
        let metrics = Metrics::new();
        metrics.record_notification(true);
        metrics.record_notification(true);
        metrics.record_notification(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notifications_created, 2);
        assert_eq!(snapshot.notification_failures, 1);
    }

    #[test]
    fn test_incr() {
        let metrics = Metrics::new();
        Metrics::incr(&metrics.messages_sent);
        assert_eq!(metrics.snapshot().messages_sent, 1);
    }
}
