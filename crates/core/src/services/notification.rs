//! Notification service.

use snapcircle_common::{AppError, AppResult, IdGenerator, get_metrics};
use snapcircle_db::{entities::notification, repositories::NotificationRepository};
use sea_orm::Set;

/// Notification service for business logic.
///
/// Notifications are created only as a side effect of another action
/// (friend add, like, comment, message). The fan-out path is
/// best-effort: it must never fail the triggering mutation.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification record.
    ///
    /// Fails with `BadRequest` when sender and receiver are the same
    /// user; callers are expected to have guarded already.
    pub async fn notify(
        &self,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
        link: Option<&str>,
    ) -> AppResult<notification::Model> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot notify the acting user".to_string(),
            ));
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            receiver_id: Set(receiver_id.to_string()),
            body: Set(body.to_string()),
            link: Set(link.map(std::string::ToString::to_string)),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.notification_repo.create(model).await
    }

    /// Best-effort fan-out used by the other services.
    ///
    /// Skips silently when sender == receiver (self-actions produce no
    /// notification). A failure is logged and counted, never propagated.
    pub async fn dispatch(
        &self,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
        link: Option<&str>,
    ) {
        if sender_id == receiver_id {
            return;
        }

        match self.notify(sender_id, receiver_id, body, link).await {
            Ok(_) => get_metrics().record_notification(true),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sender_id = %sender_id,
                    receiver_id = %receiver_id,
                    "Failed to fan out notification"
                );
                get_metrics().record_notification(false);
            }
        }
    }

    /// Get notifications for a user, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_receiver(user_id, limit, until_id)
            .await
    }

    /// Mark a notification as read. Idempotent; a notification that does
    /// not belong to the user is left untouched.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self.notification_repo.find_by_id(notification_id).await?;
        if let Some(n) = notification
            && n.receiver_id == user_id
        {
            self.notification_repo.mark_as_read(notification_id).await?;
        }
        Ok(())
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_notification(id: &str, sender: &str, receiver: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            body: format!("{sender} liked your post"),
            link: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_notify_self_returns_error() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = NotificationService::new(NotificationRepository::new(db));

        let result = service.notify("u1", "u1", "hello", None).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_dispatch_self_is_a_no_op() {
        // No query results queued: a self-dispatch must not touch the store.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = NotificationService::new(NotificationRepository::new(db));

        service.dispatch("u1", "u1", "hello", None).await;
    }

    #[tokio::test]
    async fn test_dispatch_swallows_store_failure() {
        // Empty mock: the insert fails, dispatch must not panic or error.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = NotificationService::new(NotificationRepository::new(db));

        service.dispatch("u1", "u2", "hello", None).await;
    }

    #[tokio::test]
    async fn test_mark_read_ignores_foreign_notification() {
        let notification = create_test_notification("n1", "bob", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification]])
                .into_connection(),
        );
        let service = NotificationService::new(NotificationRepository::new(db));

        // "carol" does not own n1: the update must be skipped, so the mock
        // needs no exec result.
        service.mark_read("carol", "n1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list() {
        let n1 = create_test_notification("n2", "bob", "alice");
        let n2 = create_test_notification("n1", "carol", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[n1, n2]])
                .into_connection(),
        );
        let service = NotificationService::new(NotificationRepository::new(db));

        let result = service.list("alice", 10, None).await.unwrap();
        assert_eq!(result.len(), 2);
    }
}
