//! Messaging service for direct messages.
//!
//! The store enforces the channel precondition: only mutual friends may
//! exchange messages. Read state on a thread is flipped by the receiver
//! viewing it, one bulk idempotent update at a time.

use crate::services::notification::NotificationService;
use snapcircle_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use snapcircle_db::{
    entities::{message, user},
    repositories::{FriendshipRepository, MessageRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;

/// Input for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageInput {
    pub text: Option<String>,
    pub attachment_url: Option<String>,
}

/// Per-friend conversation summary for the chat list.
pub struct ThreadSummary {
    pub friend: user::Model,
    pub last_message: Option<message::Model>,
    pub unread_count: u64,
}

/// Messaging service for business logic.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        friendship_repo: FriendshipRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            friendship_repo,
            user_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to another user.
    ///
    /// Rejected when both text and attachment are empty. Forbidden
    /// unless sender and receiver are mutual friends.
    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        input: SendMessageInput,
    ) -> AppResult<message::Model> {
        let text = input
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let attachment_url = input.attachment_url.filter(|a| !a.is_empty());

        if text.is_none() && attachment_url.is_none() {
            return Err(AppError::Rejected(
                "Message must have text or an attachment".to_string(),
            ));
        }

        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        let sender = self.user_repo.get_by_id(sender_id).await?;
        self.user_repo.get_by_id(receiver_id).await?;

        if !self
            .friendship_repo
            .are_friends(sender_id, receiver_id)
            .await?
        {
            return Err(AppError::Forbidden(
                "You can only message your friends".to_string(),
            ));
        }

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            receiver_id: Set(receiver_id.to_string()),
            text: Set(text),
            attachment_url: Set(attachment_url),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let message = self.message_repo.create(model).await?;
        Metrics::incr(&get_metrics().messages_sent);

        self.notifications
            .dispatch(
                sender_id,
                receiver_id,
                &format!("{} sent you a message", sender.username),
                Some(&format!("/messages/?chat={sender_id}")),
            )
            .await;

        Ok(message)
    }

    /// Get the messages between two users, oldest first.
    pub async fn list_thread(
        &self,
        user_a: &str,
        user_b: &str,
        limit: u64,
        after_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        self.message_repo
            .find_thread(user_a, user_b, limit, after_id)
            .await
    }

    /// Mark every unread message addressed to `user_id` from
    /// `counterpart_id` as read. Idempotent; returns how many flipped.
    pub async fn mark_thread_read(&self, user_id: &str, counterpart_id: &str) -> AppResult<u64> {
        self.message_repo
            .mark_thread_read(user_id, counterpart_id)
            .await
    }

    /// Count unread messages addressed to a user from one counterpart.
    pub async fn unread_count_for(&self, user_id: &str, counterpart_id: &str) -> AppResult<u64> {
        self.message_repo
            .count_unread_from(user_id, counterpart_id)
            .await
    }

    /// Count all unread messages addressed to a user.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.message_repo.count_unread(user_id).await
    }

    /// Build the chat list: one summary per friend, with the latest
    /// message and the unread count from that friend.
    pub async fn list_conversations(&self, user_id: &str) -> AppResult<Vec<ThreadSummary>> {
        let friend_ids = self.friendship_repo.find_friend_ids(user_id).await?;

        let mut summaries = Vec::new();

        for friend_id in friend_ids {
            if let Some(friend) = self.user_repo.find_by_id(&friend_id).await? {
                let last_message = self
                    .message_repo
                    .find_latest_in_thread(user_id, &friend_id)
                    .await?;

                let unread_count = self
                    .message_repo
                    .count_unread_from(user_id, &friend_id)
                    .await?;

                summaries.push(ThreadSummary {
                    friend,
                    last_message,
                    unread_count,
                });
            }
        }

        Ok(summaries)
    }
}
