//! Friendship service.
//!
//! Friendship is symmetric and self-edges are forbidden. The storage
//! model is a single undirected edge per pair, so `is_friend(a, b)` and
//! `is_friend(b, a)` cannot disagree and removal never leaves a stale
//! reverse edge.

use crate::services::notification::NotificationService;
use snapcircle_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use snapcircle_db::{
    entities::{friendship, user},
    repositories::{FriendshipRepository, UserRepository, friendship::canonical_pair},
};
use sea_orm::Set;

/// Friendship service for business logic.
#[derive(Clone)]
pub struct FriendshipService {
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub const fn new(
        friendship_repo: FriendshipRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            friendship_repo,
            user_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a friend. Idempotent: returns `true` when a new edge was
    /// created, `false` when the users were already friends (in which
    /// case no second notification goes out).
    pub async fn add_friend(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        if actor_id == target_id {
            return Err(AppError::BadRequest(
                "Cannot add yourself as a friend".to_string(),
            ));
        }

        let actor = self.user_repo.get_by_id(actor_id).await?;
        self.user_repo.get_by_id(target_id).await?;

        if self.friendship_repo.are_friends(actor_id, target_id).await? {
            return Ok(false);
        }

        let (low, high) = canonical_pair(actor_id, target_id);
        let model = friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_low_id: Set(low.to_string()),
            user_high_id: Set(high.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.friendship_repo.create(model).await?;
        Metrics::incr(&get_metrics().friendships_created);

        self.notifications
            .dispatch(
                actor_id,
                target_id,
                &format!("{} added you as a friend", actor.username),
                Some(&format!("/profile/{actor_id}/friends/")),
            )
            .await;

        Ok(true)
    }

    /// Remove a friend. Idempotent; deleting the single undirected edge
    /// clears the relation in both directions.
    pub async fn remove_friend(&self, actor_id: &str, target_id: &str) -> AppResult<()> {
        if actor_id == target_id {
            return Err(AppError::BadRequest(
                "Cannot unfriend yourself".to_string(),
            ));
        }

        let removed = self
            .friendship_repo
            .delete_by_pair(actor_id, target_id)
            .await?;

        if removed > 0 {
            Metrics::incr(&get_metrics().friendships_removed);
        }

        Ok(())
    }

    /// Check whether two users are friends.
    pub async fn is_friend(&self, a: &str, b: &str) -> AppResult<bool> {
        if a == b {
            return Ok(false);
        }
        self.friendship_repo.are_friends(a, b).await
    }

    /// List a user's friends, newest friendship first.
    pub async fn list_friends(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let friend_ids = self.friendship_repo.find_friend_ids(user_id).await?;
        self.user_repo.find_by_ids(&friend_ids).await
    }

    /// Count a user's friends.
    pub async fn count_friends(&self, user_id: &str) -> AppResult<u64> {
        self.friendship_repo.count_for_user(user_id).await
    }
}
