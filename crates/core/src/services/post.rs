//! Post service: creation, editing, the feed, and the like/save toggles.

use crate::services::notification::NotificationService;
use snapcircle_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use snapcircle_db::{
    entities::{post, post_like, saved_post},
    repositories::{PostLikeRepository, PostRepository, SavedPostRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    /// The like was added.
    Liked,
    /// The like was removed.
    Unliked,
}

/// Outcome of a save toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    /// The post was saved.
    Saved,
    /// The post was removed from saved.
    Unsaved,
}

/// Input for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 1024))]
    pub image_url: String,

    #[validate(length(max = 4096))]
    #[serde(default)]
    pub description: String,
}

/// Input for updating a post.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 1024))]
    pub image_url: Option<String>,

    #[validate(length(max = 4096))]
    pub description: Option<String>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    post_like_repo: PostLikeRepository,
    saved_post_repo: SavedPostRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        post_like_repo: PostLikeRepository,
        saved_post_repo: SavedPostRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            post_repo,
            post_like_repo,
            saved_post_repo,
            user_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post.
    pub async fn create(&self, owner_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        self.user_repo.get_by_id(owner_id).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner_id.to_string()),
            image_url: Set(input.image_url),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        let post = self.post_repo.create(model).await?;
        Metrics::incr(&get_metrics().posts_created);

        Ok(post)
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// Update a post. Only the owner may edit; the owner itself never
    /// changes.
    pub async fn update(
        &self,
        post_id: &str,
        editor_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != editor_id {
            return Err(AppError::Forbidden(
                "You can only edit your own posts".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();

        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        self.post_repo.update(active).await
    }

    /// Delete a post. Only the owner may delete; comments, likes and
    /// saves cascade away with it.
    pub async fn delete(&self, post_id: &str, actor_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != actor_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await?;
        Metrics::incr(&get_metrics().posts_deleted);

        Ok(())
    }

    /// Toggle a like: remove it when present, add it when absent.
    ///
    /// The removal is one conditional `DELETE`; when it removes nothing
    /// the insert runs against the unique `(user_id, post_id)` index, so
    /// two concurrent toggles by the same user cannot both add.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> AppResult<LikeToggle> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let removed = self
            .post_like_repo
            .delete_by_user_and_post(user_id, post_id)
            .await?;

        Metrics::incr(&get_metrics().likes_toggled);

        if removed > 0 {
            return Ok(LikeToggle::Unliked);
        }

        let model = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.post_like_repo.create(model).await?;

        // Self-likes produce no notification.
        if post.user_id != user_id {
            let liker = self.user_repo.get_by_id(user_id).await?;
            self.notifications
                .dispatch(
                    user_id,
                    &post.user_id,
                    &format!("{} liked your post", liker.username),
                    Some(&format!("/post/{post_id}/")),
                )
                .await;
        }

        Ok(LikeToggle::Liked)
    }

    /// Toggle a save: remove it when present, add it when absent. Same
    /// flip pattern as likes, but saves never notify anyone.
    pub async fn toggle_saved(&self, user_id: &str, post_id: &str) -> AppResult<SaveToggle> {
        self.post_repo.get_by_id(post_id).await?;

        let removed = self
            .saved_post_repo
            .delete_by_user_and_post(user_id, post_id)
            .await?;

        Metrics::incr(&get_metrics().saves_toggled);

        if removed > 0 {
            return Ok(SaveToggle::Unsaved);
        }

        let model = saved_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.saved_post_repo.create(model).await?;

        Ok(SaveToggle::Saved)
    }

    /// Check whether a user has liked a post.
    pub async fn is_liked(&self, post_id: &str, user_id: &str) -> AppResult<bool> {
        self.post_like_repo.has_liked(user_id, post_id).await
    }

    /// Count likes on a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.post_like_repo.count_by_post(post_id).await
    }

    /// The global feed, newest first.
    pub async fn list_feed(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_all(limit, until_id).await
    }

    /// A user's posts, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo.find_by_user(user_id, limit, until_id).await
    }

    /// A user's saved posts, newest first.
    pub async fn list_saved(&self, user_id: &str) -> AppResult<Vec<post::Model>> {
        let post_ids = self.saved_post_repo.find_post_ids_by_user(user_id).await?;
        self.post_repo.find_by_ids(&post_ids).await
    }
}
