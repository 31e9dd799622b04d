//! Comment service.

use crate::services::notification::NotificationService;
use snapcircle_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use snapcircle_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository, UserRepository},
};
use sea_orm::Set;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post. The post owner is notified unless they
    /// commented on their own post.
    pub async fn add_comment(
        &self,
        post_id: &str,
        author_id: &str,
        text: &str,
    ) -> AppResult<comment::Model> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Comment text must not be empty".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        let author = self.user_repo.get_by_id(author_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_id: Set(author_id.to_string()),
            text: Set(text.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        Metrics::incr(&get_metrics().comments_created);

        if post.user_id != author_id {
            self.notifications
                .dispatch(
                    author_id,
                    &post.user_id,
                    &format!("{} commented on your post", author.username),
                    Some(&format!("/post/{post_id}/")),
                )
                .await;
        }

        Ok(comment)
    }

    /// Remove a comment. Only its author may delete it.
    pub async fn remove_comment(&self, comment_id: &str, actor_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != actor_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await
    }

    /// Get a post's comments, oldest first.
    pub async fn list_comments(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_by_post(post_id).await
    }

    /// Count comments on a post.
    pub async fn comment_count(&self, post_id: &str) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }
}
