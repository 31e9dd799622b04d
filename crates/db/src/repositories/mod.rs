//! Database repositories.

pub mod comment;
pub mod friendship;
pub mod message;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod saved_post;
pub mod user;

pub use comment::CommentRepository;
pub use friendship::FriendshipRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use saved_post::SavedPostRepository;
pub use user::UserRepository;
