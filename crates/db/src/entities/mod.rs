//! Database entities.

pub mod comment;
pub mod friendship;
pub mod message;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod saved_post;
pub mod user;

pub use comment::Entity as Comment;
pub use friendship::Entity as Friendship;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use saved_post::Entity as SavedPost;
pub use user::Entity as User;
