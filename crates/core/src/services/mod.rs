//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod comment;
pub mod friendship;
pub mod messaging;
pub mod notification;
pub mod post;

pub use account::{AccountService, RegisterInput, UpdateProfileInput};
pub use comment::CommentService;
pub use friendship::FriendshipService;
pub use messaging::{MessagingService, SendMessageInput, ThreadSummary};
pub use notification::NotificationService;
pub use post::{CreatePostInput, LikeToggle, PostService, SaveToggle, UpdatePostInput};
