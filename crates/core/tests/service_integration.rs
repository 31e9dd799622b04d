//! Service integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p snapcircle-core --test service_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `snapcircle_test`)
//!   `TEST_DB_PASSWORD` (default: `snapcircle_test`)
//!   `TEST_DB_NAME` (default: `snapcircle_test`)

#![allow(clippy::unwrap_used)]

use snapcircle_core::{
    AccountService, CommentService, CreatePostInput, FriendshipService, LikeToggle,
    MessagingService, NotificationService, PostService, RegisterInput, SaveToggle,
    SendMessageInput, UpdatePostInput, UpdateProfileInput,
};
use snapcircle_common::AppError;
use snapcircle_db::entities::user;
use snapcircle_db::repositories::{
    CommentRepository, FriendshipRepository, MessageRepository, NotificationRepository,
    PostLikeRepository, PostRepository, SavedPostRepository, UserRepository,
};
use snapcircle_db::test_utils::TestDatabase;

struct Services {
    accounts: AccountService,
    friendships: FriendshipService,
    posts: PostService,
    comments: CommentService,
    messaging: MessagingService,
    notifications: NotificationService,
}

async fn setup() -> (TestDatabase, Services) {
    let test_db = TestDatabase::create_unique().await.unwrap();
    snapcircle_db::migrate(test_db.connection()).await.unwrap();

    let db = test_db.connection_arc();

    let user_repo = UserRepository::new(db.clone());
    let friendship_repo = FriendshipRepository::new(db.clone());
    let post_repo = PostRepository::new(db.clone());
    let post_like_repo = PostLikeRepository::new(db.clone());
    let saved_post_repo = SavedPostRepository::new(db.clone());
    let comment_repo = CommentRepository::new(db.clone());
    let message_repo = MessageRepository::new(db.clone());
    let notification_repo = NotificationRepository::new(db.clone());

    let notifications = NotificationService::new(notification_repo);

    let services = Services {
        accounts: AccountService::new(user_repo.clone()),
        friendships: FriendshipService::new(
            friendship_repo.clone(),
            user_repo.clone(),
            notifications.clone(),
        ),
        posts: PostService::new(
            post_repo.clone(),
            post_like_repo,
            saved_post_repo,
            user_repo.clone(),
            notifications.clone(),
        ),
        comments: CommentService::new(
            comment_repo,
            post_repo,
            user_repo.clone(),
            notifications.clone(),
        ),
        messaging: MessagingService::new(
            message_repo,
            friendship_repo,
            user_repo,
            notifications.clone(),
        ),
        notifications,
    };

    (test_db, services)
}

async fn register(services: &Services, username: &str) -> user::Model {
    services
        .accounts
        .register(RegisterInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "password123".to_string(),
            name: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_like_notification_scenario() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/sunset.jpg".to_string(),
                description: "Sunset".to_string(),
            },
        )
        .await
        .unwrap();

    let toggle = services.posts.toggle_like(&post.id, &bob.id).await.unwrap();
    assert_eq!(toggle, LikeToggle::Liked);

    // Exactly one unread notification for alice, worded after the actor.
    let notifications = services.notifications.list(&alice.id, 10, None).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].body, "bob liked your post");
    assert!(!notifications[0].is_read);
    assert_eq!(
        services.notifications.count_unread(&alice.id).await.unwrap(),
        1
    );

    services
        .notifications
        .mark_read(&alice.id, &notifications[0].id)
        .await
        .unwrap();
    assert_eq!(
        services.notifications.count_unread(&alice.id).await.unwrap(),
        0
    );

    // Marking read twice is idempotent.
    services
        .notifications
        .mark_read(&alice.id, &notifications[0].id)
        .await
        .unwrap();
    assert_eq!(
        services.notifications.count_unread(&alice.id).await.unwrap(),
        0
    );

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_toggle_like_is_an_involution() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/sunset.jpg".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        services.posts.toggle_like(&post.id, &bob.id).await.unwrap(),
        LikeToggle::Liked
    );
    assert!(services.posts.is_liked(&post.id, &bob.id).await.unwrap());
    assert_eq!(services.posts.like_count(&post.id).await.unwrap(), 1);

    assert_eq!(
        services.posts.toggle_like(&post.id, &bob.id).await.unwrap(),
        LikeToggle::Unliked
    );
    assert!(!services.posts.is_liked(&post.id, &bob.id).await.unwrap());
    assert_eq!(services.posts.like_count(&post.id).await.unwrap(), 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_self_like_produces_no_notification() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/selfie.jpg".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    services.posts.toggle_like(&post.id, &alice.id).await.unwrap();

    assert_eq!(
        services.notifications.count_unread(&alice.id).await.unwrap(),
        0
    );
    assert!(services
        .notifications
        .list(&alice.id, 10, None)
        .await
        .unwrap()
        .is_empty());

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_friendship_symmetry_and_idempotence() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    assert!(services
        .friendships
        .add_friend(&alice.id, &bob.id)
        .await
        .unwrap());

    assert!(services.friendships.is_friend(&alice.id, &bob.id).await.unwrap());
    assert!(services.friendships.is_friend(&bob.id, &alice.id).await.unwrap());

    // Second add: same state, no second notification for bob.
    assert!(!services
        .friendships
        .add_friend(&alice.id, &bob.id)
        .await
        .unwrap());
    assert_eq!(
        services.notifications.list(&bob.id, 10, None).await.unwrap().len(),
        1
    );

    // Removal from the other side clears the edge for both.
    services
        .friendships
        .remove_friend(&bob.id, &alice.id)
        .await
        .unwrap();
    assert!(!services.friendships.is_friend(&alice.id, &bob.id).await.unwrap());
    assert!(!services.friendships.is_friend(&bob.id, &alice.id).await.unwrap());

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_messaging_flow() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;
    let carol = register(&services, "carol").await;

    services
        .friendships
        .add_friend(&alice.id, &bob.id)
        .await
        .unwrap();

    // Empty message is rejected outright.
    let rejected = services
        .messaging
        .send_message(
            &alice.id,
            &bob.id,
            SendMessageInput {
                text: Some(String::new()),
                attachment_url: None,
            },
        )
        .await;
    assert!(matches!(rejected, Err(AppError::Rejected(_))));

    // Non-friends cannot open a channel.
    let forbidden = services
        .messaging
        .send_message(
            &carol.id,
            &bob.id,
            SendMessageInput {
                text: Some("hey".to_string()),
                attachment_url: None,
            },
        )
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    services
        .messaging
        .send_message(
            &alice.id,
            &bob.id,
            SendMessageInput {
                text: Some("hello".to_string()),
                attachment_url: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        services
            .messaging
            .unread_count_for(&bob.id, &alice.id)
            .await
            .unwrap(),
        1
    );

    let thread = services
        .messaging
        .list_thread(&alice.id, &bob.id, 50, None)
        .await
        .unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].text.as_deref(), Some("hello"));
    assert!(!thread[0].is_read);

    // Bob opens the thread: the read flag flips exactly once.
    assert_eq!(
        services
            .messaging
            .mark_thread_read(&bob.id, &alice.id)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        services
            .messaging
            .unread_count_for(&bob.id, &alice.id)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        services
            .messaging
            .mark_thread_read(&bob.id, &alice.id)
            .await
            .unwrap(),
        0
    );

    let thread = services
        .messaging
        .list_thread(&alice.id, &bob.id, 50, None)
        .await
        .unwrap();
    assert!(thread[0].is_read);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_thread_orders_by_creation_time() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    services
        .friendships
        .add_friend(&alice.id, &bob.id)
        .await
        .unwrap();

    for (sender, receiver, text) in [
        (&alice, &bob, "one"),
        (&bob, &alice, "two"),
        (&alice, &bob, "three"),
    ] {
        services
            .messaging
            .send_message(
                &sender.id,
                &receiver.id,
                SendMessageInput {
                    text: Some(text.to_string()),
                    attachment_url: None,
                },
            )
            .await
            .unwrap();
    }

    let thread = services
        .messaging
        .list_thread(&alice.id, &bob.id, 50, None)
        .await
        .unwrap();

    let texts: Vec<_> = thread.iter().filter_map(|m| m.text.as_deref()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_comment_flow_and_guards() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;
    let carol = register(&services, "carol").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/coffee.jpg".to_string(),
                description: "Coffee".to_string(),
            },
        )
        .await
        .unwrap();

    let comment = services
        .comments
        .add_comment(&post.id, &bob.id, "Looks great")
        .await
        .unwrap();

    let notifications = services.notifications.list(&alice.id, 10, None).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].body, "bob commented on your post");

    // Only the author may delete a comment.
    let forbidden = services.comments.remove_comment(&comment.id, &carol.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    services
        .comments
        .remove_comment(&comment.id, &bob.id)
        .await
        .unwrap();
    assert_eq!(services.comments.comment_count(&post.id).await.unwrap(), 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_post_guards_and_cascade() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/coffee.jpg".to_string(),
                description: "Coffee".to_string(),
            },
        )
        .await
        .unwrap();

    let forbidden = services
        .posts
        .update(
            &post.id,
            &bob.id,
            UpdatePostInput {
                image_url: None,
                description: Some("mine now".to_string()),
            },
        )
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    services
        .comments
        .add_comment(&post.id, &bob.id, "Nice")
        .await
        .unwrap();
    services.posts.toggle_like(&post.id, &bob.id).await.unwrap();

    services.posts.delete(&post.id, &alice.id).await.unwrap();

    // Dependent rows went with the post.
    assert!(matches!(
        services.posts.get(&post.id).await,
        Err(AppError::PostNotFound(_))
    ));
    assert_eq!(services.comments.comment_count(&post.id).await.unwrap(), 0);
    assert_eq!(services.posts.like_count(&post.id).await.unwrap(), 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_saved_posts_toggle_and_listing() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    let post = services
        .posts
        .create(
            &alice.id,
            CreatePostInput {
                image_url: "/media/posts/coffee.jpg".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        services.posts.toggle_saved(&bob.id, &post.id).await.unwrap(),
        SaveToggle::Saved
    );

    let saved = services.posts.list_saved(&bob.id).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, post.id);

    assert_eq!(
        services.posts.toggle_saved(&bob.id, &post.id).await.unwrap(),
        SaveToggle::Unsaved
    );
    assert!(services.posts.list_saved(&bob.id).await.unwrap().is_empty());

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_registration_and_profile_uniqueness() {
    let (test_db, services) = setup().await;

    register(&services, "alice").await;
    let bob = register(&services, "bob").await;

    // Case-insensitive duplicate.
    let duplicate = services
        .accounts
        .register(RegisterInput {
            username: "Alice".to_string(),
            email: "other@example.com".to_string(),
            password: "password123".to_string(),
            name: None,
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Duplicate(_))));

    // Renaming bob onto alice's username fails the same way.
    let clash = services
        .accounts
        .update_profile(
            &bob.id,
            UpdateProfileInput {
                username: Some("ALICE".to_string()),
                email: None,
                name: None,
                bio: None,
                avatar_url: None,
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Duplicate(_))));

    // Updating bob's own profile in place is fine.
    let updated = services
        .accounts
        .update_profile(
            &bob.id,
            UpdateProfileInput {
                username: Some("bob".to_string()),
                email: None,
                name: Some("Bob".to_string()),
                bio: Some("hello".to_string()),
                avatar_url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Bob"));

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_feed_is_newest_first() {
    let (test_db, services) = setup().await;

    let alice = register(&services, "alice").await;

    for n in 1..=3 {
        services
            .posts
            .create(
                &alice.id,
                CreatePostInput {
                    image_url: format!("/media/posts/{n}.jpg"),
                    description: format!("post {n}"),
                },
            )
            .await
            .unwrap();
    }

    let feed = services.posts.list_feed(10, None).await.unwrap();
    let descriptions: Vec<_> = feed.iter().map(|p| p.description.as_str()).collect();
    assert_eq!(descriptions, vec!["post 3", "post 2", "post 1"]);

    test_db.drop_database().await.unwrap();
}
