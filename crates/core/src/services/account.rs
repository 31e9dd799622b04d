//! Account service: registration, authentication, profile management.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use snapcircle_common::{AppError, AppResult, IdGenerator, Metrics, get_metrics};
use snapcircle_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 256))]
    pub name: Option<String>,
}

/// Input for updating a user's profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    #[validate(length(max = 1024))]
    pub avatar_url: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Duplicate("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Duplicate("Email already exists".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            password_hash: Set(password_hash),
            name: Set(input.name),
            bio: Set(None),
            avatar_url: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        Metrics::incr(&get_metrics().users_registered);

        Ok(user)
    }

    /// Authenticate a user by username and password.
    ///
    /// An unknown username and a wrong password both come back as
    /// `InvalidCredentials`; the caller cannot tell which it was.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            Metrics::incr(&get_metrics().auth_failures);
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            Metrics::incr(&get_metrics().auth_failures);
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Update a user's profile. Username and email uniqueness is
    /// re-checked, excluding the user themselves.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        if let Some(ref username) = input.username
            && let Some(existing) = self.user_repo.find_by_username(username).await?
            && existing.id != user.id
        {
            return Err(AppError::Duplicate("Username already taken".to_string()));
        }

        if let Some(ref email) = input.email
            && let Some(existing) = self.user_repo.find_by_email(email).await?
            && existing.id != user.id
        {
            return Err(AppError::Duplicate("Email already exists".to_string()));
        }

        let mut active: user::ActiveModel = user.into();

        if let Some(username) = input.username {
            active.username_lower = Set(username.to_lowercase());
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email_lower = Set(email.to_lowercase());
            active.email = Set(email);
        }
        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Change a user's password, verifying the current one first.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 || new_password.len() > 128 {
            return Err(AppError::Validation(
                "Password must be between 8 and 128 characters".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;

        if !verify_password(current_password, &user.password_hash)? {
            Metrics::incr(&get_metrics().auth_failures);
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Search users by username substring, ordered by username. An empty
    /// query matches nobody.
    pub async fn search(
        &self,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.user_repo.search(query, limit, offset).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
