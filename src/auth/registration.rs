//! User registration for filevault.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::hash_password;
use crate::db::{NewUser, User, UserRepository};
use crate::{Result, VaultError};

/// Validate that a username contains only ASCII letters, digits and underscores.
pub fn username_chars(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(validator::ValidationError::new("username_chars")
            .with_message("Only letters, digits and underscores are allowed".into()));
    }
    Ok(())
}

/// Validate that a string does not contain control characters.
pub fn no_control_chars(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Registration request data.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// Desired username.
    #[validate(
        length(min = 3, max = 50, message = "Must be 3 to 50 characters"),
        custom(function = "username_chars")
    )]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// Plain-text password; hashed before it is stored.
    #[validate(length(min = 8, max = 128, message = "Must be 8 to 128 characters"))]
    pub password: String,
    /// Full display name.
    #[validate(
        length(min = 1, max = 100, message = "Must be 1 to 100 characters"),
        custom(function = "no_control_chars")
    )]
    pub fullname: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        fullname: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            fullname: fullname.into(),
        }
    }
}

/// Register a new user.
///
/// Validates the request, rejects a taken username or email
/// (case-insensitive), hashes the password and stores the account.
pub async fn register(pool: &SqlitePool, request: RegistrationRequest) -> Result<User> {
    request.validate()?;

    let repo = UserRepository::new(pool);

    if repo.username_exists(&request.username).await? {
        warn!(username = %request.username, "Registration rejected: username taken");
        return Err(VaultError::Validation(
            "username: Username already exists".to_string(),
        ));
    }
    if repo.email_exists(&request.email).await? {
        warn!(username = %request.username, "Registration rejected: email taken");
        return Err(VaultError::Validation(
            "email: Email already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;

    let new_user = NewUser::new(&request.username, &request.email, password_hash)
        .with_fullname(request.fullname.trim());
    let user = repo.create(&new_user).await?;

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}
