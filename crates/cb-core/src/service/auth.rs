use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::traits::{AuthProvider, UserRepo};

/// Registration payload. Every field is optional at the wire level so that
/// missing fields surface as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Account registration, sign-in and role checks.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, provider: Arc<dyn AuthProvider>) -> Self {
        Self { users, provider }
    }

    pub async fn signup(&self, input: SignupInput, now: DateTime<Utc>) -> Result<User> {
        let (Some(username), Some(email), Some(password)) = (
            non_blank(input.username),
            non_blank(input.email).map(|e| e.to_lowercase()),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Username, email, and password are required.".to_string(),
            ));
        };

        let role = match non_blank(input.role) {
            Some(role) => role.parse::<Role>()?,
            None => Role::Student,
        };

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered.".to_string()));
        }
        if self.users.find_user_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken.".to_string()));
        }

        let user = User {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash: self.provider.hash_password(&password).await?,
            role,
            created_at: now,
            updated_at: now,
        };
        self.users.create_user(&user).await?;

        info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    /// Checks credentials and returns the user with a fresh access token.
    pub async fn signin(&self, email: &str, password: &str) -> Result<(User, String)> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        if !self.provider.verify_password(password, &user.password_hash).await {
            return Err(AppError::Unauthorized("Wrong credentials!".to_string()));
        }

        let token = self.provider.issue_token(user.id)?;
        Ok((user, token))
    }

    pub async fn current_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    /// Loads the account and insists on the admin role.
    pub async fn require_admin(&self, id: Uuid) -> Result<User> {
        match self.users.get_user(id).await? {
            Some(user) if user.is_admin() => Ok(user),
            _ => Err(AppError::Forbidden("Access denied. Admin only.".to_string())),
        }
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        Ok(self.users.role_exists(Role::Admin).await?)
    }

    /// Resolves an access token to a user id. Invalid tokens resolve to `None`.
    pub fn authenticate(&self, token: &str) -> Option<Uuid> {
        self.provider.verify_token(token)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
