//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Complaint, Role, User};

/// Data persistence contract for complaints.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ComplaintRepo: Send + Sync {
    async fn insert_complaint(&self, complaint: &Complaint) -> anyhow::Result<()>;
    async fn get_complaint(&self, id: Uuid) -> anyhow::Result<Option<Complaint>>;
    async fn list_complaints(&self) -> anyhow::Result<Vec<Complaint>>;
    /// Complaints signed by `user_id`, newest first.
    async fn list_complaints_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Complaint>>;

    /// Overwrites status, admin response, update log and `updated_at`.
    async fn save_complaint(&self, complaint: &Complaint) -> anyhow::Result<()>;

    /// Stores a recomputed priority score and nothing else.
    async fn update_priority_score(&self, id: Uuid, score: i64) -> anyhow::Result<()>;

    /// Returns `false` when no complaint had that id.
    async fn delete_complaint(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Account persistence contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with [`AppError::Conflict`](crate::AppError::Conflict) when the
    /// email or username is already taken.
    async fn create_user(&self, user: &User) -> anyhow::Result<()>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn role_exists(&self, role: Role) -> anyhow::Result<bool>;
}

/// Credential handling contract: password hashing and session tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a self-describing hash (PHC string) for storage.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed access token for the user.
    fn issue_token(&self, user_id: Uuid) -> anyhow::Result<String>;

    /// Returns the user id carried by a valid, unexpired token.
    fn verify_token(&self, token: &str) -> Option<Uuid>;
}
