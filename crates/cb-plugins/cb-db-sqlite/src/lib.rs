//! # cb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cb-core` domain models. The complaint update log is kept as a JSON
//! column next to the complaint it belongs to.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use cb_core::models::{Category, Complaint, Role, Status, Urgency, User};
use cb_core::traits::{ComplaintRepo, UserRepo};
use cb_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).context("malformed uuid blob")
}

impl SqliteStore {
    /// Connects with a default pool size and applies pending migrations.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Connects and applies pending migrations.
    ///
    /// In-memory databases live and die with their connection, so those pools
    /// are pinned to a single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to open sqlite database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        info!(in_memory, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn complaint_from_row(row: &SqliteRow) -> anyhow::Result<Complaint> {
    let user_id = row
        .try_get::<Option<Vec<u8>>, _>("user_id")?
        .map(|blob| blob_to_uuid(&blob))
        .transpose()?;

    Ok(Complaint {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: Category::from_label(row.try_get::<&str, _>("category")?),
        urgency: Urgency::from_label(row.try_get::<&str, _>("urgency")?),
        status: row.try_get::<&str, _>("status")?.parse::<Status>()?,
        is_anonymous: row.try_get("is_anonymous")?,
        user_id,
        admin_response: row.try_get("admin_response")?,
        updates: serde_json::from_str(row.try_get::<&str, _>("updates")?)
            .context("malformed update log")?,
        priority_score: row.try_get("priority_score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get::<&str, _>("role")?.parse::<Role>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ComplaintRepo for SqliteStore {
    async fn insert_complaint(&self, complaint: &Complaint) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO complaints (id, title, description, category, urgency, status, is_anonymous, user_id, admin_response, updates, priority_score, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(complaint.id))
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.category.as_str())
        .bind(complaint.urgency.as_str())
        .bind(complaint.status.as_str())
        .bind(complaint.is_anonymous)
        .bind(complaint.user_id.map(uuid_to_blob))
        .bind(&complaint.admin_response)
        .bind(serde_json::to_string(&complaint.updates)?)
        .bind(complaint.priority_score)
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_complaint(&self, id: Uuid) -> anyhow::Result<Option<Complaint>> {
        let row = sqlx::query("SELECT * FROM complaints WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(complaint_from_row).transpose()
    }

    async fn list_complaints(&self) -> anyhow::Result<Vec<Complaint>> {
        sqlx::query("SELECT * FROM complaints ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(complaint_from_row)
            .collect()
    }

    async fn list_complaints_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Complaint>> {
        sqlx::query("SELECT * FROM complaints WHERE user_id = ? ORDER BY created_at DESC, id DESC")
            .bind(uuid_to_blob(user_id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(complaint_from_row)
            .collect()
    }

    async fn save_complaint(&self, complaint: &Complaint) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE complaints SET status = ?, admin_response = ?, updates = ?, updated_at = ? WHERE id = ?",
        )
        .bind(complaint.status.as_str())
        .bind(&complaint.admin_response)
        .bind(serde_json::to_string(&complaint.updates)?)
        .bind(complaint.updated_at)
        .bind(uuid_to_blob(complaint.id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_priority_score(&self, id: Uuid, score: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE complaints SET priority_score = ? WHERE id = ?")
            .bind(score)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_complaint(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM complaints WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            // A concurrent signup can slip past the service's lookups.
            sqlx::Error::Database(db) if db.is_unique_violation() => anyhow::Error::new(
                AppError::Conflict("Email or username is already taken.".to_string()),
            ),
            other => other.into(),
        })?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn role_exists(&self, role: Role) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE role = ?) AS found")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<bool, _>("found")?)
    }
}
