//! Account store contract and its backends.
//!
//! The session service only talks to [`UserRepository`], so the backing
//! store can be PostgreSQL in production and a map in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use crate::auth::{NewUser, UserId, UserRecord};

/// Trait for account store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by email, compared exactly as stored
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Create a new user, assigning its ID
    ///
    /// # Errors
    ///
    /// * `StoreError::DuplicateKey` - Email already taken
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;

    /// Check that the store is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Default PostgreSQL implementation of `UserRepository`
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(r: &PgRow) -> UserRecord {
    UserRecord {
        id: r.get("id"),
        email: r.get("email"),
        username: r.get("username"),
        password_hash: r.get("password_hash"),
        picture_url: r.get("picture_url"),
        created_at: r.get::<DateTime<Utc>, _>("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, picture_url, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, picture_url, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, picture_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, picture_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.picture_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process store keyed by email.
///
/// Check-and-insert happens under one write lock, so concurrent creates with
/// the same email yield exactly one record and `DuplicateKey` for the rest.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserRecord) -> Self {
        self.users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user.email.clone(), user);
        self
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an account, returning it if present
    pub fn remove(&self, user_id: UserId) -> Option<UserRecord> {
        let mut users = self
            .users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let email = users
            .values()
            .find(|u| u.id == user_id)
            .map(|u| u.email.clone())?;
        users.remove(&email)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(users.get(email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(users.values().find(|u| u.id == user_id).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut users = self
            .users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateKey("users_email_key".to_string()));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            picture_url: user.picture_url,
            created_at: Utc::now(),
        };
        users.insert(record.email.clone(), record.clone());
        Ok(record)
    }
}
