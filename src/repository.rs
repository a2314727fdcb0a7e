use crate::{
    auth::{Role, UnknownRole},
    models::User,
    sequence::{SequenceError, SequenceStore},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// UserRepository
///
/// Persistence contract for accounts. Handlers only see this trait, so the
/// Postgres implementation and the in-memory one are interchangeable.
///
/// **Send + Sync + async_trait** let the trait object (`Arc<dyn UserRepository>`)
/// cross Axum's task boundaries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    /// Fails with `UsernameTaken` if the username is already registered.
    async fn create_user(&self, user: User) -> Result<(), RepositoryError>;
    /// All accounts ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
}

pub type UserRepositoryState = Arc<dyn UserRepository>;

// --- In-Memory Implementation ---

/// InMemoryUserRepository
///
/// Used when no database is configured and throughout the tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(username).cloned())
    }

    async fn create_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(RepositoryError::UsernameTaken);
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}

// --- Postgres Implementation ---

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sequences (
        namespace TEXT PRIMARY KEY,
        value     BIGINT NOT NULL CHECK (value >= 0)
    )
    "#,
];

#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: UnknownRole| RepositoryError::InvalidRecord(e.to_string()))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
        })
    }
}

/// PostgresRepository
///
/// Backs both the account store and the sequence counters with one pool.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the `users` and `sequences` tables when they do not exist yet.
    /// Safe to run on every startup.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepositoryError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[async_trait]
impl SequenceStore for PostgresRepository {
    /// next_value
    ///
    /// A single upsert: Postgres row-locks the namespace for the duration of
    /// the statement, which makes create-at-0-then-increment and the plain
    /// increment both atomic.
    async fn next_value(&self, namespace: &str) -> Result<i64, SequenceError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sequences (namespace, value) VALUES ($1, 1)
            ON CONFLICT (namespace) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(namespace)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SequenceError::WriteFailure {
            namespace: namespace.to_string(),
            source: Box::new(e),
        })
    }
}
