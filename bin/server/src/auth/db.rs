//! Postgres-backed user directory and session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use study_sync_core::{Result, UserId};
use study_sync_platform_access::{
    ProviderIdentity, Session, SessionId, SessionStore, StoreError, User, UserDirectory,
};
use tracing::instrument;

fn database(e: sqlx::Error) -> StoreError {
    StoreError::Database {
        details: e.to_string(),
    }
}

fn parse_user_id(raw: &str) -> std::result::Result<UserId, StoreError> {
    UserId::from_str(raw).map_err(|e| StoreError::Corrupt {
        details: format!("invalid user id '{raw}': {e}"),
    })
}

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    external_id: String,
    display_name: String,
    first_name: Option<String>,
    image: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> std::result::Result<User, StoreError> {
        Ok(User::with_all_fields(
            parse_user_id(&self.id)?,
            self.external_id,
            self.display_name,
            self.first_name,
            self.image,
            self.email,
            self.created_at,
        ))
    }
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> std::result::Result<Session, StoreError> {
        Ok(Session::with_all_fields(
            SessionId::new(self.id),
            parse_user_id(&self.user_id)?,
            self.created_at,
            self.expires_at,
        ))
    }
}

/// Users table access.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    /// Insert-or-fetch in one statement. The no-op update on conflict makes
    /// `RETURNING` yield the existing row, profile untouched.
    #[instrument(skip(self, identity), fields(external_id = %identity.external_id))]
    async fn resolve_or_create(&self, identity: &ProviderIdentity) -> Result<User, StoreError> {
        let candidate = User::from_identity(identity);
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, external_id, display_name, first_name, image, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (external_id) DO UPDATE SET external_id = EXCLUDED.external_id
            RETURNING id, external_id, display_name, first_name, image, email, created_at
            "#,
        )
        .bind(candidate.id().to_string())
        .bind(candidate.external_id())
        .bind(candidate.display_name())
        .bind(candidate.first_name())
        .bind(candidate.image())
        .bind(candidate.email())
        .bind(candidate.created_at())
        .fetch_one(&self.pool)
        .await
        .map_err(database)?;

        Ok(row.try_into_user()?)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, display_name, first_name, image, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, display_name, first_name, image, email, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        let users = rows
            .into_iter()
            .map(UserRow::try_into_user)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

/// Sessions table access.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.user_id().to_string())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_session()?)),
            None => Ok(None),
        }
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(result.rows_affected())
    }
}
