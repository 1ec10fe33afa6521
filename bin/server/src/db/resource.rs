//! Postgres storage for shared resources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use study_sync_content::{RepositoryError, Resource, ResourceStore};
use study_sync_core::{ResourceId, Result, UserId};
use tracing::instrument;

use super::{corrupt, database};

/// Row type for resource queries.
#[derive(FromRow)]
struct ResourceRow {
    id: String,
    author_id: String,
    title: String,
    description: String,
    url: String,
    storage_id: String,
    created_at: DateTime<Utc>,
}

impl ResourceRow {
    fn try_into_resource(self) -> std::result::Result<Resource, RepositoryError> {
        let id = ResourceId::from_str(&self.id).map_err(|e| corrupt("resource id", e))?;
        let author =
            UserId::from_str(&self.author_id).map_err(|e| corrupt("resource author", e))?;

        Ok(Resource::with_all_fields(
            id,
            self.title,
            self.description,
            self.url,
            self.storage_id,
            author,
            self.created_at,
        ))
    }
}

fn into_resources(rows: Vec<ResourceRow>) -> std::result::Result<Vec<Resource>, RepositoryError> {
    rows.into_iter().map(ResourceRow::try_into_resource).collect()
}

/// Resources table access.
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn list_all(&self) -> Result<Vec<Resource>, RepositoryError> {
        let rows: Vec<ResourceRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, title, description, url, storage_id, created_at
            FROM resources
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        Ok(into_resources(rows)?)
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Resource>, RepositoryError> {
        let rows: Vec<ResourceRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, title, description, url, storage_id, created_at
            FROM resources
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(author.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        Ok(into_resources(rows)?)
    }

    async fn find(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError> {
        let row: Option<ResourceRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, title, description, url, storage_id, created_at
            FROM resources
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_resource()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, resource), fields(resource_id = %resource.id()))]
    async fn insert(&self, resource: &Resource) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO resources (id, author_id, title, description, url, storage_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(resource.id().to_string())
        .bind(resource.author().to_string())
        .bind(resource.title())
        .bind(resource.description())
        .bind(resource.url())
        .bind(resource.storage_id())
        .bind(resource.created_at())
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(())
    }

    async fn delete(&self, id: ResourceId) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            DELETE FROM resources
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(())
    }
}
