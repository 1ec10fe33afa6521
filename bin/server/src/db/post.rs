//! Postgres storage for posts.
//!
//! Likes and comments are JSONB arrays on the post row. Both are changed by
//! single `UPDATE` statements so concurrent writers never overwrite each
//! other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use study_sync_content::{Comment, Post, PostStore, RepositoryError};
use study_sync_core::{PostId, Result, UserId};
use tracing::instrument;

use super::{corrupt, database};

/// Row type for post queries.
#[derive(FromRow)]
struct PostRow {
    id: String,
    author_id: String,
    content: String,
    likes: serde_json::Value,
    comments: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl PostRow {
    fn try_into_post(self) -> std::result::Result<Post, RepositoryError> {
        let id = PostId::from_str(&self.id).map_err(|e| corrupt("post id", e))?;
        let author = UserId::from_str(&self.author_id).map_err(|e| corrupt("post author", e))?;
        let likes: Vec<UserId> =
            serde_json::from_value(self.likes).map_err(|e| corrupt("post likes", e))?;
        let comments: Vec<Comment> =
            serde_json::from_value(self.comments).map_err(|e| corrupt("post comments", e))?;

        Ok(Post::with_all_fields(
            id,
            author,
            self.content,
            likes,
            comments,
            self.created_at,
        ))
    }
}

fn interactions(
    post: &Post,
) -> std::result::Result<(serde_json::Value, serde_json::Value), RepositoryError> {
    let likes = serde_json::to_value(post.likes()).map_err(|e| corrupt("post likes", e))?;
    let comments =
        serde_json::to_value(post.comments()).map_err(|e| corrupt("post comments", e))?;
    Ok((likes, comments))
}

fn into_posts(rows: Vec<PostRow>) -> std::result::Result<Vec<Post>, RepositoryError> {
    rows.into_iter().map(PostRow::try_into_post).collect()
}

/// Posts table access.
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list_all(&self) -> Result<Vec<Post>, RepositoryError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, likes, comments, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        Ok(into_posts(rows)?)
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepositoryError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, likes, comments, created_at
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(author.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        Ok(into_posts(rows)?)
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, likes, comments, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_post()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn insert(&self, post: &Post) -> Result<(), RepositoryError> {
        let (likes, comments) = interactions(post)?;
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, content, likes, comments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id().to_string())
        .bind(post.author().to_string())
        .bind(post.content())
        .bind(likes)
        .bind(comments)
        .bind(post.created_at())
        .execute(&self.pool)
        .await
        .map_err(database)?;

        Ok(())
    }

    #[instrument(skip(self), fields(post_id = %id, user_id = %user))]
    async fn toggle_like(
        &self,
        id: PostId,
        user: UserId,
    ) -> Result<Option<Post>, RepositoryError> {
        let liker = serde_json::json!([user.to_string()]);
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            UPDATE posts
            SET likes = CASE
                WHEN likes @> $2 THEN likes - $3
                ELSE likes || $2
            END
            WHERE id = $1
            RETURNING id, author_id, content, likes, comments, created_at
            "#,
        )
        .bind(id.to_string())
        .bind(liker)
        .bind(user.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_post()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, comment), fields(post_id = %id, comment_id = %comment.id))]
    async fn add_comment(
        &self,
        id: PostId,
        comment: &Comment,
    ) -> Result<Option<Post>, RepositoryError> {
        let appended = serde_json::to_value([comment]).map_err(|e| corrupt("post comment", e))?;
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            UPDATE posts
            SET comments = comments || $2
            WHERE id = $1
            RETURNING id, author_id, content, likes, comments, created_at
            "#,
        )
        .bind(id.to_string())
        .bind(appended)
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        match row {
            Some(r) => Ok(Some(r.try_into_post()?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            DELETE FROM posts
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
