//! Storage seams for posts and resources.

use async_trait::async_trait;
use study_sync_core::{PostId, ResourceId, Result, UserId};

use crate::error::RepositoryError;
use crate::post::{Comment, Post};
use crate::resource::Resource;

/// Post storage. Listings are newest first.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Post>, RepositoryError>;

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepositoryError>;

    async fn find(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    async fn insert(&self, post: &Post) -> Result<(), RepositoryError>;

    /// Likes the post for `user`, or takes the like back, in one atomic
    /// step. Returns the updated post, or `None` if there is no such post.
    async fn toggle_like(&self, id: PostId, user: UserId)
    -> Result<Option<Post>, RepositoryError>;

    /// Appends `comment` in one atomic step. Returns the updated post, or
    /// `None` if there is no such post.
    async fn add_comment(
        &self,
        id: PostId,
        comment: &Comment,
    ) -> Result<Option<Post>, RepositoryError>;

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError>;
}

/// Resource storage. Listings are newest first.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Resource>, RepositoryError>;

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Resource>, RepositoryError>;

    async fn find(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError>;

    async fn insert(&self, resource: &Resource) -> Result<(), RepositoryError>;

    async fn delete(&self, id: ResourceId) -> Result<(), RepositoryError>;
}
