//! In-process post, resource and file stores for tests.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};
use study_sync_core::{PostId, ResourceId, Result, UserId};

use crate::error::{RepositoryError, UploadError};
use crate::post::{Comment, Post};
use crate::resource::Resource;
use crate::store::{PostStore, ResourceStore};
use crate::upload::{FileStorage, StoredFile};

#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Post> = posts.iter().filter(|p| keep(p)).cloned().collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        found
    }

    /// Applies `change` to the stored post while holding the write lock.
    fn update(&self, id: PostId, change: impl FnOnce(&mut Post)) -> Option<Post> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        let stored = posts.iter_mut().find(|p| p.id() == id)?;
        change(stored);
        Some(stored.clone())
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list_all(&self) -> Result<Vec<Post>, RepositoryError> {
        Ok(self.newest_first(|_| true))
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepositoryError> {
        Ok(self.newest_first(|p| p.author() == author))
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.iter().find(|p| p.id() == id).cloned())
    }

    async fn insert(&self, post: &Post) -> Result<(), RepositoryError> {
        self.posts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(post.clone());
        Ok(())
    }

    async fn toggle_like(
        &self,
        id: PostId,
        user: UserId,
    ) -> Result<Option<Post>, RepositoryError> {
        Ok(self.update(id, |post| {
            post.toggle_like(user);
        }))
    }

    async fn add_comment(
        &self,
        id: PostId,
        comment: &Comment,
    ) -> Result<Option<Post>, RepositoryError> {
        Ok(self.update(id, |post| {
            post.push_comment(comment.clone());
        }))
    }

    async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        self.posts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p.id() != id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: RwLock<Vec<Resource>>,
}

impl MemoryResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(&self, keep: impl Fn(&Resource) -> bool) -> Vec<Resource> {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Resource> = resources.iter().filter(|r| keep(r)).cloned().collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        found
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list_all(&self) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self.newest_first(|_| true))
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self.newest_first(|r| r.author() == author))
    }

    async fn find(&self, id: ResourceId) -> Result<Option<Resource>, RepositoryError> {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        Ok(resources.iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, resource: &Resource) -> Result<(), RepositoryError> {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resource.clone());
        Ok(())
    }

    async fn delete(&self, id: ResourceId) -> Result<(), RepositoryError> {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| r.id() != id);
        Ok(())
    }
}

/// Keeps uploaded files in memory and hands out `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    files: RwLock<Vec<(StoredFile, String, Vec<u8>)>>,
}

impl MemoryFileStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Original name and bytes of the file stored under `storage_id`.
    #[must_use]
    pub fn contents(&self, storage_id: &str) -> Option<(String, Vec<u8>)> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .iter()
            .find(|(stored, _, _)| stored.storage_id == storage_id)
            .map(|(_, name, bytes)| (name.clone(), bytes.clone()))
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<StoredFile, UploadError> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        let storage_id = format!("study-sync-uploads/{}-{name}", files.len() + 1);
        let stored = StoredFile {
            url: format!("memory://{storage_id}"),
            storage_id,
        };
        files.push((stored.clone(), name.to_string(), bytes));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn post_at(author: UserId, content: &str, minutes_ago: i64) -> Post {
        Post::with_all_fields(
            PostId::new(),
            author,
            content.to_string(),
            Vec::new(),
            Vec::new(),
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[tokio::test]
    async fn posts_are_listed_newest_first() {
        let store = MemoryPostStore::new();
        let ann = UserId::new();
        store.insert(&post_at(ann, "old", 30)).await.expect("insert");
        store.insert(&post_at(ann, "new", 1)).await.expect("insert");
        store.insert(&post_at(UserId::new(), "other", 10)).await.expect("insert");

        let all = store.list_all().await.expect("list");
        assert_eq!(
            all.iter().map(Post::content).collect::<Vec<_>>(),
            vec!["new", "other", "old"]
        );

        let mine = store.list_by_author(ann).await.expect("mine");
        assert_eq!(mine.iter().map(Post::content).collect::<Vec<_>>(), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn interactions_are_applied_to_the_stored_post() {
        let store = MemoryPostStore::new();
        let post = Post::new(UserId::new(), "hello").expect("post");
        store.insert(&post).await.expect("insert");

        let fan = UserId::new();
        let liked = store.toggle_like(post.id(), fan).await.expect("like");
        assert!(liked.expect("present").is_liked_by(fan));
        let comment = Comment::new(fan, "great").expect("comment");
        store.add_comment(post.id(), &comment).await.expect("comment");

        let stored = store.find(post.id()).await.expect("find").expect("present");
        assert!(stored.is_liked_by(fan));
        assert_eq!(stored.comments(), &[comment]);
    }

    #[tokio::test]
    async fn interleaved_likes_and_comments_are_all_kept() {
        let store = MemoryPostStore::new();
        let post = Post::new(UserId::new(), "hello").expect("post");
        store.insert(&post).await.expect("insert");

        let ann = UserId::new();
        let bob = UserId::new();
        let first = Comment::new(ann, "one").expect("comment");
        let second = Comment::new(bob, "two").expect("comment");

        let (a, b, c, d) = tokio::join!(
            store.toggle_like(post.id(), ann),
            store.toggle_like(post.id(), bob),
            store.add_comment(post.id(), &first),
            store.add_comment(post.id(), &second),
        );
        for outcome in [a, b, c, d] {
            assert!(outcome.expect("update").is_some());
        }

        let stored = store.find(post.id()).await.expect("find").expect("present");
        assert_eq!(stored.likes(), &[ann, bob]);
        assert_eq!(stored.comments(), &[first, second]);
    }

    #[tokio::test]
    async fn interactions_on_missing_posts_find_nothing() {
        let store = MemoryPostStore::new();
        let id = PostId::new();
        assert!(store.toggle_like(id, UserId::new()).await.expect("like").is_none());
        let comment = Comment::new(UserId::new(), "hi").expect("comment");
        assert!(store.add_comment(id, &comment).await.expect("comment").is_none());
    }

    #[tokio::test]
    async fn deleted_resources_disappear() {
        let store = MemoryResourceStore::new();
        let resource = Resource::new(
            UserId::new(),
            crate::resource::NewResource {
                title: "t".into(),
                description: "d".into(),
                url: "u".into(),
                storage_id: "s".into(),
            },
        )
        .expect("resource");
        store.insert(&resource).await.expect("insert");
        assert!(store.find(resource.id()).await.expect("find").is_some());

        store.delete(resource.id()).await.expect("delete");
        assert!(store.find(resource.id()).await.expect("find").is_none());
        assert!(store.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn uploads_get_distinct_ids() {
        let storage = MemoryFileStorage::new();
        let first = storage.upload("notes.pdf", b"%PDF".to_vec()).await.expect("upload");
        let second = storage.upload("notes.pdf", b"%PDF-2".to_vec()).await.expect("upload");

        assert_ne!(first.storage_id, second.storage_id);
        assert!(first.url.starts_with("memory://"));
        assert_eq!(
            storage.contents(&second.storage_id),
            Some(("notes.pdf".to_string(), b"%PDF-2".to_vec()))
        );
    }
}
