//! JSON shapes exchanged with the browser.
//!
//! Views embed a short profile of each referenced user instead of a bare
//! id. Both the server and the client use these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use study_sync_core::{CommentId, PostId, ResourceId, UserId};

use crate::post::{Comment, Post};
use crate::resource::Resource;

/// Name shown for users whose record cannot be found.
pub const UNKNOWN_AUTHOR: &str = "Unknown user";

/// The public face of a user next to their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl AuthorSummary {
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            image,
        }
    }

    /// Placeholder for a user that no longer resolves.
    #[must_use]
    pub fn unknown(id: UserId) -> Self {
        Self::new(id, UNKNOWN_AUTHOR, None)
    }
}

/// Author profiles by user id.
pub type AuthorDirectory = HashMap<UserId, AuthorSummary>;

fn author_of(authors: &AuthorDirectory, id: UserId) -> AuthorSummary {
    authors
        .get(&id)
        .cloned()
        .unwrap_or_else(|| AuthorSummary::unknown(id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub text: String,
    pub author: AuthorSummary,
    pub timestamp: DateTime<Utc>,
}

impl CommentView {
    #[must_use]
    pub fn render(comment: &Comment, authors: &AuthorDirectory) -> Self {
        Self {
            id: comment.id,
            text: comment.text.clone(),
            author: author_of(authors, comment.author),
            timestamp: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: PostId,
    pub content: String,
    pub author: AuthorSummary,
    pub likes: Vec<UserId>,
    pub comments: Vec<CommentView>,
    pub timestamp: DateTime<Utc>,
}

impl PostView {
    #[must_use]
    pub fn render(post: &Post, authors: &AuthorDirectory) -> Self {
        Self {
            id: post.id(),
            content: post.content().to_string(),
            author: author_of(authors, post.author()),
            likes: post.likes().to_vec(),
            comments: post
                .comments()
                .iter()
                .map(|c| CommentView::render(c, authors))
                .collect(),
            timestamp: post.created_at(),
        }
    }

    /// Whether `user` is among the likers.
    #[must_use]
    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.contains(&user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub id: ResourceId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub storage_id: String,
    pub author: AuthorSummary,
    pub timestamp: DateTime<Utc>,
}

impl ResourceView {
    #[must_use]
    pub fn render(resource: &Resource, authors: &AuthorDirectory) -> Self {
        Self {
            id: resource.id(),
            title: resource.title().to_string(),
            description: resource.description().to_string(),
            url: resource.url().to_string(),
            storage_id: resource.storage_id().to_string(),
            author: author_of(authors, resource.author()),
            timestamp: resource.created_at(),
        }
    }
}

/// Body of `POST /api/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub content: String,
}

/// Body of `POST /api/posts/{id}/comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub text: String,
}
