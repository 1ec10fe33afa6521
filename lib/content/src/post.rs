//! Text posts with likes and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_sync_core::{CommentId, PostId, UserId};

use crate::error::ContentError;

/// A comment left on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Drafts a comment by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyComment`] if `text` is blank.
    pub fn new(author: UserId, text: impl Into<String>) -> Result<Self, ContentError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ContentError::EmptyComment);
        }
        Ok(Self {
            id: CommentId::new(),
            text,
            author,
            created_at: Utc::now(),
        })
    }
}

/// A text post in the shared feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    id: PostId,
    author: UserId,
    content: String,
    /// Users who like the post, in the order they liked it. No duplicates.
    likes: Vec<UserId>,
    comments: Vec<Comment>,
    created_at: DateTime<Utc>,
}

impl Post {
    /// Drafts a new post by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyPost`] if `content` is blank.
    pub fn new(author: UserId, content: impl Into<String>) -> Result<Self, ContentError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ContentError::EmptyPost);
        }
        Ok(Self {
            id: PostId::new(),
            author,
            content,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Reconstitutes a post from storage.
    #[must_use]
    pub fn with_all_fields(
        id: PostId,
        author: UserId,
        content: String,
        likes: Vec<UserId>,
        comments: Vec<Comment>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author,
            content,
            likes,
            comments,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> PostId {
        self.id
    }

    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn likes(&self) -> &[UserId] {
        &self.likes
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author == user
    }

    #[must_use]
    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.contains(&user)
    }

    /// Likes the post for `user`, or takes the like back if there was one.
    /// Returns whether the post is now liked by `user`.
    pub fn toggle_like(&mut self, user: UserId) -> bool {
        if let Some(pos) = self.likes.iter().position(|u| *u == user) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user);
            true
        }
    }

    /// Appends a comment by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyComment`] if `text` is blank.
    pub fn add_comment(
        &mut self,
        author: UserId,
        text: impl Into<String>,
    ) -> Result<&Comment, ContentError> {
        let comment = Comment::new(author, text)?;
        Ok(self.push_comment(comment))
    }

    /// Appends an already validated comment.
    pub fn push_comment(&mut self, comment: Comment) -> &Comment {
        self.comments.push(comment);
        &self.comments[self.comments.len() - 1]
    }

    /// Checks that `user` may delete this post.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotOwner`] for anyone but the author.
    pub fn ensure_deletable_by(&self, user: UserId) -> Result<(), ContentError> {
        if self.is_authored_by(user) {
            Ok(())
        } else {
            Err(ContentError::NotOwner)
        }
    }

    /// Users whose profile is shown with the post: the author and every
    /// commenter.
    #[must_use]
    pub fn referenced_users(&self) -> Vec<UserId> {
        let mut ids = vec![self.author];
        ids.extend(self.comments.iter().map(|c| c.author));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_posts_are_refused() {
        assert_eq!(Post::new(UserId::new(), "   ").unwrap_err(), ContentError::EmptyPost);
        assert!(Post::new(UserId::new(), "Studying graphs tonight").is_ok());
    }

    #[test]
    fn like_toggles_per_user() {
        let mut post = Post::new(UserId::new(), "hello").expect("post");
        let ann = UserId::new();
        let bob = UserId::new();

        assert!(post.toggle_like(ann));
        assert!(post.toggle_like(bob));
        assert_eq!(post.likes(), &[ann, bob]);

        assert!(!post.toggle_like(ann));
        assert_eq!(post.likes(), &[bob]);
        assert!(!post.is_liked_by(ann));
        assert!(post.is_liked_by(bob));
    }

    #[test]
    fn comments_are_appended_in_order() {
        let mut post = Post::new(UserId::new(), "hello").expect("post");
        let ann = UserId::new();

        post.add_comment(ann, "first").expect("first");
        post.add_comment(ann, "second").expect("second");
        assert_eq!(
            post.comments().iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        assert_eq!(post.add_comment(ann, "").unwrap_err(), ContentError::EmptyComment);
        assert_eq!(post.comments().len(), 2);
    }

    #[test]
    fn blank_comments_cannot_be_drafted() {
        assert_eq!(
            Comment::new(UserId::new(), " \n").unwrap_err(),
            ContentError::EmptyComment
        );
        let comment = Comment::new(UserId::new(), "see chapter 4").expect("comment");
        assert_eq!(comment.text, "see chapter 4");
    }

    #[test]
    fn only_the_author_may_delete() {
        let author = UserId::new();
        let post = Post::new(author, "mine").expect("post");
        assert!(post.ensure_deletable_by(author).is_ok());
        assert_eq!(post.ensure_deletable_by(UserId::new()), Err(ContentError::NotOwner));
    }

    #[test]
    fn referenced_users_include_commenters() {
        let author = UserId::new();
        let commenter = UserId::new();
        let mut post = Post::new(author, "hello").expect("post");
        post.add_comment(commenter, "nice").expect("comment");
        assert_eq!(post.referenced_users(), vec![author, commenter]);
    }
}
