//! Shared study resources.
//!
//! The file itself lives in external storage; a resource records the
//! durable URL and storage identifier returned by the upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_sync_core::{ResourceId, UserId};

use crate::error::ContentError;

/// Client-supplied fields for a new resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Identifier assigned by the storage service.
    #[serde(default, alias = "cloudinaryId")]
    pub storage_id: String,
}

impl NewResource {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("url", &self.url),
            ("storageId", &self.storage_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A file shared with everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    title: String,
    description: String,
    url: String,
    storage_id: String,
    author: UserId,
    created_at: DateTime<Utc>,
}

impl Resource {
    /// Creates a resource owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MissingResourceFields`] if any field is blank.
    pub fn new(author: UserId, fields: NewResource) -> Result<Self, ContentError> {
        let missing = fields.missing_fields();
        if !missing.is_empty() {
            return Err(ContentError::MissingResourceFields { missing });
        }
        Ok(Self {
            id: ResourceId::new(),
            title: fields.title,
            description: fields.description,
            url: fields.url,
            storage_id: fields.storage_id,
            author,
            created_at: Utc::now(),
        })
    }

    /// Reconstitutes a resource from storage.
    #[must_use]
    pub fn with_all_fields(
        id: ResourceId,
        title: String,
        description: String,
        url: String,
        storage_id: String,
        author: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            url,
            storage_id,
            author,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn storage_id(&self) -> &str {
        &self.storage_id
    }

    #[must_use]
    pub fn author(&self) -> UserId {
        self.author
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks that `user` may delete this resource.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotOwner`] for anyone but the author.
    pub fn ensure_deletable_by(&self, user: UserId) -> Result<(), ContentError> {
        if self.author == user {
            Ok(())
        } else {
            Err(ContentError::NotOwner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> NewResource {
        NewResource {
            title: "Linear algebra notes".into(),
            description: "Week 3".into(),
            url: "https://files.example.com/la.pdf".into(),
            storage_id: "study/la".into(),
        }
    }

    #[test]
    fn complete_fields_create_a_resource() {
        let author = UserId::new();
        let resource = Resource::new(author, fields()).expect("resource");
        assert_eq!(resource.author(), author);
        assert_eq!(resource.storage_id(), "study/la");
    }

    #[test]
    fn blank_fields_are_reported() {
        let mut incomplete = fields();
        incomplete.title = " ".into();
        incomplete.storage_id.clear();

        let err = Resource::new(UserId::new(), incomplete).unwrap_err();
        assert_eq!(
            err,
            ContentError::MissingResourceFields {
                missing: vec!["title", "storageId"]
            }
        );
        assert_eq!(err.client_message(), "Missing required fields for resource.");
    }

    #[test]
    fn accepts_the_legacy_storage_field_name() {
        let parsed: NewResource = serde_json::from_str(
            r#"{"title":"t","description":"d","url":"u","cloudinaryId":"c"}"#,
        )
        .expect("parse");
        assert_eq!(parsed.storage_id, "c");
        assert!(parsed.missing_fields().is_empty());
    }

    #[test]
    fn only_the_author_may_delete() {
        let author = UserId::new();
        let resource = Resource::new(author, fields()).expect("resource");
        assert!(resource.ensure_deletable_by(author).is_ok());
        assert_eq!(resource.ensure_deletable_by(UserId::new()), Err(ContentError::NotOwner));
    }
}
