//! The local user record.
//!
//! A `User` is created the first time an external identity logs in and is
//! looked up by that external identity on every later login. Profile fields
//! are copied from the provider at creation only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_sync_core::UserId;

use crate::provider::ProviderIdentity;

/// A person known to study-sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local identifier, assigned at creation.
    id: UserId,
    /// Identifier issued by the identity provider. Unique across users.
    external_id: String,
    /// Name shown next to posts and comments.
    display_name: String,
    /// Given name, when the provider reports one.
    first_name: Option<String>,
    /// Avatar URL.
    image: Option<String>,
    /// Email address, when the provider reports one.
    email: Option<String>,
    /// When the record was created.
    created_at: DateTime<Utc>,
}

impl User {
    /// Builds a fresh record from a verified provider identity.
    #[must_use]
    pub fn from_identity(identity: &ProviderIdentity) -> Self {
        Self {
            id: UserId::new(),
            external_id: identity.external_id.clone(),
            display_name: identity.display_name.clone(),
            first_name: identity.first_name.clone(),
            image: identity.image.clone(),
            email: identity.email.clone(),
            created_at: Utc::now(),
        }
    }

    /// Reconstitutes a record from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        external_id: String,
        display_name: String,
        first_name: Option<String>,
        image: Option<String>,
        email: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            external_id,
            display_name,
            first_name,
            image,
            email,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_profile_from_identity() {
        let identity = ProviderIdentity::new("g-123", "Ann")
            .with_first_name(Some("Ann".to_string()))
            .with_image(Some("http://x/a.png".to_string()))
            .with_email(Some("ann@example.com".to_string()));

        let user = User::from_identity(&identity);

        assert_eq!(user.external_id(), "g-123");
        assert_eq!(user.display_name(), "Ann");
        assert_eq!(user.first_name(), Some("Ann"));
        assert_eq!(user.image(), Some("http://x/a.png"));
        assert_eq!(user.email(), Some("ann@example.com"));
        assert!(user.id().to_string().starts_with("usr_"));
    }

    #[test]
    fn each_record_gets_its_own_id() {
        let identity = ProviderIdentity::new("g-123", "Ann");
        assert_ne!(
            User::from_identity(&identity).id(),
            User::from_identity(&identity).id()
        );
    }
}
