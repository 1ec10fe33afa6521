//! The identity payload handed to the browser.
//!
//! After a successful provider login the server redirects to the client with
//! this payload, JSON-encoded, in the `user` query parameter. The client
//! persists the same JSON in local storage. A session probe against
//! `/auth/user` yields the same shape without a token.

use crate::id::UserId;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the delivered identity on the post-login redirect.
pub const USER_QUERY_PARAM: &str = "user";

/// Public profile plus (optionally) the bearer credential of the signed-in user.
///
/// The browser only echoes `id` back, so it stays opaque here; use
/// [`DeliveredIdentity::user_id`] where it must be compared with content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredIdentity {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl DeliveredIdentity {
    /// Parses the JSON form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Renders the JSON form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The id as a [`UserId`], when it is one.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.id.parse().ok()
    }

    /// The bearer credential, if this identity carries one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_camel_case_field_names() {
        let identity = DeliveredIdentity {
            id: UserId::new().to_string(),
            display_name: "Ann".to_string(),
            email: None,
            image: Some("http://x/a.png".to_string()),
            token: Some("tok".to_string()),
        };
        let json = identity.to_json();
        assert!(json.contains("\"displayName\":\"Ann\""));
        assert!(json.contains("\"token\":\"tok\""));
        assert_eq!(DeliveredIdentity::from_json(&json).expect("parse"), identity);
    }

    #[test]
    fn tolerates_extra_and_missing_fields() {
        let id = UserId::new();
        let raw = format!(r#"{{"id":"{id}","_id":"{id}","displayName":"Ann","firstName":"A"}}"#);
        let identity = DeliveredIdentity::from_json(&raw).expect("parse");
        assert_eq!(identity.user_id(), Some(id));
        assert!(identity.token().is_none());
        assert!(identity.image.is_none());
    }

    #[test]
    fn keeps_ids_that_are_not_local_user_ids() {
        let identity =
            DeliveredIdentity::from_json(r#"{"id":"1","displayName":"Test User"}"#).expect("parse");
        assert_eq!(identity.id, "1");
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn rejects_payload_without_id() {
        assert!(DeliveredIdentity::from_json(r#"{"displayName":"Ann"}"#).is_err());
    }
}
