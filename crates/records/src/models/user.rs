//! WePay user.

use std::fmt;

use serde::{Deserialize, Serialize};
use wepay_records_core::{UserId, UserState};

use super::wepay_entity;
use crate::schema::USER;

/// A WePay user and the OAuth token issued for it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// OAuth access token. Never logged.
    pub access_token: String,
    pub user_name: String,
    pub email: String,
    pub state: UserState,
    /// Token expiry as a Unix timestamp, if the token expires.
    pub expires: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
}

wepay_entity!(User, USER, user_id);

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("state", &self.state)
            .field("expires", &self.expires)
            .field("deleted", &self.deleted)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::Entity;

    fn user() -> User {
        serde_json::from_value(json!({
            "user_id": 12,
            "access_token": "STAGE_secret",
            "user_name": "Ada Lovelace",
            "email": "ada@example.com",
            "state": "registered"
        }))
        .unwrap()
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let debug = format!("{:?}", user());
        assert!(!debug.contains("STAGE_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_defaults() {
        let user = user();
        assert_eq!(user.expires, None);
        assert!(!user.is_deleted());
        assert_eq!(user.pk(), Some(12));
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let result: Result<User, _> = serde_json::from_value(json!({
            "user_id": 12,
            "access_token": "t",
            "user_name": "Ada",
            "email": "ada@example.com",
            "state": "suspended"
        }));
        assert!(result.is_err());
    }
}
