use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short user-authored post. The body is stored already masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

/// A registered account as persisted in the store.
///
/// `password_hash` is a PHC-format Argon2 string; the plaintext password never
/// reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_upgraded: bool,
}

impl User {
    /// True if the user holds a refresh token that has not yet expired.
    pub fn has_live_refresh_token(&self, now: DateTime<Utc>) -> bool {
        match (&self.refresh_token, self.refresh_token_expiry) {
            (Some(_), Some(expiry)) => expiry > now,
            _ => false,
        }
    }
}
