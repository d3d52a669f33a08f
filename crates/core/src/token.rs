use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Holds the bearer token obtained from the authorization exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// A token with no known expiry, e.g. one read back from a legacy plaintext file.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Builds a token set from a token endpoint response, turning the relative
    /// `expires_in` (seconds) into an absolute timestamp.
    pub fn from_grant(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in
                .and_then(Duration::try_seconds)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl)),
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(expiration) = &self.expires_at {
            Utc::now() > *expiration
        } else {
            false
        }
    }
}
