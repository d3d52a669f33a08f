use thiserror::Error;
use token::TokenSet;

pub mod encryption;
pub mod sync;
pub mod token;

/// Represents an error that can occur while talking to an upstream API or
/// handling the credentials used for it.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("upstream rejected the credentials")]
    InvalidCredentials,
    #[error("no authorization code received")]
    MissingAuthorizationCode,
    #[error("no access token stored")]
    MissingToken,
    #[error("stored access token has expired")]
    TokenExpired,
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("rate limited by upstream: {0}")]
    RateLimited(String),
    #[error("token storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Classifies a non-2xx upstream response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        match status {
            401 => AuthError::InvalidCredentials,
            429 => AuthError::RateLimited(snippet),
            _ => AuthError::ProviderError(format!("{status}: {snippet}")),
        }
    }

    /// Whether the caller has to go through the authorization flow again.
    pub fn needs_authorization(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::TokenExpired | AuthError::InvalidCredentials
        )
    }
}

/// Represents basic user information fetched from the OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
}

/// Defines the behavior that any OAuth provider must implement.
#[async_trait::async_trait]
pub trait OAuthProvider {
    /// Returns the URL to initiate the OAuth authorization flow.
    fn auth_url(&self) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError>;

    /// Fetches user information using the access token.
    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, AuthError>;
}
