//! HTTP surface of ProjectSync.
//!
//! - LinkedIn OAuth flow under `/auth/linkedin`, token kept in a [`TokenStore`]
//! - LinkedIn and GitHub pass-through routes
//! - Repository to post reconciliation under `/test/*` and `/linkedin/post/missing`

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use github::GitHubProvider;
use linkedin::LinkedInProvider;
use store::{FileTokenStore, TokenStore};
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;

use config::{Config, ConfigError};

pub struct AppState {
    pub linkedin: LinkedInProvider,
    pub github: GitHubProvider,
    pub token_store: Arc<dyn TokenStore>,
    /// Cancelled on shutdown; long-running workflows stop between upstream calls.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Self, ConfigError> {
        let mut token_store = FileTokenStore::new(config.token_path.clone());
        if let Some(encryptor) = config.encryptor()? {
            token_store = token_store.with_encryptor(encryptor);
        }

        Ok(AppState {
            linkedin: LinkedInProvider::new(
                config.linkedin_client_id.clone(),
                config.linkedin_client_secret.clone(),
                config.linkedin_redirect_uri.clone(),
            ),
            github: GitHubProvider::new(
                config.github_username.clone(),
                config.github_token.clone(),
            ),
            token_store: Arc::new(token_store),
            shutdown,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/linkedin", get(handlers::auth_redirect))
        .route("/auth/linkedin/callback", get(handlers::auth_callback))
        .route("/auth/linkedin/logout", get(handlers::auth_logout))
        .route("/linkedin/profile", get(handlers::linkedin_profile))
        .route("/linkedin/post", get(handlers::linkedin_post))
        .route("/linkedin/post/missing", get(handlers::linkedin_post_missing))
        .route("/github/user", get(handlers::github_user))
        .route("/github/repos", get(handlers::github_repos))
        .route("/test/sync", get(handlers::test_sync))
        .route("/test/generate/post", post(handlers::test_generate_post))
        .with_state(state)
}
