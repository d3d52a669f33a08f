use std::path::PathBuf;

use core_lib::encryption::{CryptoError, Encryptor};
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/linkedin/callback";
const DEFAULT_TOKEN_PATH: &str = "linkedin_token.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("TOKEN_ENCRYPTION_KEY: {source}")]
    EncryptionKey {
        #[source]
        source: CryptoError,
    },
}

/// Process settings, read from the environment (and `.env` when present).
#[derive(Clone)]
pub struct Config {
    pub linkedin_client_id: String,
    pub linkedin_client_secret: String,
    pub linkedin_redirect_uri: String,
    pub github_username: String,
    pub github_token: String,
    pub port: u16,
    pub token_path: PathBuf,
    pub token_encryption_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("linkedin_client_id", &self.linkedin_client_id)
            .field("linkedin_client_secret", &"<redacted>")
            .field("linkedin_redirect_uri", &self.linkedin_redirect_uri)
            .field("github_username", &self.github_username)
            .field("github_token", &"<redacted>")
            .field("port", &self.port)
            .field("token_path", &self.token_path)
            .field(
                "token_encryption_key",
                &self.token_encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            linkedin_client_id: require("LINKEDIN_CLIENT_ID")?,
            linkedin_client_secret: require("LINKEDIN_CLIENT_SECRET")?,
            linkedin_redirect_uri: get("LINKEDIN_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            github_username: require("GITHUB_USERNAME")?,
            github_token: require("GITHUB_PERSONAL_ACCESS_TOKEN")?,
            port,
            token_path: get("LINKEDIN_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            token_encryption_key: get("TOKEN_ENCRYPTION_KEY"),
        })
    }

    pub fn encryptor(&self) -> Result<Option<Encryptor>, ConfigError> {
        self.token_encryption_key
            .as_deref()
            .map(Encryptor::from_base64_key)
            .transpose()
            .map_err(|source| ConfigError::EncryptionKey { source })
    }
}
