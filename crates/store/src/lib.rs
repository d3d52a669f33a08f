use std::path::{Path, PathBuf};

use core_lib::{encryption::Encryptor, token::TokenSet, AuthError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Holds the single access token the server acts with.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<TokenSet>, AuthError>;
    async fn set(&self, token_set: &TokenSet) -> Result<(), AuthError>;
    async fn clear(&self) -> Result<(), AuthError>;
}

/// Looks up the stored token, treating an absent or expired one as an error.
pub async fn require_token(store: &dyn TokenStore) -> Result<TokenSet, AuthError> {
    let token_set = store.get().await?.ok_or(AuthError::MissingToken)?;
    if token_set.is_expired() {
        return Err(AuthError::TokenExpired);
    }
    Ok(token_set)
}

/// Keeps the token in a single file, overwritten on every `set`.
///
/// The file holds the serialized `TokenSet`. With an encryptor configured the
/// token strings are sealed before they are written. A file that is not JSON is
/// read as a bare bearer token, which is what older versions wrote.
pub struct FileTokenStore {
    path: PathBuf,
    encryptor: Option<Encryptor>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore {
            path: path.into(),
            encryptor: None,
        }
    }

    pub fn with_encryptor(mut self, encryptor: Encryptor) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seal(&self, value: &str) -> Result<String, AuthError> {
        match &self.encryptor {
            Some(encryptor) => encryptor
                .encrypt(value)
                .map_err(|e| AuthError::Storage(format!("Encryption failed: {e}"))),
            None => Ok(value.to_string()),
        }
    }

    fn open(&self, value: &str) -> Result<String, AuthError> {
        match &self.encryptor {
            Some(encryptor) => encryptor
                .decrypt(value)
                .map_err(|e| AuthError::Storage(format!("Decryption failed: {e}"))),
            None => Ok(value.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<TokenSet>, AuthError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "Reading {} failed: {e}",
                    self.path.display()
                )))
            }
        };

        let contents = contents.trim();
        if contents.is_empty() {
            return Ok(None);
        }

        let stored: TokenSet = match serde_json::from_str(contents) {
            Ok(stored) => stored,
            Err(_) => {
                debug!(path = %self.path.display(), "reading plaintext token file");
                return Ok(Some(TokenSet::bearer(contents)));
            }
        };

        let opened = self.open(&stored.access_token).and_then(|access_token| {
            let refresh_token = match &stored.refresh_token {
                Some(token) => Some(self.open(token)?),
                None => None,
            };
            Ok((access_token, refresh_token))
        });

        // A token sealed under another key (or none) can't be used; a fresh
        // authorization overwrites it.
        let (access_token, refresh_token) = match opened {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "stored token is unreadable");
                return Ok(None);
            }
        };

        Ok(Some(TokenSet {
            access_token,
            refresh_token,
            expires_at: stored.expires_at,
        }))
    }

    async fn set(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        let sealed = TokenSet {
            access_token: self.seal(&token_set.access_token)?,
            refresh_token: match &token_set.refresh_token {
                Some(refresh_token) => Some(self.seal(refresh_token)?),
                None => None,
            },
            expires_at: token_set.expires_at,
        };

        let serialized = serde_json::to_string(&sealed)
            .map_err(|e| AuthError::Storage(format!("Serialization failed: {e}")))?;

        tokio::fs::write(&self.path, serialized).await.map_err(|e| {
            AuthError::Storage(format!("Writing {} failed: {e}", self.path.display()))
        })?;

        info!(
            path = %self.path.display(),
            encrypted = self.encryptor.is_some(),
            "stored access token"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "removed access token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!(
                "Removing {} failed: {e}",
                self.path.display()
            ))),
        }
    }
}

/// In-process store, used in tests and for throwaway runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    token_set: RwLock<Option<TokenSet>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token_set: TokenSet) -> Self {
        MemoryTokenStore {
            token_set: RwLock::new(Some(token_set)),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<TokenSet>, AuthError> {
        Ok(self.token_set.read().await.clone())
    }

    async fn set(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        *self.token_set.write().await = Some(token_set.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.token_set.write().await.take();
        Ok(())
    }
}
