use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine};
use rand::RngCore;
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: {0} (expected {KEY_SIZE})")]
    InvalidKeyLength(usize),
    #[error("Key is not valid base64")]
    InvalidKeyEncoding,
    #[error("Encryption failed")]
    EncryptionError,
    #[error("Decryption failed")]
    DecryptionError,
    #[error("Invalid format")]
    InvalidFormat,
    #[error("UTF-8 conversion error")]
    Utf8Error,
}

/// Seals stored credentials with AES-256-GCM.
///
/// Ciphertexts are rendered as `base64(nonce):base64(ciphertext)` so they can
/// live inside a JSON string field.
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Encryptor { .. }")
    }
}

impl Encryptor {
    pub fn try_new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key.len()));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Builds an encryptor from a base64-encoded 32 byte key, the form used in
    /// configuration.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let key = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::InvalidKeyEncoding)?;
        Self::try_new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionError)?;

        Ok(format!(
            "{}:{}",
            general_purpose::STANDARD.encode(nonce_bytes),
            general_purpose::STANDARD.encode(ciphertext)
        ))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let (nonce_part, cipher_part) = encoded
            .split_once(':')
            .ok_or(CryptoError::InvalidFormat)?;

        let nonce_bytes = general_purpose::STANDARD
            .decode(nonce_part)
            .map_err(|_| CryptoError::InvalidFormat)?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidFormat);
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = general_purpose::STANDARD
            .decode(cipher_part)
            .map_err(|_| CryptoError::InvalidFormat)?;

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionError)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8Error)
    }
}
