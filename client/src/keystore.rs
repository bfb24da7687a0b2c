//! Encrypted on-disk keystore.
//!
//! A keystore record holds the operator's 32-byte secret key sealed with
//! ChaCha20-Poly1305 under an Argon2id passphrase-derived key. The record is
//! a small JSON file with hex-encoded binary fields, so it can be inspected
//! and moved around without extra tooling.

use std::path::Path;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signer::SigningIdentity;

pub const SALT_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const KEY_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("failed to read keystore: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed keystore: {0}")]
    Format(String),
    #[error("key derivation failed: {0}")]
    Kdf(String),
    #[error("keystore sealing failed")]
    Seal,
    #[error("keystore unlock failed: wrong passphrase or corrupted record")]
    WrongPassphrase,
    #[error("keystore address does not match the sealed key")]
    AddressMismatch,
}

/// An encrypted key record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keystore {
    /// Address of the sealed identity, kept in the clear for confirmation.
    pub address: String,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

impl Keystore {
    pub fn load(path: &Path) -> Result<Self, KeystoreError> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| KeystoreError::Format(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), KeystoreError> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| KeystoreError::Format(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Seal an identity's secret key under a passphrase.
    pub fn seal(identity: &SigningIdentity, passphrase: &str) -> Result<Self, KeystoreError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(passphrase, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let secret = identity.secret_bytes();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), secret.as_slice())
            .map_err(|_| KeystoreError::Seal)?;

        Ok(Self {
            address: identity.address().to_string(),
            salt: hex::encode(salt),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Attempt to unlock the record with the given passphrase.
    ///
    /// A wrong passphrase fails AEAD authentication and surfaces as
    /// [`KeystoreError::WrongPassphrase`]; the caller decides whether to
    /// prompt again (the operator tools do not — re-running is the retry).
    pub fn unlock(&self, passphrase: &str) -> Result<SigningIdentity, KeystoreError> {
        let salt = decode_field(&self.salt, "salt")?;
        let nonce = decode_field(&self.nonce, "nonce")?;
        if nonce.len() != NONCE_SIZE {
            return Err(KeystoreError::Format(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                nonce.len()
            )));
        }
        let ciphertext = decode_field(&self.ciphertext, "ciphertext")?;

        let key = derive_key(passphrase, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| KeystoreError::WrongPassphrase)?;

        let secret: [u8; KEY_SIZE] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| KeystoreError::Format("sealed secret has unexpected length".into()))?;
        let identity = SigningIdentity::from_secret_bytes(&secret);

        if identity.address() != self.address {
            return Err(KeystoreError::AddressMismatch);
        }
        Ok(identity)
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_SIZE], KeystoreError> {
    let mut key = [0u8; KEY_SIZE];
    argon2::Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| KeystoreError::Kdf(e.to_string()))?;
    Ok(key)
}

fn decode_field(value: &str, field: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(value).map_err(|e| KeystoreError::Format(format!("{}: {}", field, e)))
}
