//! Signing identity and transaction signing.

use ed25519_dalek::{Signer, SigningKey};
use serde::Serialize;
use sha3::{Digest, Sha3_256};

use crate::types::Call;

/// An unlocked signing key plus its derived address.
///
/// Created once at the start of a run, from a seed phrase or an unlocked
/// keystore, and held for the run's duration. Never persisted in the clear.
pub struct SigningIdentity {
    key: SigningKey,
    address: String,
}

impl SigningIdentity {
    /// Derive a deterministic identity from a seed phrase.
    ///
    /// The phrase is digested with SHA3-256 and the digest used directly as
    /// the ed25519 secret, so the same phrase always yields the same account.
    pub fn from_seed_phrase(phrase: &str) -> Self {
        let digest: [u8; 32] = Sha3_256::digest(phrase.as_bytes()).into();
        Self::from_secret_bytes(&digest)
    }

    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let key = SigningKey::from_bytes(secret);
        let address = hex::encode(key.verifying_key().to_bytes());
        Self { key, address }
    }

    /// The identity's on-chain address (hex-encoded public key).
    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn secret_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Sign a call with the given account nonce, producing the submission unit.
    pub fn sign_call(&self, call: Call, nonce: u64) -> SignedTransaction {
        let payload = signing_payload(&call, nonce, &self.address);
        let signature = self.key.sign(payload.as_bytes());
        SignedTransaction {
            call,
            address: self.address.clone(),
            nonce,
            signature: hex::encode(signature.to_bytes()),
        }
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// A signed call ready for submission.
///
/// The address doubles as the hex-encoded verification key, so no separate
/// public-key field travels on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub call: Call,
    pub address: String,
    pub nonce: u64,
    pub signature: String,
}

/// Canonical byte payload covered by the signature.
fn signing_payload(call: &Call, nonce: u64, address: &str) -> String {
    format!(
        "{}.{}:{}:{}:{}",
        call.module, call.method, call.args, nonce, address
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier, VerifyingKey};
    use serde_json::json;

    #[test]
    fn test_seed_phrase_is_deterministic() {
        let a = SigningIdentity::from_seed_phrase("//Alice");
        let b = SigningIdentity::from_seed_phrase("//Alice");
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_different_phrases_yield_different_addresses() {
        let a = SigningIdentity::from_seed_phrase("//Alice");
        let b = SigningIdentity::from_seed_phrase("//Bob");
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_signature_verifies_against_the_public_key() {
        let identity = SigningIdentity::from_seed_phrase("//Alice");
        let call = Call::new("democracy", "forceRemoveVote", json!({ "index": 3 }));
        let signed = identity.sign_call(call.clone(), 7);

        let key_bytes: [u8; 32] = hex::decode(&signed.address)
            .unwrap()
            .try_into()
            .unwrap();
        let key = VerifyingKey::from_bytes(&key_bytes).unwrap();
        let sig_bytes: [u8; 64] = hex::decode(&signed.signature)
            .unwrap()
            .try_into()
            .unwrap();
        let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);

        let payload = signing_payload(&call, 7, identity.address());
        assert!(key.verify(payload.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn test_nonce_changes_the_signature() {
        let identity = SigningIdentity::from_seed_phrase("//Alice");
        let call = Call::new("democracy", "forceRemoveVote", json!({ "index": 3 }));
        let first = identity.sign_call(call.clone(), 1);
        let second = identity.sign_call(call, 2);
        assert_ne!(first.signature, second.signature);
    }
}
