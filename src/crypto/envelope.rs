//! Cipher and signature envelopes.
//!
//! An envelope bundles ciphertext or a signature with the auxiliary fields
//! needed to invert or verify it. Binary fields are standard base64 strings,
//! and envelopes serialize to JSON documents. Unknown fields are ignored on
//! parse.

use serde::{Deserialize, Serialize};

use super::errors::CryptoError;
use super::{b64, sha256};

/// `{ciphertext, iv}` produced by AES-CBC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricEnvelope {
    /// Base64 ciphertext.
    pub ciphertext: String,
    /// Base64 16-byte initialization vector.
    pub iv: String,
}

/// ECDH + AES-CBC hybrid envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridEnvelope {
    /// Base64 ciphertext of the space-padded plaintext.
    pub ciphertext: String,
    /// Base64 16-byte initialization vector.
    pub iv: String,
    /// Base64 SEC1-encoded ephemeral public key.
    pub ephemeral_public_key: String,
}

/// KEM stand-in envelope: an encapsulated secret plus the payload encrypted
/// under the shared secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KemEnvelope {
    /// Base64 encapsulated secret (64 bytes).
    pub encapsulated_secret: String,
    /// Payload encrypted under the shared secret.
    pub encrypted_message: SymmetricEnvelope,
    /// Scheme label, `"Kyber"`.
    pub algorithm: String,
}

/// Output of [`crate::crypto::Encryptor::encrypt`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum CipherEnvelope {
    /// RSA-OAEP: the ciphertext is the whole envelope.
    RsaOaep {
        /// Base64 ciphertext.
        ciphertext: String,
    },
    /// Elliptic-curve hybrid encryption.
    EcdhAesCbc(HybridEnvelope),
    /// Plain AES-CBC.
    AesCbc(SymmetricEnvelope),
    /// KEM stand-in.
    KemAesCbc(KemEnvelope),
}

impl CipherEnvelope {
    /// Serialized scheme tag.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::RsaOaep { .. } => "rsa-oaep",
            Self::EcdhAesCbc(_) => "ecdh-aes-cbc",
            Self::AesCbc(_) => "aes-cbc",
            Self::KemAesCbc(_) => "kem-aes-cbc",
        }
    }

    /// Serializes to a JSON document.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))
    }

    pub(crate) fn unexpected(&self, expected: &str) -> CryptoError {
        CryptoError::InvalidEnvelope(format!(
            "expected a {expected} envelope, got {}",
            self.scheme()
        ))
    }
}

/// Output of [`crate::crypto::Signer::sign`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Base64 signature bytes.
    pub signature: String,
    /// Base64 SHA-256 digest of the signed message.
    pub message_hash: String,
    /// Signature scheme label, e.g. `"Dilithium"` or `"ECDSA-P256"`.
    pub algorithm: String,
}

impl SignatureEnvelope {
    /// Packages `signature` for `message`.
    pub fn new(algorithm: &str, signature: &[u8], message: &[u8]) -> Self {
        Self {
            signature: b64(signature),
            message_hash: b64(&sha256(message)),
            algorithm: algorithm.to_string(),
        }
    }

    /// Fails with [`CryptoError::InvalidEnvelope`] if a required field is empty.
    pub fn require_fields(&self) -> Result<(), CryptoError> {
        for (field, value) in [
            ("signature", &self.signature),
            ("message_hash", &self.message_hash),
            ("algorithm", &self.algorithm),
        ] {
            if value.trim().is_empty() {
                return Err(CryptoError::InvalidEnvelope(format!(
                    "signature envelope is missing {field}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `message_hash` is the SHA-256 digest of `message`.
    pub fn binds(&self, message: &[u8]) -> bool {
        self.message_hash == b64(&sha256(message))
    }

    /// Serializes to a JSON document.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))
    }

    /// Parses a JSON document. Missing fields are an error.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))
    }
}
