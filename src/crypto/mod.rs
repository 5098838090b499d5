//! Uniform capability layer over heterogeneous primitives.
//!
//! Every algorithm instance implements [`CryptoAlgorithm`] (descriptor and key
//! generation). Encryption and signing are separate capability traits,
//! [`Encryptor`] and [`Signer`]; a family implements only the ones it
//! supports and exposes them through [`CryptoAlgorithm::as_encryptor`] /
//! [`CryptoAlgorithm::as_signer`]. Asking for a capability the family lacks
//! yields [`CryptoError::CapabilityMismatch`] before any primitive runs.
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`algorithm`] | Families, descriptors, the standard seed list |
//! | [`errors`] | `CryptoError` for all primitive operations |
//! | [`registry`] | `AlgorithmCatalog`: lookup, listing, seeding |
//! | [`envelope`] | Cipher and signature envelopes (base64 fields) |
//! | [`providers`] | The six family implementations |
//!
//! ## Post-quantum stand-ins
//!
//! The Kyber, Dilithium and Falcon families produce size-correct random
//! artifacts. They are structurally consistent, not secure: KEM decryption
//! never recovers the encapsulated secret and signature verification checks
//! envelope structure and the message digest, not a lattice signature.

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod envelope;
pub mod errors;
pub mod providers;
pub mod registry;

use base64::Engine as _;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use algorithm::{AlgorithmDescriptor, AlgorithmKind, Family};
pub use envelope::{CipherEnvelope, SignatureEnvelope};
pub use errors::{Capability, CryptoError};
pub use registry::AlgorithmCatalog;

/// Public/private key pair held by an algorithm instance.
///
/// Only [`KeySizes`] ever leaves the instance. Private bytes are zeroized on
/// drop and never printed.
#[derive(zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
pub struct KeyMaterial {
    public: Vec<u8>,
    private: Vec<u8>,
}

impl KeyMaterial {
    /// Wraps encoded key artifacts.
    pub fn new(public: Vec<u8>, private: Vec<u8>) -> Self {
        Self { public, private }
    }

    /// Encoded public artifact (empty for symmetric keys).
    pub fn public(&self) -> &[u8] {
        &self.public
    }

    pub(crate) fn private(&self) -> &[u8] {
        &self.private
    }

    /// Byte lengths of both artifacts.
    pub fn sizes(&self) -> KeySizes {
        KeySizes {
            public_key_size: self.public.len(),
            private_key_size: self.private.len(),
        }
    }

    /// Short hex fingerprint of the public artifact, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.public);
        hex::encode(digest.get(..8).unwrap_or_default())
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "KeyMaterial(public: [{} bytes], private: [REDACTED])",
            self.public.len()
        )
    }
}

/// Derived key metadata recorded by key-generation tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySizes {
    /// Public artifact length in bytes.
    pub public_key_size: usize,
    /// Private artifact length in bytes.
    pub private_key_size: usize,
}

/// Encrypt/decrypt capability.
pub trait Encryptor {
    /// Encrypts `plaintext`, generating keys first if the instance has none.
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<CipherEnvelope, CryptoError>;

    /// Decrypts an envelope produced by this instance. Fails with
    /// [`CryptoError::MissingKey`] when no private key exists.
    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CryptoError>;
}

/// Sign/verify capability.
pub trait Signer {
    /// Signs `message`, generating keys first if the instance has none.
    fn sign(&mut self, message: &[u8]) -> Result<SignatureEnvelope, CryptoError>;

    /// Checks `signature` against `message`. A mismatch is `Ok(false)`;
    /// errors are reserved for envelopes that cannot be interpreted.
    fn verify(&self, message: &[u8], signature: &SignatureEnvelope) -> Result<bool, CryptoError>;
}

/// One parameterized algorithm instance. Owns its key material.
pub trait CryptoAlgorithm: Send {
    /// Catalog entry this instance was built from.
    fn descriptor(&self) -> &AlgorithmDescriptor;

    /// Generates (or regenerates) the instance's key pair.
    fn generate_keys(&mut self) -> Result<&KeyMaterial, CryptoError>;

    /// Current key pair, if one has been generated.
    fn key_material(&self) -> Option<&KeyMaterial>;

    /// The encryption capability, if the family has one.
    fn as_encryptor(&mut self) -> Option<&mut dyn Encryptor> {
        None
    }

    /// The signing capability, if the family has one.
    fn as_signer(&mut self) -> Option<&mut dyn Signer> {
        None
    }

    /// Like [`CryptoAlgorithm::as_encryptor`], failing with
    /// [`CryptoError::CapabilityMismatch`].
    fn encryptor(&mut self) -> Result<&mut dyn Encryptor, CryptoError> {
        let family = self.descriptor().family;
        self.as_encryptor().ok_or(CryptoError::CapabilityMismatch {
            family,
            capability: Capability::Encryption,
        })
    }

    /// Like [`CryptoAlgorithm::as_signer`], failing with
    /// [`CryptoError::CapabilityMismatch`].
    fn signer(&mut self) -> Result<&mut dyn Signer, CryptoError> {
        let family = self.descriptor().family;
        self.as_signer().ok_or(CryptoError::CapabilityMismatch {
            family,
            capability: Capability::Signing,
        })
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Fills `len` bytes from the OS RNG.
pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, rand_core::Error> {
    let mut buf = vec![0u8; len];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(buf)
}

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

pub(crate) fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub(crate) fn unb64(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| CryptoError::InvalidEnvelope(format!("{field} is not valid base64: {e}")))
}
