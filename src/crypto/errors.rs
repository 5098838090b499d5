//! Cryptographic error types for the algorithm capability layer.
//!
//! Every primitive failure is a [`CryptoError`]. Messages name the family and
//! the operation that failed, never key bytes, so they are safe to store as a
//! test record's failure reason.

use std::fmt;

use super::algorithm::Family;

/// A capability a family may or may not expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Encrypt / decrypt.
    Encryption,
    /// Sign / verify.
    Signing,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encryption => f.write_str("encryption"),
            Self::Signing => f.write_str("signing"),
        }
    }
}

/// Errors produced by algorithm instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key generation failed (RNG or parameter failure).
    KeyGeneration(String),

    /// Encryption failed; wraps the underlying cause.
    Encryption(String),

    /// Decryption failed (bad padding, wrong key, malformed ciphertext).
    Decryption(String),

    /// Signature generation failed.
    Signing(String),

    /// Decryption or verification was attempted without the required key
    /// material. A specialisation of [`CryptoError::Decryption`].
    MissingKey {
        /// Family of the instance.
        family: Family,
        /// Operation that needed the key.
        operation: &'static str,
    },

    /// The family does not support the requested capability.
    CapabilityMismatch {
        /// Family of the instance.
        family: Family,
        /// Capability that was requested.
        capability: Capability,
    },

    /// The security parameter is not valid for the family.
    InvalidParameter {
        /// Family of the descriptor.
        family: Family,
        /// Rejected security parameter.
        parameter: u32,
    },

    /// An envelope could not be parsed or is missing a field.
    InvalidEnvelope(String),
}

impl CryptoError {
    /// Returns `true` for every decryption-side failure, including
    /// [`CryptoError::MissingKey`].
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Decryption(_) | Self::MissingKey { .. })
    }

    /// Stable machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyGeneration(_) => "key_generation",
            Self::Encryption(_) => "encryption",
            Self::Decryption(_) => "decryption",
            Self::Signing(_) => "signing",
            Self::MissingKey { .. } => "missing_key",
            Self::CapabilityMismatch { .. } => "capability_mismatch",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::InvalidEnvelope(_) => "invalid_envelope",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyGeneration(msg) => write!(f, "key generation failed: {msg}"),
            Self::Encryption(msg) => write!(f, "encryption failed: {msg}"),
            Self::Decryption(msg) => write!(f, "decryption failed: {msg}"),
            Self::Signing(msg) => write!(f, "signing failed: {msg}"),
            Self::MissingKey { family, operation } => {
                write!(
                    f,
                    "missing key material: {family} {operation} requires a generated key pair"
                )
            }
            Self::CapabilityMismatch {
                family,
                capability: Capability::Encryption,
            } => {
                write!(
                    f,
                    "{family} is a signature-only family and does not support encryption; use signing instead"
                )
            }
            Self::CapabilityMismatch {
                family,
                capability: Capability::Signing,
            } => {
                write!(f, "{family} does not support signing")
            }
            Self::InvalidParameter { family, parameter } => {
                write!(f, "invalid security parameter {parameter} for {family}")
            }
            Self::InvalidEnvelope(msg) => write!(f, "invalid envelope: {msg}"),
        }
    }
}

impl std::error::Error for CryptoError {}
