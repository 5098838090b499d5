//! Caller-level error taxonomy.
//!
//! Primitive failures inside the harness never surface here; they become
//! failed test records. `LabError` is what a caller sees when a request
//! cannot be served at all (unknown algorithm, fewer than two algorithms to
//! compare, malformed request) or when the record store fails.

use std::fmt;

use crate::crypto::CryptoError;
use crate::store::StoreError;

/// Errors returned by catalog, comparison, report, and store-facing calls.
#[derive(Debug)]
pub enum LabError {
    /// Unknown algorithm, test, or report identifier.
    NotFound {
        /// What was looked up (`"algorithm"`, `"test"`, `"report"`).
        entity: &'static str,
        /// The identifier that did not resolve.
        id: String,
    },

    /// A comparison needs at least two distinct algorithms.
    InsufficientInput(String),

    /// The request is malformed.
    Validation(String),

    /// A primitive failure outside the harness boundary (e.g. an invalid
    /// descriptor parameter at instantiation).
    Crypto(CryptoError),

    /// Record store failure.
    Store(StoreError),
}

impl LabError {
    /// Shorthand for [`LabError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable machine-checkable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InsufficientInput(_) => "insufficient_input",
            Self::Validation(_) => "validation",
            Self::Crypto(e) => e.kind(),
            Self::Store(_) => "store",
        }
    }
}

impl fmt::Display for LabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InsufficientInput(msg) => write!(f, "insufficient input: {msg}"),
            Self::Validation(msg) => write!(f, "invalid request: {msg}"),
            Self::Crypto(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "record store error: {e}"),
        }
    }
}

impl std::error::Error for LabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Crypto(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CryptoError> for LabError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<StoreError> for LabError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingRecords { entity, ids } => Self::NotFound {
                entity,
                id: ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::Family;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(LabError::not_found("algorithm", "DES").kind(), "not_found");
        assert_eq!(LabError::InsufficientInput("x".into()).kind(), "insufficient_input");
        assert_eq!(LabError::Validation("x".into()).kind(), "validation");
        let crypto = LabError::from(CryptoError::InvalidParameter {
            family: Family::Aes,
            parameter: 1,
        });
        assert_eq!(crypto.kind(), "invalid_parameter");
    }

    #[test]
    fn missing_records_map_to_not_found() {
        let id = uuid::Uuid::nil();
        let err = LabError::from(StoreError::MissingRecords {
            entity: "test",
            ids: vec![id],
        });
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn display_names_the_identifier() {
        assert_eq!(
            LabError::not_found("report", "abc").to_string(),
            "report not found: abc"
        );
    }
}
