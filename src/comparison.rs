//! Side-by-side triad timing: key generation, encryption, decryption.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crypto::{AlgorithmCatalog, AlgorithmDescriptor};
use crate::errors::LabError;
use crate::harness::measure;

/// Elapsed times of one triad run, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TriadTimings {
    /// Key generation.
    pub key_generation_ms: f64,
    /// Encryption of the input.
    pub encryption_ms: f64,
    /// Decryption of that ciphertext.
    pub decryption_ms: f64,
    /// Sum of the three.
    pub total_time_ms: f64,
}

/// One requested algorithm's result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Name as requested.
    pub algorithm_name: String,
    /// Resolved descriptor; `None` when the name is unknown.
    pub descriptor: Option<AlgorithmDescriptor>,
    /// Timings; `None` when any step failed.
    pub performance: Option<TriadTimings>,
    /// Whether decryption reproduced the input exactly.
    pub success: bool,
    /// Why the row has no timings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonRow {
    fn failed(name: &str, descriptor: Option<AlgorithmDescriptor>, error: String) -> Self {
        Self {
            algorithm_name: name.to_string(),
            descriptor,
            performance: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Runs the triad across several algorithms against identical input.
pub struct ComparisonEngine {
    catalog: Arc<AlgorithmCatalog>,
}

impl ComparisonEngine {
    /// Binds the engine to a catalog.
    pub fn new(catalog: Arc<AlgorithmCatalog>) -> Self {
        Self { catalog }
    }

    /// One row per distinct requested name, in request order.
    ///
    /// Fails with `InsufficientInput` for fewer than two distinct names.
    /// Unknown names and families without encryption still get a row, with
    /// `performance = None` and an explanatory error.
    pub fn compare(&self, names: &[String], input: &str) -> Result<Vec<ComparisonRow>, LabError> {
        let mut distinct: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if !name.is_empty() && !distinct.contains(&name) {
                distinct.push(name);
            }
        }
        if distinct.len() < 2 {
            return Err(LabError::InsufficientInput(format!(
                "at least 2 distinct algorithms required for comparison, got {}",
                distinct.len()
            )));
        }

        info!(algorithms = distinct.len(), "comparison started");
        Ok(distinct
            .into_iter()
            .map(|name| self.compare_one(name, input))
            .collect())
    }

    fn compare_one(&self, name: &str, input: &str) -> ComparisonRow {
        let Some(descriptor) = self.catalog.get(name) else {
            warn!(algorithm = name, "comparison: unknown algorithm");
            return ComparisonRow::failed(name, None, format!("algorithm not found: {name}"));
        };
        match run_triad(&self.catalog, name, input) {
            Ok((timings, success)) => {
                debug!(algorithm = name, total_ms = timings.total_time_ms, success, "triad done");
                ComparisonRow {
                    algorithm_name: name.to_string(),
                    descriptor: Some(descriptor.clone()),
                    performance: Some(timings),
                    success,
                    error: None,
                }
            }
            Err(e) => {
                debug!(algorithm = name, error = %e, "triad failed");
                ComparisonRow::failed(name, Some(descriptor.clone()), e.to_string())
            }
        }
    }
}

fn run_triad(
    catalog: &AlgorithmCatalog,
    name: &str,
    input: &str,
) -> Result<(TriadTimings, bool), LabError> {
    let mut algorithm = catalog.instantiate(name)?;

    let keygen = measure(|| algorithm.generate_keys().map(|_| ()));
    keygen.value?;

    let enc = algorithm.encryptor()?;
    let encrypted = measure(|| enc.encrypt(input.as_bytes()));
    let envelope = encrypted.value?;
    let decrypted = measure(|| enc.decrypt(&envelope));
    let plaintext = decrypted.value?;

    let timings = TriadTimings {
        key_generation_ms: keygen.elapsed_millis,
        encryption_ms: encrypted.elapsed_millis,
        decryption_ms: decrypted.elapsed_millis,
        total_time_ms: keygen.elapsed_millis + encrypted.elapsed_millis + decrypted.elapsed_millis,
    };
    Ok((timings, plaintext == input.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::registry::default_catalog;

    fn engine() -> ComparisonEngine {
        ComparisonEngine::new(Arc::new(default_catalog()))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_algorithm_is_insufficient() {
        let err = engine()
            .compare(&names(&["AES-256"]), "x")
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_input");

        let dup = engine()
            .compare(&names(&["AES-256", "AES-256"]), "x")
            .unwrap_err();
        assert_eq!(dup.kind(), "insufficient_input");
    }

    #[test]
    fn symmetric_and_ecc_rows_succeed() {
        let rows = engine()
            .compare(&names(&["AES-128", "ECC-P256"]), "Hello, Quantum World!")
            .unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.success, "{:?}", row.error);
            let perf = row.performance.unwrap();
            let sum = perf.key_generation_ms + perf.encryption_ms + perf.decryption_ms;
            assert!((perf.total_time_ms - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn unresolvable_and_signature_only_rows_are_kept() {
        let rows = engine()
            .compare(&names(&["AES-256", "DES-56", "Falcon-512"]), "m")
            .unwrap();
        assert_eq!(rows.len(), 3);

        assert!(rows[1].descriptor.is_none());
        assert!(rows[1].performance.is_none());
        assert!(rows[1].error.as_deref().unwrap().contains("DES-56"));

        assert!(rows[2].descriptor.is_some());
        assert!(rows[2].performance.is_none());
        assert!(rows[2].error.as_deref().unwrap().contains("signature-only"));
    }

    #[test]
    fn kem_stand_in_never_round_trips() {
        let rows = engine()
            .compare(&names(&["Kyber-512", "AES-128"]), "Hello, Quantum World!")
            .unwrap();
        assert!(!rows[0].success);
        assert!(rows[1].success);
    }
}
