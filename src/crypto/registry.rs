//! Algorithm catalog: the registry of descriptors every other component
//! resolves names against.
//!
//! The catalog is built once at startup (normally via [`default_catalog`])
//! and then shared by reference. It is never mutated after seeding, so it is
//! `Send + Sync` without locking.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{info, warn};

use super::algorithm::{standard_seed, AlgorithmDescriptor, AlgorithmKind, Family};
use super::errors::CryptoError;
use super::providers::instantiate;
use super::CryptoAlgorithm;
use crate::errors::LabError;

/// Ordered, name-indexed set of descriptors.
pub struct AlgorithmCatalog {
    entries: Vec<AlgorithmDescriptor>,
    by_name: HashMap<String, usize>,
    warnings: Vec<CatalogWarning>,
}

impl AlgorithmCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Populates an empty catalog from `seed` and returns the number of
    /// descriptors inserted. Seeding a non-empty catalog is a no-op returning 0.
    ///
    /// Duplicate names and descriptors whose parameter the family rejects are
    /// skipped and recorded in [`AlgorithmCatalog::warnings`].
    pub fn seed(&mut self, seed: Vec<AlgorithmDescriptor>) -> usize {
        if !self.entries.is_empty() {
            info!(existing = self.entries.len(), "catalog already seeded");
            return 0;
        }
        for descriptor in seed {
            if self.by_name.contains_key(&descriptor.name) {
                self.reject(&descriptor.name, "duplicate name in seed list".into());
                continue;
            }
            if let Err(e) = validate_descriptor(&descriptor) {
                self.reject(&descriptor.name, e.to_string());
                continue;
            }
            self.by_name
                .insert(descriptor.name.clone(), self.entries.len());
            self.entries.push(descriptor);
        }
        info!(inserted = self.entries.len(), "catalog seeded");
        self.entries.len()
    }

    fn reject(&mut self, name: &str, reason: String) {
        warn!(algorithm = name, %reason, "seed entry skipped");
        self.warnings.push(CatalogWarning {
            algorithm: name.to_string(),
            reason,
        });
    }

    /// Resolves a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.by_name.get(name).and_then(|&i| self.entries.get(i))
    }

    /// Resolves a descriptor by name, failing with `NotFound`.
    pub fn lookup(&self, name: &str) -> Result<&AlgorithmDescriptor, LabError> {
        self.get(name)
            .ok_or_else(|| LabError::not_found("algorithm", name))
    }

    /// All descriptors in seed order.
    pub fn list_all(&self) -> &[AlgorithmDescriptor] {
        &self.entries
    }

    /// Descriptors of one family, in seed order.
    pub fn by_family(&self, family: Family) -> Vec<&AlgorithmDescriptor> {
        self.entries.iter().filter(|d| d.family == family).collect()
    }

    /// Classical or post-quantum descriptors, in seed order.
    pub fn by_kind(&self, kind: AlgorithmKind) -> Vec<&AlgorithmDescriptor> {
        self.entries.iter().filter(|d| d.kind() == kind).collect()
    }

    /// Counts by kind and family.
    pub fn category_summary(&self) -> CategorySummary {
        let mut families = BTreeMap::new();
        for d in &self.entries {
            *families.entry(d.family).or_insert(0) += 1;
        }
        let post_quantum = self.entries.iter().filter(|d| d.quantum_safe).count();
        CategorySummary {
            total: self.entries.len(),
            classical: self.entries.len() - post_quantum,
            post_quantum,
            families,
        }
    }

    /// Builds a fresh instance of the named algorithm.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn CryptoAlgorithm>, LabError> {
        let descriptor = self.lookup(name)?;
        instantiate(descriptor).map_err(LabError::from)
    }

    /// Entries skipped while seeding.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AlgorithmCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a catalog seeded with [`standard_seed`].
pub fn default_catalog() -> AlgorithmCatalog {
    let mut catalog = AlgorithmCatalog::new();
    catalog.seed(standard_seed());
    catalog
}

/// Catalog counts for the categories listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// Total descriptors.
    pub total: usize,
    /// Descriptors that are not quantum-safe.
    pub classical: usize,
    /// Quantum-safe descriptors.
    pub post_quantum: usize,
    /// Descriptors per family.
    pub families: BTreeMap<Family, usize>,
}

/// A seed entry that was not inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogWarning {
    /// Name from the seed list.
    pub algorithm: String,
    /// Why it was skipped.
    pub reason: String,
}

impl std::fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped seed entry '{}': {}", self.algorithm, self.reason)
    }
}

/// Validates a descriptor against its family's parameter rules.
pub fn validate_descriptor(descriptor: &AlgorithmDescriptor) -> Result<(), CryptoError> {
    instantiate(descriptor).map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_thirteen_entries() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 13);
        assert!(catalog.warnings().is_empty());
        assert_eq!(catalog.list_all()[0].name, "RSA-2048");
    }

    #[test]
    fn reseeding_is_a_noop() {
        let mut catalog = default_catalog();
        assert_eq!(catalog.seed(standard_seed()), 0);
        assert_eq!(catalog.len(), 13);
    }

    #[test]
    fn lookup_and_not_found() {
        let catalog = default_catalog();
        let aes = catalog.lookup("AES-256").unwrap();
        assert_eq!(aes.family, Family::Aes);
        assert_eq!(aes.security_parameter, 256);
        let err = catalog.lookup("DES").unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn by_family_and_kind() {
        let catalog = default_catalog();
        let kyber: Vec<&str> = catalog
            .by_family(Family::Kyber)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(kyber, ["Kyber-512", "Kyber-768", "Kyber-1024"]);
        assert_eq!(catalog.by_family(Family::Rsa).len(), 2);
        assert_eq!(catalog.by_kind(AlgorithmKind::PostQuantum).len(), 7);
    }

    #[test]
    fn category_summary_counts() {
        let summary = default_catalog().category_summary();
        assert_eq!(summary.total, 13);
        assert_eq!(summary.classical, 6);
        assert_eq!(summary.post_quantum, 7);
        assert_eq!(summary.families.get(&Family::Falcon), Some(&2));
    }

    #[test]
    fn seed_skips_duplicates_and_invalid_parameters() {
        let mut catalog = AlgorithmCatalog::new();
        let inserted = catalog.seed(vec![
            AlgorithmDescriptor::new("AES-256", Family::Aes, 256, false, ""),
            AlgorithmDescriptor::new("AES-256", Family::Aes, 128, false, ""),
            AlgorithmDescriptor::new("Kyber-2", Family::Kyber, 2, true, ""),
        ]);
        assert_eq!(inserted, 1);
        assert_eq!(catalog.warnings().len(), 2);
        assert!(catalog.warnings()[1].to_string().contains("Kyber-2"));
        assert!(validate_descriptor(catalog.lookup("AES-256").unwrap()).is_ok());
    }

    #[test]
    fn instantiate_by_name() {
        let catalog = default_catalog();
        let alg = catalog.instantiate("Falcon-512").unwrap();
        assert_eq!(alg.descriptor().security_parameter, 512);
        assert!(catalog.instantiate("Falcon-256").is_err());
    }
}
