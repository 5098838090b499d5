//! Persisted records: test attempts and generated reports.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::crypto::{AlgorithmDescriptor, Family};

/// Operation exercised by one test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Key pair generation.
    KeyGeneration,
    /// Encryption.
    Encryption,
    /// Decryption (after an encryption pass).
    Decryption,
    /// Signing.
    Signing,
    /// Verification (after a signing pass).
    Verification,
}

impl OperationKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 5] = [
        Self::KeyGeneration,
        Self::Encryption,
        Self::Decryption,
        Self::Signing,
        Self::Verification,
    ];

    /// Canonical identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::KeyGeneration => "key_generation",
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::Signing => "signing",
            Self::Verification => "verification",
        }
    }

    /// Parses a canonical identifier (hyphens accepted).
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Descriptor fields copied into every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestContext {
    /// Key size or level at test time.
    pub security_parameter: u32,
    /// Family at test time.
    pub family: Family,
}

impl From<&AlgorithmDescriptor> for TestContext {
    fn from(d: &AlgorithmDescriptor) -> Self {
        Self {
            security_parameter: d.security_parameter,
            family: d.family,
        }
    }
}

/// One harness run. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Fresh identifier.
    pub id: Uuid,
    /// Requesting principal.
    pub owner_id: String,
    /// Catalog name of the algorithm.
    pub algorithm_name: String,
    /// Operation actually executed.
    pub operation: OperationKind,
    /// Input as supplied.
    pub input_payload: String,
    /// Output, absent on failure.
    pub output_payload: Option<String>,
    /// Time spent in the primitive.
    pub elapsed_millis: f64,
    /// Whether the operation succeeded.
    pub succeeded: bool,
    /// Error description on failure.
    pub failure_reason: Option<String>,
    /// Descriptor metadata.
    pub context: TestContext,
    /// Creation time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Kind of aggregate report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Latency statistics and ranking.
    Performance,
    /// Security tiers and quantum readiness.
    Security,
    /// Side-by-side comparison of chosen algorithms.
    Comparison,
}

impl ReportKind {
    /// Every kind.
    pub const ALL: [Self; 3] = [Self::Performance, Self::Security, Self::Comparison];

    /// Canonical identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Comparison => "comparison",
        }
    }

    /// Parses a canonical identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.id().eq_ignore_ascii_case(id.trim()))
    }

    /// Display name.
    pub fn title(self) -> &'static str {
        match self {
            Self::Performance => "Performance Analysis",
            Self::Security => "Security Analysis",
            Self::Comparison => "Algorithm Comparison",
        }
    }

    /// What the report contains.
    pub fn description(self) -> &'static str {
        match self {
            Self::Performance => {
                "Execution time statistics per algorithm, ranked fastest first, with recommendations"
            }
            Self::Security => {
                "Security tier per catalog algorithm, key-size notes, and the quantum-readiness score"
            }
            Self::Comparison => {
                "Success rate and latency of two or more algorithms side by side with insights"
            }
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One generated report. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Fresh identifier.
    pub id: Uuid,
    /// Requesting principal.
    pub owner_id: String,
    /// Title.
    pub title: String,
    /// Report kind.
    pub kind: ReportKind,
    /// Structured aggregate.
    pub body: serde_json::Value,
    /// One-paragraph summary.
    pub narrative_summary: String,
    /// Recommendation lines.
    pub recommendations: Vec<String>,
    /// Catalog names covered.
    pub algorithms_covered: BTreeSet<String>,
    /// Creation time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_ids() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(
            OperationKind::from_id("key-generation"),
            Some(OperationKind::KeyGeneration)
        );
        assert_eq!(OperationKind::from_id("hashing"), None);
        assert_eq!(
            serde_json::to_string(&OperationKind::KeyGeneration).unwrap(),
            "\"key_generation\""
        );
    }

    #[test]
    fn report_kind_ids() {
        assert_eq!(ReportKind::from_id("Security"), Some(ReportKind::Security));
        assert_eq!(ReportKind::from_id("audit"), None);
        assert!(ReportKind::Comparison.description().contains("two or more"));
    }

    #[test]
    fn test_record_serializes_rfc3339_timestamp() {
        let record = TestRecord {
            id: Uuid::nil(),
            owner_id: "alice".into(),
            algorithm_name: "AES-256".into(),
            operation: OperationKind::Encryption,
            input_payload: "hi".into(),
            output_payload: None,
            elapsed_millis: 0.5,
            succeeded: false,
            failure_reason: Some("boom".into()),
            context: TestContext {
                security_parameter: 256,
                family: Family::Aes,
            },
            timestamp: time::macros::datetime!(2024-03-01 12:00 UTC),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00Z");
        assert_eq!(json["context"]["family"], "AES");
        let back: TestRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
