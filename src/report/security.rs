//! Security report: a tier per catalog algorithm and the owner's
//! quantum-readiness score.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::json;

use super::{percentage, ReportDraft, Scope};
use crate::crypto::{AlgorithmDescriptor, Family};

/// Security tier assigned by [`SecurityTier::assess`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityTier {
    High,
    MediumHigh,
    Medium,
    MediumLow,
    Low,
    /// No records to judge by.
    Unknown,
}

impl SecurityTier {
    /// Every tier, strongest first.
    pub const ALL: [Self; 6] = [
        Self::High,
        Self::MediumHigh,
        Self::Medium,
        Self::MediumLow,
        Self::Low,
        Self::Unknown,
    ];

    /// Serialized form.
    pub fn id(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::MediumHigh => "medium-high",
            Self::Medium => "medium",
            Self::MediumLow => "medium-low",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }

    /// Tier and reliability note for a success rate (percent) over
    /// `total` records.
    ///
    /// | quantum-safe | >= 95 | >= 80 | below |
    /// |---|---|---|---|
    /// | yes | high | medium-high | medium |
    /// | no | medium | medium-low | low |
    pub fn assess(quantum_safe: bool, total: usize, success_rate: f64) -> (Self, &'static str) {
        if total == 0 {
            return (Self::Unknown, "No test data available");
        }
        match (quantum_safe, success_rate) {
            (true, r) if r >= 95.0 => (Self::High, "Quantum-safe with excellent reliability"),
            (true, r) if r >= 80.0 => (Self::MediumHigh, "Quantum-safe with good reliability"),
            (true, _) => (Self::Medium, "Quantum-safe but implementation issues detected"),
            (false, r) if r >= 95.0 => {
                (Self::Medium, "Classical algorithm - vulnerable to quantum attacks")
            }
            (false, r) if r >= 80.0 => {
                (Self::MediumLow, "Classical algorithm with reliability concerns")
            }
            (false, _) => (
                Self::Low,
                "Classical algorithm with significant implementation issues",
            ),
        }
    }

    /// Tiers flagged for review.
    pub fn is_weak(self) -> bool {
        matches!(self, Self::Low | Self::MediumLow)
    }
}

impl fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Key-size note for RSA and AES descriptors.
pub fn key_size_note(descriptor: &AlgorithmDescriptor) -> Option<&'static str> {
    let bits = descriptor.security_parameter;
    match descriptor.family {
        Family::Rsa if bits >= 4096 => Some("Strong key size for current threats"),
        Family::Rsa if bits >= 2048 => Some("Adequate key size but consider upgrading"),
        Family::Rsa => Some("Weak key size - upgrade recommended"),
        Family::Aes if bits >= 256 => Some("Strong symmetric key size"),
        Family::Aes => Some("Consider upgrading to AES-256"),
        _ => None,
    }
}

/// Recommendation for a readiness score (percent).
pub fn readiness_recommendation(score: f64) -> &'static str {
    if score < 25.0 {
        "Low post-quantum cryptography adoption detected. \
         Start evaluating and migrating to quantum-safe algorithms."
    } else if score < 50.0 {
        "Moderate post-quantum cryptography adoption. \
         Accelerate migration to quantum-safe algorithms."
    } else {
        "Good post-quantum cryptography adoption. \
         Continue expanding quantum-safe algorithm usage."
    }
}

#[derive(Serialize)]
struct TestResults {
    total_tests: usize,
    successful_tests: usize,
    success_rate: f64,
}

#[derive(Serialize)]
struct Assessment {
    level: SecurityTier,
    notes: Vec<&'static str>,
    quantum_safe: bool,
}

#[derive(Serialize)]
struct AlgorithmSecurity<'a> {
    algorithm: &'a AlgorithmDescriptor,
    test_results: TestResults,
    security_assessment: Assessment,
}

/// Every catalog algorithm is analysed, whatever the request named.
pub(crate) fn build(scope: &Scope<'_>) -> ReportDraft {
    let analysis: Vec<AlgorithmSecurity<'_>> = scope
        .catalog
        .list_all()
        .iter()
        .map(|algorithm| {
            let total = scope.records_of(&algorithm.name).count();
            let successful = scope
                .records_of(&algorithm.name)
                .filter(|r| r.succeeded)
                .count();
            let success_rate = percentage(successful, total);
            let (level, reliability) = SecurityTier::assess(algorithm.quantum_safe, total, success_rate);
            let notes = std::iter::once(reliability)
                .chain(key_size_note(algorithm))
                .collect();
            AlgorithmSecurity {
                algorithm,
                test_results: TestResults {
                    total_tests: total,
                    successful_tests: successful,
                    success_rate,
                },
                security_assessment: Assessment {
                    level,
                    notes,
                    quantum_safe: algorithm.quantum_safe,
                },
            }
        })
        .collect();

    // Records whose algorithm left the catalog are skipped.
    let (mut pq_tests, mut classical_tests) = (0usize, 0usize);
    for record in &scope.records {
        match scope.catalog.get(&record.algorithm_name) {
            Some(d) if d.quantum_safe => pq_tests += 1,
            Some(_) => classical_tests += 1,
            None => {}
        }
    }
    let readiness = percentage(pq_tests, pq_tests + classical_tests);

    let mut recommendations = vec![readiness_recommendation(readiness).to_string()];
    let weak: Vec<&str> = analysis
        .iter()
        .filter(|a| a.security_assessment.level.is_weak())
        .map(|a| a.algorithm.name.as_str())
        .collect();
    if !weak.is_empty() {
        recommendations.push(format!(
            "Review {} algorithms with security concerns: {}",
            weak.len(),
            weak.join(", ")
        ));
    }

    let mut distribution: BTreeMap<&'static str, usize> =
        SecurityTier::ALL.iter().map(|t| (t.id(), 0)).collect();
    for a in &analysis {
        *distribution
            .entry(a.security_assessment.level.id())
            .or_insert(0) += 1;
    }

    let post_quantum = analysis.iter().filter(|a| a.algorithm.quantum_safe).count();
    let high = distribution.get("high").copied().unwrap_or(0);
    let summary = format!(
        "Security analysis of {} cryptographic algorithms. Quantum readiness score: {readiness:.2}%. \
         Post-quantum algorithms available: {post_quantum}. High security algorithms: {high}.",
        analysis.len()
    );

    let body = json!({
        "security_overview": {
            "total_algorithms_analyzed": analysis.len(),
            "classical_algorithms": analysis.len() - post_quantum,
            "post_quantum_algorithms": post_quantum,
            "quantum_readiness_score": readiness,
            "post_quantum_tests": pq_tests,
            "classical_tests": classical_tests,
        },
        "analysis_period": scope.window.map(|w| w.to_json()),
        "algorithm_analysis": analysis,
        "security_distribution": distribution,
    });

    ReportDraft {
        body,
        summary,
        recommendations,
        covered: scope
            .catalog
            .list_all()
            .iter()
            .map(|d| d.name.clone())
            .collect(),
    }
}
