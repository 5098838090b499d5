//! Performance report: latency statistics over successful records, ranked
//! fastest first.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use super::{LatencyStats, ReportDraft, Scope};
use crate::crypto::AlgorithmDescriptor;
use crate::records::OperationKind;

/// One analysed algorithm.
#[derive(Clone, Debug, Serialize)]
pub struct AlgorithmPerformance<'a> {
    /// Catalog entry.
    pub algorithm: &'a AlgorithmDescriptor,
    /// Statistics over successful records.
    pub metrics: LatencyStats,
    /// Successful records per executed operation.
    pub test_distribution: BTreeMap<OperationKind, usize>,
}

/// With no requested algorithms, every catalog entry that appears in the
/// scoped records is analysed.
pub(crate) fn build(scope: &Scope<'_>) -> ReportDraft {
    let algorithms: Vec<&AlgorithmDescriptor> = if scope.algorithms.is_empty() {
        scope
            .catalog
            .list_all()
            .iter()
            .filter(|d| scope.records.iter().any(|r| r.algorithm_name == d.name))
            .collect()
    } else {
        scope.algorithms.clone()
    };

    let rows: Vec<AlgorithmPerformance<'_>> = algorithms
        .iter()
        .map(|&algorithm| {
            let successful: Vec<_> = scope
                .records_of(&algorithm.name)
                .filter(|r| r.succeeded)
                .collect();
            let mut test_distribution = BTreeMap::new();
            for r in &successful {
                *test_distribution.entry(r.operation).or_insert(0) += 1;
            }
            AlgorithmPerformance {
                algorithm,
                metrics: LatencyStats::from_records(successful),
                test_distribution,
            }
        })
        .collect();

    let mut ranked: Vec<&AlgorithmPerformance<'_>> =
        rows.iter().filter(|r| r.metrics.count > 0).collect();
    ranked.sort_by(|a, b| a.metrics.mean_ms.total_cmp(&b.metrics.mean_ms));

    let quantum_safe_count = rows.iter().filter(|r| r.algorithm.quantum_safe).count();
    let total_tests: usize = rows.iter().map(|r| r.metrics.count).sum();

    let mut recommendations = Vec::new();
    match (ranked.first(), ranked.last()) {
        (Some(fastest), Some(slowest)) => {
            recommendations.push(format!(
                "Best performing algorithm: {} with average execution time of {:.2}ms",
                fastest.algorithm.name, fastest.metrics.mean_ms
            ));
            if ranked.len() > 1 {
                recommendations.push(format!(
                    "Consider optimizing {} as it has the highest average execution time of {:.2}ms",
                    slowest.algorithm.name, slowest.metrics.mean_ms
                ));
            }
            if quantum_safe_count > 0 {
                recommendations.push(format!(
                    "Found {quantum_safe_count} quantum-safe algorithms in your tests. \
                     Consider migrating to post-quantum cryptography for future-proof security."
                ));
            }
        }
        _ => recommendations
            .push("No test data available for the selected algorithms and time period.".into()),
    }

    let mut summary = format!(
        "Performance analysis of {} algorithms over {} days. Total tests analyzed: {total_tests}.",
        rows.len(),
        scope.window_days()
    );
    if let Some(best) = ranked.first() {
        summary.push_str(&format!(
            " Best performer: {} ({:.2}ms avg).",
            best.algorithm.name, best.metrics.mean_ms
        ));
    }

    let body = json!({
        "analysis_period": scope.window.map(|w| w.to_json()),
        "algorithms_analyzed": rows.len(),
        "performance_data": rows,
        "performance_ranking": ranked.iter().map(|r| &r.algorithm.name).collect::<Vec<_>>(),
        "summary_statistics": {
            "total_tests": total_tests,
            "algorithms_with_data": ranked.len(),
            "quantum_safe_count": quantum_safe_count,
        },
    });

    ReportDraft {
        body,
        summary,
        recommendations,
        covered: rows.iter().map(|r| r.algorithm.name.clone()).collect(),
    }
}
