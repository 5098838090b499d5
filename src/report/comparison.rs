//! Comparison report over the owner's windowed records.

use serde::Serialize;
use serde_json::json;

use super::{first_max_by, first_min_by, percentage, LatencyStats, ReportDraft, Scope};
use crate::crypto::AlgorithmDescriptor;
use crate::errors::LabError;

#[derive(Clone, Debug, Serialize)]
struct ComparedAlgorithm<'a> {
    algorithm: &'a AlgorithmDescriptor,
    total_tests: usize,
    successful_tests: usize,
    success_rate: f64,
    /// Over successful records only.
    latency: LatencyStats,
}

impl ComparedAlgorithm<'_> {
    fn has_data(&self) -> bool {
        self.successful_tests > 0
    }
}

pub(crate) fn build(scope: &Scope<'_>) -> Result<ReportDraft, LabError> {
    if scope.algorithms.len() < 2 {
        return Err(LabError::InsufficientInput(format!(
            "at least 2 distinct algorithms required for comparison, got {}",
            scope.algorithms.len()
        )));
    }

    let compared: Vec<ComparedAlgorithm<'_>> = scope
        .algorithms
        .iter()
        .map(|&algorithm| {
            let total = scope.records_of(&algorithm.name).count();
            let successful: Vec<_> = scope
                .records_of(&algorithm.name)
                .filter(|r| r.succeeded)
                .collect();
            ComparedAlgorithm {
                algorithm,
                total_tests: total,
                successful_tests: successful.len(),
                success_rate: percentage(successful.len(), total),
                latency: LatencyStats::from_records(successful),
            }
        })
        .collect();

    let with_data: Vec<&ComparedAlgorithm<'_>> = compared.iter().filter(|c| c.has_data()).collect();
    let fastest = first_min_by(&with_data, |c| c.latency.mean_ms).copied();
    let slowest = first_max_by(&with_data, |c| c.latency.mean_ms).copied();
    let most_reliable = first_max_by(&with_data, |c| c.success_rate).copied();

    let mut insights = Vec::new();
    if let (Some(fast), Some(slow)) = (fastest, slowest) {
        insights.push(format!(
            "Performance: {} is the fastest ({:.2}ms avg), {} is the slowest ({:.2}ms avg)",
            fast.algorithm.name, fast.latency.mean_ms, slow.algorithm.name, slow.latency.mean_ms
        ));
    }
    if let Some(reliable) = most_reliable {
        insights.push(format!(
            "Reliability: {} has the highest success rate ({:.2}%)",
            reliable.algorithm.name, reliable.success_rate
        ));
    }
    let quantum_safe = compared.iter().filter(|c| c.algorithm.quantum_safe).count();
    let classical = compared.len() - quantum_safe;
    insights.push(format!(
        "Security: {quantum_safe} quantum-safe algorithms, {classical} classical algorithms"
    ));

    let quantum_choice = match fastest {
        Some(fast) if fast.algorithm.quantum_safe => Some(fast),
        Some(_) => {
            let pq: Vec<&ComparedAlgorithm<'_>> = with_data
                .iter()
                .copied()
                .filter(|c| c.algorithm.quantum_safe)
                .collect();
            first_min_by(&pq, |c| c.latency.mean_ms).copied()
        }
        None => None,
    };

    let mut recommendations = Vec::new();
    if quantum_safe > 0 && classical > 0 {
        recommendations.push(
            "Consider migrating from classical to quantum-safe algorithms for future-proof security."
                .to_string(),
        );
    }
    match (fastest, quantum_choice) {
        (Some(fast), Some(choice)) if fast.algorithm.name == choice.algorithm.name => {
            recommendations.push(format!(
                "Recommended: {} offers both good performance and quantum safety.",
                choice.algorithm.name
            ));
        }
        (_, Some(choice)) => recommendations.push(format!(
            "For quantum safety, consider {} ({:.2}ms avg).",
            choice.algorithm.name, choice.latency.mean_ms
        )),
        _ => {}
    }

    let mut ranking = with_data.clone();
    ranking.sort_by(|a, b| a.latency.mean_ms.total_cmp(&b.latency.mean_ms));

    let mut summary = format!(
        "Comparison of {} algorithms over {} days.",
        compared.len(),
        scope.window_days()
    );
    if let Some(fast) = fastest {
        summary.push_str(&format!(" Performance leader: {}.", fast.algorithm.name));
    }
    summary.push_str(&format!(
        " Quantum-safe algorithms: {quantum_safe}/{}.",
        compared.len()
    ));

    let name = |c: Option<&ComparedAlgorithm<'_>>| c.map(|c| c.algorithm.name.clone());
    let body = json!({
        "comparison_parameters": {
            "algorithms_compared": compared.len(),
            "analysis_period": scope.window.map(|w| w.to_json()),
        },
        "algorithm_comparison": compared,
        "performance_ranking": ranking.iter().map(|c| &c.algorithm.name).collect::<Vec<_>>(),
        "fastest": name(fastest),
        "slowest": name(slowest),
        "most_reliable": name(most_reliable),
        "quantum_safe_choice": name(quantum_choice),
        "security_analysis": {
            "quantum_safe_algorithms": quantum_safe,
            "classical_algorithms": classical,
        },
        "insights": insights,
    });

    Ok(ReportDraft {
        body,
        summary,
        recommendations,
        covered: compared.iter().map(|c| c.algorithm.name.clone()).collect(),
    })
}
