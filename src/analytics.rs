//! Record analytics: owner statistics, per-algorithm performance trends,
//! and JSON export.
//!
//! Like the report engine these are pure functions over a record snapshot;
//! [`crate::lab::Lab`] supplies the owner's records from the store.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::crypto::{AlgorithmCatalog, AlgorithmDescriptor, Family};
use crate::records::{OperationKind, TestRecord};
use crate::report::{percentage, LatencyStats};
use crate::store::TestFilter;

/// Days of activity listed by [`statistics`].
pub const ACTIVITY_DAYS: i64 = 7;

/// Default span of [`performance_trends`].
pub const DEFAULT_TREND_DAYS: u32 = 7;

fn utc_date(t: OffsetDateTime) -> Date {
    t.to_offset(UtcOffset::UTC).date()
}

/// Counts over an owner's records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overview {
    /// All records.
    pub total_tests: usize,
    /// Records inside the window.
    pub recent_tests: usize,
    /// Successful records.
    pub successful_tests: usize,
    /// Failed records.
    pub failed_tests: usize,
    /// `successful / total` in percent.
    pub success_rate: f64,
}

/// Latency of one algorithm's successful records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlgorithmLatency {
    /// Catalog name.
    pub algorithm: String,
    /// Statistics.
    #[serde(flatten)]
    pub latency: LatencyStats,
}

/// Records created on one UTC day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Records that day.
    pub count: usize,
}

/// Output of [`statistics`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestStatistics {
    pub overview: Overview,
    pub family_distribution: BTreeMap<Family, usize>,
    pub operation_distribution: BTreeMap<OperationKind, usize>,
    pub performance_metrics: Vec<AlgorithmLatency>,
    /// Last seven UTC days, most recent first.
    pub daily_activity: Vec<DailyCount>,
    pub period_days: u32,
}

/// Statistics over one owner's `records`.
pub fn statistics(records: &[TestRecord], window_days: u32, now: OffsetDateTime) -> TestStatistics {
    let since = now - Duration::days(i64::from(window_days));
    let successful = records.iter().filter(|r| r.succeeded).count();

    let mut family_distribution = BTreeMap::new();
    let mut operation_distribution = BTreeMap::new();
    let mut by_algorithm: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        *family_distribution.entry(r.context.family).or_insert(0) += 1;
        *operation_distribution.entry(r.operation).or_insert(0) += 1;
        if r.succeeded {
            by_algorithm
                .entry(r.algorithm_name.as_str())
                .or_default()
                .push(r.elapsed_millis);
        }
    }

    let today = utc_date(now);
    let daily_activity = (0..ACTIVITY_DAYS)
        .map(|i| {
            let day = today - Duration::days(i);
            DailyCount {
                date: day.to_string(),
                count: records.iter().filter(|r| utc_date(r.timestamp) == day).count(),
            }
        })
        .collect();

    TestStatistics {
        overview: Overview {
            total_tests: records.len(),
            recent_tests: records.iter().filter(|r| r.timestamp >= since).count(),
            successful_tests: successful,
            failed_tests: records.len() - successful,
            success_rate: percentage(successful, records.len()),
        },
        family_distribution,
        operation_distribution,
        performance_metrics: by_algorithm
            .into_iter()
            .map(|(algorithm, samples)| AlgorithmLatency {
                algorithm: algorithm.to_string(),
                latency: LatencyStats::from_samples(&samples),
            })
            .collect(),
        daily_activity,
        period_days: window_days,
    }
}

/// Direction of an algorithm's daily mean latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Last day's mean is more than 10% above the first day's.
    Degrading,
    /// Last day's mean is more than 10% below the first day's.
    Improving,
    Stable,
    /// Data for a single day only.
    InsufficientData,
    NoData,
}

/// One UTC day of successful records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyPerformance {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Statistics for that day.
    #[serde(flatten)]
    pub latency: LatencyStats,
}

/// Output of [`performance_trends`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceTrends {
    pub algorithm: AlgorithmDescriptor,
    pub days: u32,
    /// Sorted by date, oldest first.
    pub trends: Vec<DailyPerformance>,
    pub total_tests: usize,
    pub avg_execution_time_ms: f64,
    pub trend_direction: TrendDirection,
}

/// Daily latency of `algorithm` over the successful records of the last
/// `days` days.
pub fn performance_trends(
    algorithm: &AlgorithmDescriptor,
    records: &[TestRecord],
    days: u32,
    now: OffsetDateTime,
) -> PerformanceTrends {
    let since = now - Duration::days(i64::from(days));
    let relevant: Vec<&TestRecord> = records
        .iter()
        .filter(|r| r.algorithm_name == algorithm.name && r.succeeded && r.timestamp >= since)
        .collect();

    let mut per_day: BTreeMap<Date, Vec<f64>> = BTreeMap::new();
    for r in &relevant {
        per_day
            .entry(utc_date(r.timestamp))
            .or_default()
            .push(r.elapsed_millis);
    }
    let trends: Vec<DailyPerformance> = per_day
        .into_iter()
        .map(|(date, samples)| DailyPerformance {
            date: date.to_string(),
            latency: LatencyStats::from_samples(&samples),
        })
        .collect();

    let trend_direction = match (trends.first(), trends.last()) {
        (None, _) | (_, None) => TrendDirection::NoData,
        _ if trends.len() < 2 => TrendDirection::InsufficientData,
        (Some(first), Some(last)) => {
            let (first, last) = (first.latency.mean_ms, last.latency.mean_ms);
            if last > first * 1.1 {
                TrendDirection::Degrading
            } else if last < first * 0.9 {
                TrendDirection::Improving
            } else {
                TrendDirection::Stable
            }
        }
    };

    PerformanceTrends {
        algorithm: algorithm.clone(),
        days,
        total_tests: relevant.len(),
        avg_execution_time_ms: LatencyStats::from_records(relevant.iter().copied()).mean_ms,
        trends,
        trend_direction,
    }
}

/// Filters accepted by [`export`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportFilters {
    pub algorithm: Option<String>,
    pub operation: Option<OperationKind>,
    pub success_only: bool,
    pub days: Option<u32>,
}

impl ExportFilters {
    /// The store query these filters describe.
    pub fn to_filter(&self, owner_id: &str, now: OffsetDateTime) -> TestFilter {
        TestFilter {
            owner_id: owner_id.to_string(),
            algorithm: self.algorithm.clone(),
            operation: self.operation,
            success_only: self.success_only,
            since: self.days.map(|d| now - Duration::days(i64::from(d))),
        }
    }
}

/// One exported record with its descriptor (`None` when dangling).
#[derive(Clone, Debug, Serialize)]
pub struct ExportedTest {
    #[serde(flatten)]
    pub record: TestRecord,
    pub algorithm: Option<AlgorithmDescriptor>,
}

/// Export header.
#[derive(Clone, Debug, Serialize)]
pub struct ExportMetadata {
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub exported_by: String,
    pub total_tests: usize,
    pub filters_applied: ExportFilters,
}

/// Output of [`export`].
#[derive(Clone, Debug, Serialize)]
pub struct TestExport {
    pub metadata: ExportMetadata,
    pub tests: Vec<ExportedTest>,
}

/// Packages `records` (already filtered, newest first) for export.
pub fn export(
    catalog: &AlgorithmCatalog,
    owner_id: &str,
    records: Vec<TestRecord>,
    filters: ExportFilters,
    now: OffsetDateTime,
) -> TestExport {
    let tests: Vec<ExportedTest> = records
        .into_iter()
        .map(|record| ExportedTest {
            algorithm: catalog.get(&record.algorithm_name).cloned(),
            record,
        })
        .collect();
    TestExport {
        metadata: ExportMetadata {
            exported_at: now,
            exported_by: owner_id.to_string(),
            total_tests: tests.len(),
            filters_applied: filters,
        },
        tests,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::registry::default_catalog;
    use crate::report::fixtures::record;
    use time::macros::datetime;

    #[test]
    fn statistics_overview_and_activity() {
        let catalog = default_catalog();
        let now = datetime!(2024-03-10 12:00 UTC);
        let records = vec![
            record(&catalog, "alice", "AES-256", true, 2.0, now, 0),
            record(&catalog, "alice", "AES-256", true, 4.0, now, 2),
            record(&catalog, "alice", "Kyber-512", false, 0.0, now, 2),
            record(&catalog, "alice", "RSA-2048", true, 9.0, now, 40),
        ];
        let stats = statistics(&records, 30, now);

        assert_eq!(stats.overview.total_tests, 4);
        assert_eq!(stats.overview.recent_tests, 3);
        assert_eq!(stats.overview.failed_tests, 1);
        assert_eq!(stats.overview.success_rate, 75.0);
        assert_eq!(stats.family_distribution.get(&Family::Aes), Some(&2));
        assert_eq!(
            stats.operation_distribution.get(&OperationKind::Encryption),
            Some(&4)
        );

        let aes = &stats.performance_metrics[0];
        assert_eq!(aes.algorithm, "AES-256");
        assert_eq!(aes.latency.mean_ms, 3.0);
        assert_eq!(stats.performance_metrics.len(), 2);

        assert_eq!(stats.daily_activity.len(), 7);
        assert_eq!(stats.daily_activity[0].date, "2024-03-10");
        assert_eq!(stats.daily_activity[0].count, 1);
        assert_eq!(stats.daily_activity[2].count, 2);
    }

    #[test]
    fn trend_directions() {
        let catalog = default_catalog();
        let aes = catalog.get("AES-128").unwrap();
        let now = datetime!(2024-03-10 12:00 UTC);

        let none = performance_trends(aes, &[], 7, now);
        assert_eq!(none.trend_direction, TrendDirection::NoData);
        assert_eq!(none.total_tests, 0);

        let one_day = vec![
            record(&catalog, "alice", "AES-128", true, 1.0, now, 1),
            record(&catalog, "alice", "AES-128", true, 3.0, now, 1),
        ];
        let t = performance_trends(aes, &one_day, 7, now);
        assert_eq!(t.trend_direction, TrendDirection::InsufficientData);
        assert_eq!(t.trends[0].latency.count, 2);

        let slower = vec![
            record(&catalog, "alice", "AES-128", true, 1.0, now, 3),
            record(&catalog, "alice", "AES-128", true, 1.5, now, 0),
        ];
        assert_eq!(
            performance_trends(aes, &slower, 7, now).trend_direction,
            TrendDirection::Degrading
        );

        let faster = vec![
            record(&catalog, "alice", "AES-128", true, 2.0, now, 3),
            record(&catalog, "alice", "AES-128", true, 1.0, now, 0),
            record(&catalog, "alice", "AES-128", true, 0.1, now, 30),
        ];
        let t = performance_trends(aes, &faster, 7, now);
        assert_eq!(t.trend_direction, TrendDirection::Improving);
        assert_eq!(t.trends.len(), 2);
        assert!(t.trends[0].date < t.trends[1].date);

        let steady = vec![
            record(&catalog, "alice", "AES-128", true, 1.0, now, 3),
            record(&catalog, "alice", "AES-128", true, 1.05, now, 0),
        ];
        assert_eq!(
            performance_trends(aes, &steady, 7, now).trend_direction,
            TrendDirection::Stable
        );
    }

    #[test]
    fn export_attaches_descriptors() {
        let catalog = default_catalog();
        let now = datetime!(2024-03-10 12:00 UTC);
        let records = vec![
            record(&catalog, "alice", "AES-256", true, 1.0, now, 0),
            record(&catalog, "alice", "Retired-Cipher", true, 1.0, now, 0),
        ];
        let filters = ExportFilters {
            success_only: true,
            ..ExportFilters::default()
        };
        let out = export(&catalog, "alice", records, filters, now);
        assert_eq!(out.metadata.total_tests, 2);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["metadata"]["exported_at"], "2024-03-10T12:00:00Z");
        assert_eq!(json["metadata"]["filters_applied"]["success_only"], true);
        assert_eq!(json["tests"][0]["algorithm"]["family"], "AES");
        assert_eq!(json["tests"][0]["algorithm_name"], "AES-256");
        assert!(json["tests"][1]["algorithm"].is_null());
    }

    #[test]
    fn export_filters_map_to_store_query() {
        let now = datetime!(2024-03-10 12:00 UTC);
        let filter = ExportFilters {
            algorithm: Some("AES-256".into()),
            days: Some(2),
            ..ExportFilters::default()
        }
        .to_filter("alice", now);
        assert_eq!(filter.owner_id, "alice");
        assert_eq!(filter.since, Some(datetime!(2024-03-08 12:00 UTC)));
    }
}
