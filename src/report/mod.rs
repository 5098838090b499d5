//! Report engine: turns historical test records into performance, security
//! and comparison reports.
//!
//! Generation is a pure function of `(records, catalog, request, now)`. The
//! engine never runs a primitive and never mutates a test record; the
//! caller persists the returned [`ReportRecord`].
//!
//! | Module | Report |
//! |--------|--------|
//! | [`performance`] | latency statistics, ranking, recommendations |
//! | [`security`] | tier per catalog entry, quantum-readiness score |
//! | [`comparison`] | success rate and latency of chosen algorithms |

pub mod comparison;
pub mod performance;
pub mod security;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::crypto::{AlgorithmCatalog, AlgorithmDescriptor};
use crate::errors::LabError;
use crate::records::{ReportKind, ReportRecord, TestRecord};

/// Count, mean, extremes and population standard deviation of latencies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean (ms).
    pub mean_ms: f64,
    /// Minimum (ms).
    pub min_ms: f64,
    /// Maximum (ms).
    pub max_ms: f64,
    /// Population standard deviation (ms).
    pub std_dev_ms: f64,
}

impl LatencyStats {
    /// Statistics over `samples`; all zero when empty.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: samples.len(),
            mean_ms: mean,
            min_ms: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev_ms: variance.sqrt(),
        }
    }

    /// Statistics over the elapsed times of `records`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TestRecord>) -> Self {
        let samples: Vec<f64> = records.into_iter().map(|r| r.elapsed_millis).collect();
        Self::from_samples(&samples)
    }
}

/// First item with the smallest key.
pub(crate) fn first_min_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().fold(None, |best, item| match best {
        Some(b) if key(b) <= key(item) => Some(b),
        _ => Some(item),
    })
}

/// First item with the largest key.
pub(crate) fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().fold(None, |best, item| match best {
        Some(b) if key(b) >= key(item) => Some(b),
        _ => Some(item),
    })
}

/// `part / whole` as a percentage, 0 when `whole` is 0.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub(crate) fn rfc3339(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}

/// Report invocation surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    /// Report kind.
    pub kind: ReportKind,
    /// Algorithms to analyse; `None` lets the kind decide.
    pub algorithms: Option<Vec<String>>,
    /// Trailing window in days.
    pub window_days: Option<u32>,
    /// Title; defaults to `"<Kind title> - YYYY-MM-DD"`.
    pub title: Option<String>,
}

impl ReportRequest {
    /// A request with every option unset.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            algorithms: None,
            window_days: None,
            title: None,
        }
    }

    /// Sets the algorithm list.
    pub fn algorithms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.algorithms = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the trailing window.
    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = Some(days);
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Trailing time window ending at generation time.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Window {
    pub(crate) days: u32,
    pub(crate) start: OffsetDateTime,
    pub(crate) end: OffsetDateTime,
}

impl Window {
    fn ending_at(end: OffsetDateTime, days: u32) -> Self {
        Self {
            days,
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub(crate) fn to_json(self) -> Value {
        json!({
            "days": self.days,
            "start_date": rfc3339(self.start),
            "end_date": rfc3339(self.end),
        })
    }
}

/// Everything one report kind aggregates over.
pub(crate) struct Scope<'a> {
    pub(crate) catalog: &'a AlgorithmCatalog,
    /// Resolved requested algorithms, distinct, in request order.
    pub(crate) algorithms: Vec<&'a AlgorithmDescriptor>,
    /// The owner's records inside the window.
    pub(crate) records: Vec<&'a TestRecord>,
    pub(crate) window: Option<Window>,
}

impl<'a> Scope<'a> {
    pub(crate) fn records_of<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = &'a TestRecord> + 's {
        self.records
            .iter()
            .copied()
            .filter(move |r| r.algorithm_name == name)
    }

    pub(crate) fn window_days(&self) -> u32 {
        self.window.map_or(0, |w| w.days)
    }
}

/// Body, narrative and coverage of one report, before it gets an identity.
pub(crate) struct ReportDraft {
    pub(crate) body: Value,
    pub(crate) summary: String,
    pub(crate) recommendations: Vec<String>,
    pub(crate) covered: BTreeSet<String>,
}

/// Builds report records from a catalog and a record snapshot.
pub struct ReportEngine {
    catalog: Arc<AlgorithmCatalog>,
    default_window_days: u32,
}

impl ReportEngine {
    /// `default_window_days` applies to performance and comparison reports
    /// when the request names no window.
    pub fn new(catalog: Arc<AlgorithmCatalog>, default_window_days: u32) -> Self {
        Self {
            catalog,
            default_window_days: default_window_days.max(1),
        }
    }

    /// Generates one report for `owner_id` over `records`.
    ///
    /// Records of other owners and records outside the window are ignored.
    /// Fails with `Validation` for an empty owner or a zero-day window,
    /// `NotFound` for an unknown requested algorithm, and
    /// `InsufficientInput` for a comparison of fewer than two algorithms.
    pub fn generate(
        &self,
        owner_id: &str,
        request: &ReportRequest,
        records: &[TestRecord],
        now: OffsetDateTime,
    ) -> Result<ReportRecord, LabError> {
        if owner_id.trim().is_empty() {
            return Err(LabError::Validation("owner id must not be empty".into()));
        }
        if request.window_days == Some(0) {
            return Err(LabError::Validation("window_days must be at least 1".into()));
        }
        let algorithms = self.resolve(request.algorithms.as_deref().unwrap_or_default())?;

        let window_days = match request.kind {
            ReportKind::Security => request.window_days,
            ReportKind::Performance | ReportKind::Comparison => {
                Some(request.window_days.unwrap_or(self.default_window_days))
            }
        };
        let window = window_days.map(|days| Window::ending_at(now, days));
        let scope = Scope {
            catalog: &self.catalog,
            algorithms,
            records: records
                .iter()
                .filter(|r| r.owner_id == owner_id)
                .filter(|r| window.map_or(true, |w| r.timestamp >= w.start))
                .collect(),
            window,
        };

        let draft = match request.kind {
            ReportKind::Performance => performance::build(&scope),
            ReportKind::Security => security::build(&scope),
            ReportKind::Comparison => comparison::build(&scope)?,
        };

        info!(
            kind = %request.kind,
            records = scope.records.len(),
            algorithms = draft.covered.len(),
            "report generated"
        );

        Ok(ReportRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            title: request
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("{} - {}", request.kind.title(), now.date())),
            kind: request.kind,
            body: draft.body,
            narrative_summary: draft.summary,
            recommendations: draft.recommendations,
            algorithms_covered: draft.covered,
            timestamp: now,
        })
    }

    fn resolve(&self, names: &[String]) -> Result<Vec<&AlgorithmDescriptor>, LabError> {
        let mut out: Vec<&AlgorithmDescriptor> = Vec::new();
        for name in names {
            let descriptor = self.catalog.lookup(name.trim())?;
            if !out.iter().any(|d| d.name == descriptor.name) {
                out.push(descriptor);
            }
        }
        Ok(out)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use crate::crypto::registry::default_catalog;
    use time::macros::datetime;

    #[test]
    fn latency_stats_population_std_dev() {
        let stats = LatencyStats::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!((stats.mean_ms - 5.0).abs() < 1e-12);
        assert!((stats.std_dev_ms - 2.0).abs() < 1e-12);
        assert_eq!(stats.min_ms, 2.0);
        assert_eq!(stats.max_ms, 9.0);
        assert_eq!(LatencyStats::from_samples(&[]), LatencyStats::default());
        assert_eq!(LatencyStats::from_samples(&[3.5]).std_dev_ms, 0.0);
    }

    #[test]
    fn extremes_prefer_first_on_ties() {
        let items = [("a", 1.0), ("b", 3.0), ("c", 1.0), ("d", 3.0)];
        assert_eq!(first_min_by(&items, |i| i.1).unwrap().0, "a");
        assert_eq!(first_max_by(&items, |i| i.1).unwrap().0, "b");
        assert!(first_min_by(&[] as &[(&str, f64)], |i| i.1).is_none());
    }

    #[test]
    fn request_validation() {
        let catalog = Arc::new(default_catalog());
        let engine = ReportEngine::new(catalog, 30);
        let now = datetime!(2024-03-01 12:00 UTC);

        let zero = ReportRequest::new(ReportKind::Performance).window_days(0);
        assert_eq!(engine.generate("alice", &zero, &[], now).unwrap_err().kind(), "validation");

        let unknown = ReportRequest::new(ReportKind::Performance).algorithms(["DES"]);
        assert_eq!(engine.generate("alice", &unknown, &[], now).unwrap_err().kind(), "not_found");

        let blank_owner = ReportRequest::new(ReportKind::Security);
        assert_eq!(engine.generate(" ", &blank_owner, &[], now).unwrap_err().kind(), "validation");
    }

    #[test]
    fn default_title_and_owner_scoping() {
        let catalog = Arc::new(default_catalog());
        let engine = ReportEngine::new(catalog.clone(), 30);
        let now = datetime!(2024-03-01 12:00 UTC);
        let records = vec![
            record(&catalog, "alice", "AES-256", true, 1.0, now, 1),
            record(&catalog, "bob", "AES-128", true, 1.0, now, 1),
            record(&catalog, "alice", "AES-128", true, 1.0, now, 45),
        ];
        let report = engine
            .generate("alice", &ReportRequest::new(ReportKind::Performance), &records, now)
            .unwrap();
        assert_eq!(report.title, "Performance Analysis - 2024-03-01");
        assert_eq!(report.owner_id, "alice");
        assert_eq!(
            report.algorithms_covered.iter().collect::<Vec<_>>(),
            ["AES-256"]
        );
        assert_eq!(report.body["analysis_period"]["days"], 30);
    }
}
