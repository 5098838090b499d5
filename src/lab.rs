//! The `Lab` facade: one catalog, one record store, and the engines that
//! read and write through them.
//!
//! Every operation takes the owner id explicitly; nothing here is global.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analytics::{self, ExportFilters, PerformanceTrends, TestExport, TestStatistics};
use crate::comparison::{ComparisonEngine, ComparisonRow};
use crate::config::LabConfig;
use crate::crypto::registry::default_catalog;
use crate::crypto::AlgorithmCatalog;
use crate::errors::LabError;
use crate::harness::{TestHarness, TestOutcome, TestRequest};
use crate::records::{ReportKind, ReportRecord, TestRecord};
use crate::report::{ReportEngine, ReportRequest};
use crate::store::{JsonFileStore, RecordStore, TestFilter};

/// Entry of [`Lab::report_kinds`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportKindInfo {
    pub kind: ReportKind,
    pub title: &'static str,
    pub description: &'static str,
}

pub struct Lab {
    catalog: Arc<AlgorithmCatalog>,
    store: Arc<dyn RecordStore>,
    harness: TestHarness,
    comparison: ComparisonEngine,
    reports: ReportEngine,
    default_window_days: u32,
}

fn require_owner(owner_id: &str) -> Result<(), LabError> {
    if owner_id.trim().is_empty() {
        return Err(LabError::Validation("owner id must not be empty".into()));
    }
    Ok(())
}

fn require_days(days: u32) -> Result<u32, LabError> {
    if days == 0 {
        return Err(LabError::Validation("days must be at least 1".into()));
    }
    Ok(days)
}

impl Lab {
    pub fn new(
        catalog: Arc<AlgorithmCatalog>,
        store: Arc<dyn RecordStore>,
        default_window_days: u32,
    ) -> Self {
        let default_window_days = default_window_days.max(1);
        Self {
            comparison: ComparisonEngine::new(Arc::clone(&catalog)),
            reports: ReportEngine::new(Arc::clone(&catalog), default_window_days),
            harness: TestHarness::new(),
            catalog,
            store,
            default_window_days,
        }
    }

    /// Standard catalog over the JSON store named by `config`.
    pub fn from_config(config: &LabConfig) -> Result<Self, LabError> {
        let store = JsonFileStore::open(&config.store_path)?;
        Ok(Self::new(
            Arc::new(default_catalog()),
            Arc::new(store),
            config.default_window_days,
        ))
    }

    pub fn catalog(&self) -> &AlgorithmCatalog {
        &self.catalog
    }

    /// Runs one operation and persists its record before returning it.
    ///
    /// Primitive failures come back inside the outcome as a failed record.
    /// An unknown algorithm is `NotFound` and writes nothing.
    pub fn run_test(&self, owner_id: &str, request: &TestRequest) -> Result<TestOutcome, LabError> {
        require_owner(owner_id)?;
        let name = request.algorithm.trim();
        if name.is_empty() {
            return Err(LabError::Validation("algorithm name must not be empty".into()));
        }
        let mut algorithm = self.catalog.instantiate(name)?;
        let outcome = self.harness.execute(
            algorithm.as_mut(),
            owner_id,
            request.operation,
            &request.input,
        );
        self.store.insert_test(outcome.record.clone())?;
        info!(
            algorithm = name,
            operation = %outcome.record.operation,
            succeeded = outcome.record.succeeded,
            elapsed_ms = outcome.record.elapsed_millis,
            "test recorded"
        );
        Ok(outcome)
    }

    /// Triad comparison; nothing is persisted.
    pub fn compare(&self, names: &[String], input: &str) -> Result<Vec<ComparisonRow>, LabError> {
        self.comparison.compare(names, input)
    }

    /// Generates a report over the owner's records and stores it.
    pub fn generate_report(
        &self,
        owner_id: &str,
        request: &ReportRequest,
    ) -> Result<ReportRecord, LabError> {
        require_owner(owner_id)?;
        let records = self.store.query_tests(&TestFilter::owner(owner_id))?;
        let report = self
            .reports
            .generate(owner_id, request, &records, OffsetDateTime::now_utc())?;
        self.store.insert_report(report.clone())?;
        Ok(report)
    }

    pub fn list_tests(&self, filter: &TestFilter) -> Result<Vec<TestRecord>, LabError> {
        require_owner(&filter.owner_id)?;
        Ok(self.store.query_tests(filter)?)
    }

    pub fn get_test(&self, owner_id: &str, id: Uuid) -> Result<TestRecord, LabError> {
        self.store
            .get_test(owner_id, id)?
            .ok_or_else(|| LabError::not_found("test", id.to_string()))
    }

    pub fn delete_test(&self, owner_id: &str, id: Uuid) -> Result<(), LabError> {
        if !self.store.delete_test(owner_id, id)? {
            return Err(LabError::not_found("test", id.to_string()));
        }
        debug!(%id, "test deleted");
        Ok(())
    }

    /// Deletes all of `ids` or none of them.
    pub fn delete_tests(&self, owner_id: &str, ids: &[Uuid]) -> Result<usize, LabError> {
        if ids.is_empty() {
            return Err(LabError::Validation("no test ids given".into()));
        }
        let deleted = self.store.delete_tests(owner_id, ids)?;
        info!(deleted, "tests deleted");
        Ok(deleted)
    }

    pub fn list_reports(
        &self,
        owner_id: &str,
        kind: Option<ReportKind>,
    ) -> Result<Vec<ReportRecord>, LabError> {
        require_owner(owner_id)?;
        Ok(self.store.list_reports(owner_id, kind)?)
    }

    pub fn get_report(&self, owner_id: &str, id: Uuid) -> Result<ReportRecord, LabError> {
        self.store
            .get_report(owner_id, id)?
            .ok_or_else(|| LabError::not_found("report", id.to_string()))
    }

    pub fn delete_report(&self, owner_id: &str, id: Uuid) -> Result<(), LabError> {
        if !self.store.delete_report(owner_id, id)? {
            return Err(LabError::not_found("report", id.to_string()));
        }
        debug!(%id, "report deleted");
        Ok(())
    }

    pub fn report_kinds(&self) -> Vec<ReportKindInfo> {
        ReportKind::ALL
            .into_iter()
            .map(|kind| ReportKindInfo {
                kind,
                title: kind.title(),
                description: kind.description(),
            })
            .collect()
    }

    /// Owner statistics; `days` defaults to the configured window.
    pub fn statistics(&self, owner_id: &str, days: Option<u32>) -> Result<TestStatistics, LabError> {
        require_owner(owner_id)?;
        let days = require_days(days.unwrap_or(self.default_window_days))?;
        let records = self.store.query_tests(&TestFilter::owner(owner_id))?;
        Ok(analytics::statistics(
            &records,
            days,
            OffsetDateTime::now_utc(),
        ))
    }

    pub fn trends(
        &self,
        owner_id: &str,
        algorithm: &str,
        days: Option<u32>,
    ) -> Result<PerformanceTrends, LabError> {
        require_owner(owner_id)?;
        let days = require_days(days.unwrap_or(analytics::DEFAULT_TREND_DAYS))?;
        let descriptor = self.catalog.lookup(algorithm.trim())?;
        let records = self
            .store
            .query_tests(&TestFilter::owner(owner_id).algorithm(&descriptor.name))?;
        Ok(analytics::performance_trends(
            descriptor,
            &records,
            days,
            OffsetDateTime::now_utc(),
        ))
    }

    pub fn export(&self, owner_id: &str, filters: ExportFilters) -> Result<TestExport, LabError> {
        require_owner(owner_id)?;
        if let Some(days) = filters.days {
            require_days(days)?;
        }
        let now = OffsetDateTime::now_utc();
        let records = self.store.query_tests(&filters.to_filter(owner_id, now))?;
        Ok(analytics::export(&self.catalog, owner_id, records, filters, now))
    }
}
