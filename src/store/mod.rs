//! Record store contract.
//!
//! The lab persists every test attempt and every generated report through
//! [`RecordStore`]. All reads and deletes are scoped to an owner: a caller
//! never sees or removes another owner's records.
//!
//! | Backend | Durability |
//! |---------|-----------|
//! | [`InMemoryRecordStore`] | process lifetime |
//! | [`JsonFileStore`] | JSON snapshot rewritten after each mutation |

mod file;
mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::records::{OperationKind, ReportKind, ReportRecord, TestRecord};

pub use file::JsonFileStore;
pub use memory::InMemoryRecordStore;

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store failures.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying file I/O failed.
    Io(String),
    /// Persisted state could not be parsed or serialized.
    Corrupt(String),
    /// A lock was poisoned by a panicking writer.
    Poisoned,
    /// A bulk operation named identifiers the owner does not have.
    MissingRecords {
        /// `"test"` or `"report"`.
        entity: &'static str,
        /// Identifiers that did not resolve.
        ids: Vec<Uuid>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O failure: {msg}"),
            Self::Corrupt(msg) => write!(f, "corrupt store: {msg}"),
            Self::Poisoned => f.write_str("store lock poisoned"),
            Self::MissingRecords { entity, ids } => {
                write!(f, "{} {entity} record(s) not found", ids.len())
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Query over one owner's test records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestFilter {
    /// Owner whose records are searched.
    pub owner_id: String,
    /// Restrict to one algorithm name.
    pub algorithm: Option<String>,
    /// Restrict to one executed operation.
    pub operation: Option<OperationKind>,
    /// Only successful records.
    pub success_only: bool,
    /// Only records at or after this instant.
    pub since: Option<OffsetDateTime>,
}

impl TestFilter {
    /// Every record of `owner_id`.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            algorithm: None,
            operation: None,
            success_only: false,
            since: None,
        }
    }

    /// Restricts to one algorithm.
    pub fn algorithm(mut self, name: impl Into<String>) -> Self {
        self.algorithm = Some(name.into());
        self
    }

    /// Restricts to one operation kind.
    pub fn operation(mut self, kind: OperationKind) -> Self {
        self.operation = Some(kind);
        self
    }

    /// Keeps successful records only.
    pub fn successful(mut self) -> Self {
        self.success_only = true;
        self
    }

    /// Keeps records at or after `since`.
    pub fn since(mut self, since: OffsetDateTime) -> Self {
        self.since = Some(since);
        self
    }

    /// Whether `record` passes every criterion.
    pub fn matches(&self, record: &TestRecord) -> bool {
        record.owner_id == self.owner_id
            && self
                .algorithm
                .as_deref()
                .map_or(true, |a| record.algorithm_name == a)
            && self.operation.map_or(true, |k| record.operation == k)
            && (!self.success_only || record.succeeded)
            && self.since.map_or(true, |t| record.timestamp >= t)
    }
}

/// Durable home of test and report records.
pub trait RecordStore: Send + Sync {
    /// Appends a test record and returns its id.
    fn insert_test(&self, record: TestRecord) -> StoreResult<Uuid>;

    /// Appends a report record and returns its id.
    fn insert_report(&self, record: ReportRecord) -> StoreResult<Uuid>;

    /// Records matching `filter`, newest first.
    fn query_tests(&self, filter: &TestFilter) -> StoreResult<Vec<TestRecord>>;

    /// One of `owner_id`'s test records.
    fn get_test(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<TestRecord>>;

    /// Deletes one test record; `false` when absent or not owned.
    fn delete_test(&self, owner_id: &str, id: Uuid) -> StoreResult<bool>;

    /// Deletes every listed test record, or none of them. Fails with
    /// [`StoreError::MissingRecords`] when any id is absent or not owned.
    fn delete_tests(&self, owner_id: &str, ids: &[Uuid]) -> StoreResult<usize>;

    /// `owner_id`'s reports, newest first, optionally of one kind.
    fn list_reports(
        &self,
        owner_id: &str,
        kind: Option<ReportKind>,
    ) -> StoreResult<Vec<ReportRecord>>;

    /// One of `owner_id`'s reports.
    fn get_report(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<ReportRecord>>;

    /// Deletes one report; `false` when absent or not owned.
    fn delete_report(&self, owner_id: &str, id: Uuid) -> StoreResult<bool>;
}

/// Both record collections, in insertion order. Shared by the backends.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    tests: Vec<TestRecord>,
    #[serde(default)]
    reports: Vec<ReportRecord>,
}

impl StoreState {
    fn insert_test(&mut self, record: TestRecord) -> Uuid {
        let id = record.id;
        self.tests.push(record);
        id
    }

    fn insert_report(&mut self, record: ReportRecord) -> Uuid {
        let id = record.id;
        self.reports.push(record);
        id
    }

    fn query_tests(&self, filter: &TestFilter) -> Vec<TestRecord> {
        let mut out: Vec<TestRecord> = self
            .tests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps; reverse
        // afterwards so the latest insert comes first among ties too.
        out.sort_by_key(|r| r.timestamp);
        out.reverse();
        out
    }

    fn get_test(&self, owner_id: &str, id: Uuid) -> Option<TestRecord> {
        self.tests
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned()
    }

    fn delete_test(&mut self, owner_id: &str, id: Uuid) -> bool {
        let before = self.tests.len();
        self.tests.retain(|r| !(r.id == id && r.owner_id == owner_id));
        self.tests.len() != before
    }

    fn delete_tests(&mut self, owner_id: &str, ids: &[Uuid]) -> StoreResult<usize> {
        let missing: Vec<Uuid> = ids
            .iter()
            .filter(|id| {
                !self
                    .tests
                    .iter()
                    .any(|r| r.id == **id && r.owner_id == owner_id)
            })
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingRecords {
                entity: "test",
                ids: missing,
            });
        }
        let before = self.tests.len();
        self.tests
            .retain(|r| !(r.owner_id == owner_id && ids.contains(&r.id)));
        Ok(before - self.tests.len())
    }

    fn list_reports(&self, owner_id: &str, kind: Option<ReportKind>) -> Vec<ReportRecord> {
        let mut out: Vec<ReportRecord> = self
            .reports
            .iter()
            .filter(|r| r.owner_id == owner_id && kind.map_or(true, |k| r.kind == k))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.timestamp);
        out.reverse();
        out
    }

    fn get_report(&self, owner_id: &str, id: Uuid) -> Option<ReportRecord> {
        self.reports
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned()
    }

    fn delete_report(&mut self, owner_id: &str, id: Uuid) -> bool {
        let before = self.reports.len();
        self.reports
            .retain(|r| !(r.id == id && r.owner_id == owner_id));
        self.reports.len() != before
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use time::Duration;

    #[test]
    fn filter_criteria_combine() {
        let mut r = record("alice", "AES-256", true, 1.0);
        let f = TestFilter::owner("alice");
        assert!(f.matches(&r));
        assert!(!TestFilter::owner("bob").matches(&r));
        assert!(f.clone().algorithm("AES-256").matches(&r));
        assert!(!f.clone().algorithm("AES-128").matches(&r));
        assert!(!f.clone().operation(OperationKind::Signing).matches(&r));
        assert!(f
            .clone()
            .since(r.timestamp - Duration::days(1))
            .matches(&r));
        assert!(!f.clone().since(r.timestamp + Duration::days(1)).matches(&r));
        r.succeeded = false;
        assert!(!f.successful().matches(&r));
    }

    #[test]
    fn bulk_delete_is_all_or_nothing() {
        let mut state = StoreState::default();
        let a = state.insert_test(record("alice", "AES-256", true, 1.0));
        let b = state.insert_test(record("alice", "AES-256", true, 1.0));
        let foreign = state.insert_test(record("bob", "AES-256", true, 1.0));

        let err = state.delete_tests("alice", &[a, foreign]).unwrap_err();
        match err {
            StoreError::MissingRecords { entity, ids } => {
                assert_eq!(entity, "test");
                assert_eq!(ids, vec![foreign]);
            }
            other => panic!("unexpected {other}"),
        }
        assert_eq!(state.tests.len(), 3);

        assert_eq!(state.delete_tests("alice", &[a, b]).unwrap(), 2);
        assert_eq!(state.tests.len(), 1);
    }

    #[test]
    fn query_is_newest_first() {
        let mut state = StoreState::default();
        let mut old = record("alice", "AES-256", true, 1.0);
        old.timestamp -= Duration::hours(2);
        let old_id = state.insert_test(old);
        let new_id = state.insert_test(record("alice", "AES-256", true, 1.0));
        let ids: Vec<Uuid> = state
            .query_tests(&TestFilter::owner("alice"))
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![new_id, old_id]);
    }
}
