//! In-memory record store.

use std::sync::RwLock;

use uuid::Uuid;

use super::{RecordStore, StoreResult, StoreState, TestFilter};
use crate::records::{ReportKind, ReportRecord, TestRecord};

/// Thread-safe via `RwLock`. Not persistent; records are lost on drop.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: RwLock<StoreState>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of test records across all owners.
    pub fn test_count(&self) -> StoreResult<usize> {
        Ok(self.state.read()?.tests.len())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert_test(&self, record: TestRecord) -> StoreResult<Uuid> {
        Ok(self.state.write()?.insert_test(record))
    }

    fn insert_report(&self, record: ReportRecord) -> StoreResult<Uuid> {
        Ok(self.state.write()?.insert_report(record))
    }

    fn query_tests(&self, filter: &TestFilter) -> StoreResult<Vec<TestRecord>> {
        Ok(self.state.read()?.query_tests(filter))
    }

    fn get_test(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<TestRecord>> {
        Ok(self.state.read()?.get_test(owner_id, id))
    }

    fn delete_test(&self, owner_id: &str, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write()?.delete_test(owner_id, id))
    }

    fn delete_tests(&self, owner_id: &str, ids: &[Uuid]) -> StoreResult<usize> {
        self.state.write()?.delete_tests(owner_id, ids)
    }

    fn list_reports(
        &self,
        owner_id: &str,
        kind: Option<ReportKind>,
    ) -> StoreResult<Vec<ReportRecord>> {
        Ok(self.state.read()?.list_reports(owner_id, kind))
    }

    fn get_report(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<ReportRecord>> {
        Ok(self.state.read()?.get_report(owner_id, id))
    }

    fn delete_report(&self, owner_id: &str, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write()?.delete_report(owner_id, id))
    }
}
