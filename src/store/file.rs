//! JSON snapshot store.
//!
//! Keeps the same state as the in-memory backend and rewrites the whole
//! snapshot after every mutation. A mutation is applied to a copy, the copy
//! is persisted, and only then swapped in, so a failed write leaves both
//! the file and the in-process view unchanged.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult, StoreState, TestFilter};
use crate::fs_guard;
use crate::records::{ReportKind, ReportRecord, TestRecord};

/// Maximum snapshot size (64 MB).
const MAX_STORE_BYTES: u64 = 64 * 1024 * 1024;

/// File-backed record store.
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = match fs_guard::read_optional(&path, MAX_STORE_BYTES)
            .map_err(|e| StoreError::Io(format!("{e:#}")))?
        {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?,
            None => StoreState::default(),
        };
        info!(
            path = %path.display(),
            tests = state.tests.len(),
            reports = state.reports.len(),
            "record store opened"
        );
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Snapshot location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec_pretty(state).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs_guard::write_atomic(&self.path, &bytes)
            .map_err(|e| StoreError::Io(format!("{e:#}")))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.state.write()?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    fn insert_test(&self, record: TestRecord) -> StoreResult<Uuid> {
        self.mutate(|s| Ok(s.insert_test(record)))
    }

    fn insert_report(&self, record: ReportRecord) -> StoreResult<Uuid> {
        self.mutate(|s| Ok(s.insert_report(record)))
    }

    fn query_tests(&self, filter: &TestFilter) -> StoreResult<Vec<TestRecord>> {
        Ok(self.state.read()?.query_tests(filter))
    }

    fn get_test(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<TestRecord>> {
        Ok(self.state.read()?.get_test(owner_id, id))
    }

    fn delete_test(&self, owner_id: &str, id: Uuid) -> StoreResult<bool> {
        if self.state.read()?.get_test(owner_id, id).is_none() {
            return Ok(false);
        }
        self.mutate(|s| Ok(s.delete_test(owner_id, id)))
    }

    fn delete_tests(&self, owner_id: &str, ids: &[Uuid]) -> StoreResult<usize> {
        self.mutate(|s| s.delete_tests(owner_id, ids))
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
        if self.state.read()?.get_report(owner_id, id).is_none() {
            return Ok(false);
        }
        self.mutate(|s| Ok(s.delete_report(owner_id, id)))
    }
}
