use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::jobs::domain::run_result::RunResult;
use crate::jobs::domain::run_store::{RunStore, RunStoreError};

/// Process-local run store. Results are lost when the process exits.
#[derive(Default)]
pub struct InMemoryRunStore {
    runs: Mutex<HashMap<String, RunResult>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, RunResult>> {
        // Every write is a single insert, so a poisoned map is still consistent.
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RunStore for InMemoryRunStore {
    fn put(&self, id: &str, result: RunResult) -> Result<(), RunStoreError> {
        self.runs().insert(id.to_string(), result);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<RunResult>, RunStoreError> {
        Ok(self.runs().get(id).cloned())
    }
}
