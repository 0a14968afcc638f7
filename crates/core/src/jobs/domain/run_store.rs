use std::path::PathBuf;

use thiserror::Error;

use crate::jobs::domain::run_result::RunResult;

#[derive(Debug, Error)]
pub enum RunStoreError {
    #[error("failed to access run store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed run record at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("run id {0:?} cannot be stored")]
    InvalidId(String),
}

/// Keeps the latest `RunResult` per run id.
///
/// Shared by every worker of a `JobFacade`, so implementations must be
/// safe to call from several threads at once. A `put` replaces whatever
/// was stored for the id before.
pub trait RunStore: Send + Sync {
    fn put(&self, id: &str, result: RunResult) -> Result<(), RunStoreError>;

    /// `Ok(None)` for ids the store has never seen.
    fn get(&self, id: &str) -> Result<Option<RunResult>, RunStoreError>;
}
