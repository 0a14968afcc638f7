use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::presence::domain::appearance_interval::AppearanceInterval;

/// Lifecycle of a submitted run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

/// What the run store holds for one run id.
///
/// Only `done` results carry appearances and only `failed` results carry
/// an error message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    appearances: Option<Vec<AppearanceInterval>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RunResult {
    pub fn queued() -> Self {
        Self::pending(RunStatus::Queued)
    }

    pub fn processing() -> Self {
        Self::pending(RunStatus::Processing)
    }

    pub fn done(appearances: Vec<AppearanceInterval>) -> Self {
        Self {
            status: RunStatus::Done,
            appearances: Some(appearances),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            appearances: None,
            error: Some(error.into()),
        }
    }

    fn pending(status: RunStatus) -> Self {
        Self {
            status,
            appearances: None,
            error: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn appearances(&self) -> Option<&[AppearanceInterval]> {
        self.appearances.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Answer to a status query.
///
/// Serializes flat: `{"id": .., "status": "done", "appearances": [[0.3, 0.6]]}`
/// or `{"id": .., "status": "not_found"}`.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusReport {
    Found { id: String, result: RunResult },
    NotFound { id: String },
}

impl StatusReport {
    pub fn new(id: &str, result: Option<RunResult>) -> Self {
        let id = id.to_string();
        match result {
            Some(result) => StatusReport::Found { id, result },
            None => StatusReport::NotFound { id },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StatusReport::Found { id, .. } | StatusReport::NotFound { id } => id,
        }
    }

    pub fn result(&self) -> Option<&RunResult> {
        match self {
            StatusReport::Found { result, .. } => Some(result),
            StatusReport::NotFound { .. } => None,
        }
    }
}

impl Serialize for StatusReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", self.id())?;
        match self {
            StatusReport::Found { result, .. } => {
                map.serialize_entry("status", &result.status)?;
                if let Some(appearances) = &result.appearances {
                    map.serialize_entry("appearances", appearances)?;
                }
                if let Some(error) = &result.error {
                    map.serialize_entry("error", error)?;
                }
            }
            StatusReport::NotFound { .. } => {
                map.serialize_entry("status", "not_found")?;
            }
        }
        map.end()
    }
}
