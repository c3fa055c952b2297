//! Durable agent state: the JSON document holding per-key alert states
//! and schedule state.
//!
//! The store is a small repository over one file: loaded once at startup,
//! rewritten atomically (write-to-temporary, then rename) after each tick
//! that changed state. A missing or corrupt file is treated as "no prior
//! state", never as a fatal error, so a crash mid-write cannot brick the
//! agent.


use chrono::{DateTime, Utc};
use hostmon_alert::AlertState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Schedule id for the full-status report in [`StateDocument::schedules`].
pub const REPORT_SCHEDULE_ID: &str = "report";

/// Errors from durable state writes. Load failures are deliberately not
/// errors; see [`StateStore::load`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state store: I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store: serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted record for one report schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleState {
    pub last_fired_at: DateTime<Utc>,
}

/// The complete persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub alerts: BTreeMap<String, AlertState>,
    #[serde(default)]
    pub schedules: BTreeMap<String, ScheduleState>,
}

/// File-backed repository for the agent's durable state.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the document once at startup.
    ///
    /// Returns the default (empty) document when the file is missing or
    /// unparsable: all alert keys start OK and schedules count as never
    /// fired.
    pub fn load(&self) -> StateDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no prior state file");
                return StateDocument::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file unreadable, starting fresh");
                return StateDocument::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file corrupt, starting fresh");
                StateDocument::default()
            }
        }
    }

    /// Atomically replace the document on disk.
    ///
    /// Writes to a sibling temporary file and renames it over the target,
    /// so a crash mid-write leaves either the old or the new document,
    /// never a truncated one.
    pub fn save(&self, doc: &StateDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let raw = serde_json::to_vec_pretty(doc)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
