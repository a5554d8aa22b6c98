//! Serializable session snapshots.
//!
//! A snapshot is the only state that survives between stateless invocations:
//! an explicit, language-independent JSON payload holding the configuration,
//! the outstanding design (if any) and the ordered trial records. The live
//! posterior is never serialized; it is rebuilt by replaying the records.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::{BlockType, Design, SubjectId};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::session::Session;
use crate::trial::Trial;

/// Experiment-state portion of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpState {
    /// Subject the session belongs to.
    pub subject: SubjectId,
    /// Session number for the subject.
    pub session: u32,
    /// Record filename the session persists to.
    pub output_path: String,
    /// Ordered trial records; replay order is their ordinal order.
    pub trials: Vec<Trial>,
    /// Current scored block number.
    pub block: u32,
    /// Current block type.
    pub block_type: BlockType,
}

/// Complete persisted session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session configuration.
    pub config: SessionConfig,
    /// Outstanding queried-but-unanswered design, if any.
    pub last_design: Option<Design>,
    /// Instant the session was created.
    pub created_at: DateTime<Utc>,
    /// Digest of the grids the trial records were produced against. Absent
    /// in older payloads; checked when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_digest: Option<String>,
    /// Experiment state.
    pub exp_state: ExpState,
}

impl SessionSnapshot {
    /// Serializes the snapshot as pretty JSON.
    pub fn to_json(&self) -> Result<String, DdtError> {
        serde_json::to_string_pretty(self).map_err(|err| {
            DdtError::Serde(ErrorInfo::new("snapshot-serialize", err.to_string()))
        })
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(data: &str) -> Result<Self, DdtError> {
        serde_json::from_str(data)
            .map_err(|err| DdtError::Serde(ErrorInfo::new("snapshot-parse", err.to_string())))
    }

    /// Writes the snapshot to disk.
    pub fn store(&self, path: &Path) -> Result<(), DdtError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                DdtError::Serde(
                    ErrorInfo::new("snapshot-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = self.to_json()?;
        fs::write(path, json).map_err(|err| {
            DdtError::Serde(
                ErrorInfo::new("snapshot-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Restores a snapshot from disk.
    ///
    /// A missing file is surfaced as `NotFound` so the caller can start a
    /// fresh session instead of retrying.
    pub fn load(path: &Path) -> Result<Self, DdtError> {
        if !path.exists() {
            return Err(DdtError::NotFound(
                ErrorInfo::new("snapshot-missing", "no snapshot for the session")
                    .with_context("path", path.display().to_string()),
            ));
        }
        let contents = fs::read_to_string(path).map_err(|err| {
            DdtError::Serde(
                ErrorInfo::new("snapshot-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_json(&contents)
    }
}

/// Captures the current session state as a snapshot payload.
pub fn build_snapshot(session: &Session) -> SessionSnapshot {
    SessionSnapshot {
        config: session.config().clone(),
        last_design: session.pending_design().copied(),
        created_at: session.created_at(),
        grid_digest: Some(session.grid_digest()),
        exp_state: ExpState {
            subject: session.subject(),
            session: session.config().session,
            output_path: session.output_path().to_string(),
            trials: session.log().trials().to_vec(),
            block: session.block(),
            block_type: session.block_type(),
        },
    }
}
