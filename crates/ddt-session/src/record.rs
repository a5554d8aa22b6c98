//! Tab-separated trial record codec.
//!
//! The persisted record is the authoritative artifact a session leaves
//! behind: tab-separated, header required, fixed column order. Filenames
//! embed the subject id so the allocator can rebuild its namespace from a
//! directory listing alone.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::SubjectId;

use crate::trial::{Trial, TrialLog};

/// Fixed column order of the persisted trial record.
pub const RECORD_COLUMNS: [&str; 14] = [
    "subject", "block", "block_type", "trial", "t_ss", "t_ll", "r_ss", "r_ll", "resp_ss", "rt",
    "mean_k", "mean_tau", "sd_k", "sd_tau",
];

/// Encodes a trial log as a tab-separated document with header.
pub fn encode_records(log: &TrialLog) -> Result<String, DdtError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(RECORD_COLUMNS)
        .map_err(|err| wrap_csv("record-write-header", err))?;
    for trial in log.trials() {
        writer
            .serialize(trial)
            .map_err(|err| wrap_csv("record-write-row", err))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| DdtError::Serde(ErrorInfo::new("record-flush", err.to_string())))?;
    String::from_utf8(bytes).map_err(|err| {
        DdtError::Serde(ErrorInfo::new("record-utf8", err.to_string()))
    })
}

/// Decodes a tab-separated document back into an ordered trial log.
///
/// The header must match [`RECORD_COLUMNS`] exactly; ordinals must be
/// contiguous from 1.
pub fn decode_records(data: &str) -> Result<TrialLog, DdtError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(data.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| wrap_csv("record-read-header", err))?;
    let found: Vec<&str> = headers.iter().collect();
    if found != RECORD_COLUMNS {
        return Err(DdtError::Serde(
            ErrorInfo::new("record-header", "record header does not match the schema")
                .with_context("found", found.join(","))
                .with_context("expected", RECORD_COLUMNS.join(",")),
        ));
    }
    let mut records = Vec::new();
    for row in reader.deserialize::<Trial>() {
        records.push(row.map_err(|err| wrap_csv("record-read-row", err))?);
    }
    TrialLog::from_records(records)
}

/// Writes the record file for a session.
pub fn write_records(path: &Path, log: &TrialLog) -> Result<(), DdtError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            DdtError::Serde(
                ErrorInfo::new("record-mkdir", err.to_string())
                    .with_context("path", parent.display().to_string()),
            )
        })?;
    }
    let encoded = encode_records(log)?;
    fs::write(path, encoded).map_err(|err| {
        DdtError::Serde(
            ErrorInfo::new("record-write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Reads a record file back into an ordered trial log.
pub fn read_records(path: &Path) -> Result<TrialLog, DdtError> {
    if !path.exists() {
        return Err(DdtError::NotFound(
            ErrorInfo::new("record-missing", "no record file for the session")
                .with_context("path", path.display().to_string()),
        ));
    }
    let contents = fs::read_to_string(path).map_err(|err| {
        DdtError::Serde(
            ErrorInfo::new("record-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    decode_records(&contents)
}

/// Builds the record filename for a session.
///
/// The creation instant is rendered with `:` replaced by `-` and sub-second
/// digits dropped so the name is filesystem-safe on every platform.
pub fn record_filename(subject: SubjectId, session: u32, created_at: &DateTime<Utc>) -> String {
    format!(
        "DDT{subject}_ses{session}_{}.csv",
        created_at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Parses the subject id out of a record or placeholder filename.
///
/// Accepts any `DDT####`-prefixed name; returns `None` when the digits are
/// missing or fall outside the allocator's range.
pub fn subject_from_filename(name: &str) -> Option<SubjectId> {
    let rest = name.strip_prefix("DDT")?;
    let digits = rest.get(..4)?;
    let raw: u16 = digits.parse().ok()?;
    SubjectId::new(raw).ok()
}

fn wrap_csv(code: &str, err: csv::Error) -> DdtError {
    DdtError::Serde(ErrorInfo::new(code, err.to_string()))
}
