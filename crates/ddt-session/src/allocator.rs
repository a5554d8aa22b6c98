//! Collision-free subject identifier allocation.
//!
//! The namespace of used identifiers is derived from the filenames of
//! persisted records; it is the only state shared across sessions and the
//! system's sole cross-session critical section. Allocation is
//! reserve-then-verify: the smallest free candidate is reserved through an
//! atomic [`ReservationStore`] before it is handed out, so two sessions
//! starting concurrently can never receive the same identifier.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::SubjectId;
use walkdir::WalkDir;

use crate::record::subject_from_filename;

/// Atomic reservation primitive for subject identifiers.
///
/// `try_reserve` must be atomic with respect to concurrent callers: exactly
/// one caller wins any given identifier. Losing is not an error; the
/// allocator moves on to the next candidate.
pub trait ReservationStore {
    /// Attempts to reserve the identifier; returns false when already taken.
    fn try_reserve(&self, id: SubjectId) -> Result<bool, DdtError>;
}

/// Process-local reservation store backed by a mutex-guarded set.
#[derive(Debug, Default)]
pub struct MemoryReservations {
    reserved: Mutex<BTreeSet<SubjectId>>,
}

impl MemoryReservations {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for MemoryReservations {
    fn try_reserve(&self, id: SubjectId) -> Result<bool, DdtError> {
        let mut reserved = self.reserved.lock().map_err(|_| {
            DdtError::Serde(ErrorInfo::new(
                "reservation-lock",
                "reservation set lock was poisoned",
            ))
        })?;
        Ok(reserved.insert(id))
    }
}

/// Filesystem reservation store: one placeholder file per reserved id.
///
/// Placeholders are named `DDT{id}.reserved` so the namespace scan picks
/// them up exactly like finished record files. Creation uses `create_new`,
/// which the filesystem guarantees to succeed for at most one caller.
#[derive(Debug, Clone)]
pub struct DirReservations {
    root: PathBuf,
}

impl DirReservations {
    /// Creates a store rooted at the given data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the placeholder file for an identifier.
    pub fn placeholder_path(&self, id: SubjectId) -> PathBuf {
        self.root.join(format!("DDT{id}.reserved"))
    }
}

impl ReservationStore for DirReservations {
    fn try_reserve(&self, id: SubjectId) -> Result<bool, DdtError> {
        std::fs::create_dir_all(&self.root).map_err(|err| {
            DdtError::Serde(
                ErrorInfo::new("reservation-mkdir", err.to_string())
                    .with_context("path", self.root.display().to_string()),
            )
        })?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.placeholder_path(id))
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(DdtError::Serde(
                ErrorInfo::new("reservation-write", err.to_string())
                    .with_context("id", id.to_string()),
            )),
        }
    }
}

/// Returns the smallest identifier in range not present in `used`.
///
/// Exhaustion is an explicit error; the range never wraps silently because
/// recycling identifiers risks colliding with long-running sessions and is
/// a policy decision left to the caller.
pub fn allocate(used: &BTreeSet<SubjectId>) -> Result<SubjectId, DdtError> {
    for raw in SubjectId::MIN..=SubjectId::MAX {
        let id = SubjectId::new(raw)?;
        if !used.contains(&id) {
            return Ok(id);
        }
    }
    Err(DdtError::Allocation(
        ErrorInfo::new("subject-range-exhausted", "no free subject id remains")
            .with_context("range", format!("{}..={}", SubjectId::MIN, SubjectId::MAX)),
    ))
}

/// Allocates and reserves an identifier in one scan-reserve-verify loop.
///
/// Candidates that lose the reservation race are treated as used and the
/// scan continues with the next free identifier.
pub fn allocate_reserved(
    used: &BTreeSet<SubjectId>,
    store: &dyn ReservationStore,
) -> Result<SubjectId, DdtError> {
    let mut taken = used.clone();
    loop {
        let candidate = allocate(&taken)?;
        if store.try_reserve(candidate)? {
            tracing::info!(subject = %candidate, "subject id allocated");
            return Ok(candidate);
        }
        taken.insert(candidate);
    }
}

/// Scans a data directory for identifiers already in use.
///
/// Both finished record files and reservation placeholders count; a missing
/// directory yields an empty namespace.
pub fn scan_used(dir: &Path) -> Result<BTreeSet<SubjectId>, DdtError> {
    let mut used = BTreeSet::new();
    if !dir.exists() {
        return Ok(used);
    }
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| {
            DdtError::Serde(
                ErrorInfo::new("namespace-scan", err.to_string())
                    .with_context("path", dir.display().to_string()),
            )
        })?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(id) = subject_from_filename(name) {
                used.insert(id);
            }
        }
    }
    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_returns_smallest_free_id() {
        let mut used = BTreeSet::new();
        assert_eq!(allocate(&used).unwrap().as_raw(), 1001);
        used.insert(SubjectId::new(1001).unwrap());
        used.insert(SubjectId::new(1002).unwrap());
        used.insert(SubjectId::new(1004).unwrap());
        assert_eq!(allocate(&used).unwrap().as_raw(), 1003);
    }

    #[test]
    fn exhausted_range_is_an_error() {
        let used: BTreeSet<SubjectId> = (SubjectId::MIN..=SubjectId::MAX)
            .map(|raw| SubjectId::new(raw).unwrap())
            .collect();
        assert!(matches!(allocate(&used), Err(DdtError::Allocation(_))));
    }

    #[test]
    fn reservation_race_moves_to_next_candidate() {
        let store = MemoryReservations::new();
        // simulate a concurrent winner holding 1001
        assert!(store.try_reserve(SubjectId::new(1001).unwrap()).unwrap());

        let used = BTreeSet::new();
        let id = allocate_reserved(&used, &store).unwrap();
        assert_eq!(id.as_raw(), 1002);
    }
}
