#![deny(missing_docs)]

//! Session layer for the adaptive delay-discounting experiment: typed
//! configuration, the request-scoped session state machine, append-only trial
//! records with a tab-separated codec, snapshot persistence with
//! deterministic replay, and collision-free subject allocation.

/// Subject identifier allocation and the reservation protocol.
pub mod allocator;
/// Typed session configuration.
pub mod config;
/// Tab-separated trial record codec and filename scheme.
pub mod record;
/// Snapshot replay into a fresh engine.
pub mod replay;
mod seeds;
/// The request-scoped session state machine.
pub mod session;
/// Serializable session snapshots.
pub mod snapshot;
/// Completed trials and the append-only log.
pub mod trial;

pub use allocator::{
    allocate, allocate_reserved, scan_used, DirReservations, MemoryReservations, ReservationStore,
};
pub use config::SessionConfig;
pub use record::{
    decode_records, encode_records, read_records, record_filename, subject_from_filename,
    write_records, RECORD_COLUMNS,
};
pub use replay::{rebuild, REPLAY_TOLERANCE};
pub use session::{
    DesignQuery, ResponseInput, ResponseOutcome, Session, DEFAULT_TTL_SECONDS,
};
pub use snapshot::{build_snapshot, ExpState, SessionSnapshot};
pub use trial::{Trial, TrialLog};
