//! Deterministic seed derivation for per-session randomness.
//!
//! The master seed is a pure function of the identity fields a snapshot
//! already carries (subject, session number, creation instant), so a resumed
//! session derives the same substreams without persisting any RNG state.

use chrono::{DateTime, Utc};
use ddt_core::{derive_substream_seed, SubjectId};

const DESIGN_STREAM: u64 = 1;
const DIRECTION_STREAM: u64 = 2;

/// Derives the session master seed from its identity fields.
pub fn session_seed(subject: SubjectId, session: u32, created_at: &DateTime<Utc>) -> u64 {
    let identity = derive_substream_seed(subject.as_raw() as u64, session as u64);
    derive_substream_seed(identity, created_at.timestamp() as u64)
}

/// Seed for the random-design draw of the given query.
pub fn design_seed(master_seed: u64, query_seq: u64) -> u64 {
    derive_substream_seed(derive_substream_seed(master_seed, DESIGN_STREAM), query_seq)
}

/// Seed for the presentation-direction draw of the given query.
pub fn direction_seed(master_seed: u64, query_seq: u64) -> u64 {
    derive_substream_seed(
        derive_substream_seed(master_seed, DIRECTION_STREAM),
        query_seq,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_distinct_per_query() {
        let subject = SubjectId::new(1001).unwrap();
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let master = session_seed(subject, 1, &created);

        assert_ne!(design_seed(master, 0), design_seed(master, 1));
        assert_ne!(design_seed(master, 0), direction_seed(master, 0));
        assert_eq!(master, session_seed(subject, 1, &created));
    }
}
