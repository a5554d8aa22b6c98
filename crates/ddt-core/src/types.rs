use serde::{Deserialize, Serialize};

use crate::errors::{DdtError, ErrorInfo};

/// A candidate stimulus: a sooner-smaller and a later-larger option.
///
/// Delays are in weeks, rewards in currency units. Every design drawn from a
/// grid satisfies `t_ss < t_ll` and `r_ss < r_ll`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Delay of the sooner-smaller option.
    pub t_ss: f64,
    /// Delay of the later-larger option.
    pub t_ll: f64,
    /// Reward of the sooner-smaller option.
    pub r_ss: f64,
    /// Reward of the later-larger option.
    pub r_ll: f64,
}

impl Design {
    /// Returns true when the sooner/later ordering invariant holds.
    pub fn is_ordered(&self) -> bool {
        self.t_ss < self.t_ll && self.r_ss < self.r_ll
    }
}

/// Mode requested when querying the next design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Information-maximizing design under the current posterior.
    Optimal,
    /// Uniform draw from the design grid.
    Random,
    /// Training trial: random design, response discarded.
    Train,
}

impl QueryMode {
    /// Stable string form used in persisted payloads and log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Optimal => "optimal",
            QueryMode::Random => "random",
            QueryMode::Train => "train",
        }
    }
}

/// Kind of scored block a trial belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Adaptive block: designs chosen by expected information gain.
    Ado,
    /// Fixed block: designs drawn uniformly at random.
    Fixed,
}

impl BlockType {
    /// Stable string form used in the persisted trial record.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Ado => "ado",
            BlockType::Fixed => "fixed",
        }
    }

    /// Query mode used for trials of this block type.
    pub fn query_mode(&self) -> QueryMode {
        match self {
            BlockType::Ado => QueryMode::Optimal,
            BlockType::Fixed => QueryMode::Random,
        }
    }
}

/// Four-digit subject identifier drawn from the range `1001..=9999`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubjectId(u16);

impl SubjectId {
    /// Smallest identifier handed out by the allocator.
    pub const MIN: u16 = 1001;
    /// Largest identifier handed out by the allocator.
    pub const MAX: u16 = 9999;

    /// Validates the range and wraps the raw identifier.
    pub fn new(raw: u16) -> Result<Self, DdtError> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return Err(DdtError::Configuration(
                ErrorInfo::new("subject-id-range", "subject id outside the 4-digit range")
                    .with_context("id", raw.to_string()),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Derives the sooner-smaller response flag from a left/right key press.
///
/// `direction == 1` presents the sooner option on the left, so a left press
/// means the sooner option was chosen; `direction == 0` mirrors the layout.
pub fn resp_ss_from(resp_left: u8, direction: u8) -> u8 {
    if direction == 1 {
        resp_left
    } else {
        1 - resp_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_id_rejects_out_of_range() {
        assert!(SubjectId::new(1000).is_err());
        assert!(SubjectId::new(10_000).is_err());
        assert_eq!(SubjectId::new(1001).unwrap().to_string(), "1001");
    }

    #[test]
    fn resp_ss_follows_presentation_direction() {
        assert_eq!(resp_ss_from(1, 1), 1);
        assert_eq!(resp_ss_from(0, 1), 0);
        assert_eq!(resp_ss_from(1, 0), 0);
        assert_eq!(resp_ss_from(0, 0), 1);
    }
}
