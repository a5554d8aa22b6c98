//! Typed session configuration.

use ddt_core::SubjectId;
use serde::{Deserialize, Serialize};

/// Parameters governing one experiment session.
///
/// This is the complete configuration surface: no dynamically shaped
/// dictionaries anywhere. Every field except the subject id has a default so
/// persisted snapshots stay readable when optional knobs are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Subject the session belongs to.
    pub subject_id: SubjectId,
    /// Session number for the subject, starting at 1.
    #[serde(default = "default_session")]
    pub session: u32,
    /// Number of unrecorded training trials shown before the scored block.
    #[serde(default = "default_train_trials")]
    pub num_train_trials: u32,
    /// Number of recorded trials in the scored block.
    #[serde(default = "default_main_trials")]
    pub num_main_trials: u32,
    /// Whether the tutorial is presented before the training block.
    #[serde(default = "default_show_tutorial")]
    pub show_tutorial: bool,
    /// Instruction text forwarded to the presentation layer verbatim.
    #[serde(default)]
    pub instructions_text: String,
}

fn default_session() -> u32 {
    1
}

fn default_train_trials() -> u32 {
    5
}

fn default_main_trials() -> u32 {
    20
}

fn default_show_tutorial() -> bool {
    true
}

impl SessionConfig {
    /// Creates a configuration for the given subject with default knobs.
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            session: default_session(),
            num_train_trials: default_train_trials(),
            num_main_trials: default_main_trials(),
            show_tutorial: default_show_tutorial(),
            instructions_text: String::new(),
        }
    }
}
