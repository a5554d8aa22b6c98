//! Completed trials and the append-only per-session log.

use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::{BlockType, Design, SubjectId};
use serde::{Deserialize, Serialize};

/// One completed trial, created exactly once at response time.
///
/// Field order matches the persisted record schema column for column; the
/// struct is flat on purpose so the tab-separated codec can derive both the
/// header and the rows from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Subject the trial belongs to.
    pub subject: SubjectId,
    /// Scored block number, 1-based.
    pub block: u32,
    /// Kind of block the trial was recorded in.
    pub block_type: BlockType,
    /// Ordinal index within the session, 1-based; defines replay order.
    pub trial: u32,
    /// Delay of the sooner-smaller option.
    pub t_ss: f64,
    /// Delay of the later-larger option.
    pub t_ll: f64,
    /// Reward of the sooner-smaller option.
    pub r_ss: f64,
    /// Reward of the later-larger option.
    pub r_ll: f64,
    /// 1 when the sooner-smaller option was chosen.
    pub resp_ss: u8,
    /// Reaction time in seconds.
    pub rt: f64,
    /// Posterior mean of the discount rate after this trial's update.
    pub mean_k: f64,
    /// Posterior mean of the choice temperature after this trial's update.
    pub mean_tau: f64,
    /// Posterior standard deviation of the discount rate.
    pub sd_k: f64,
    /// Posterior standard deviation of the choice temperature.
    pub sd_tau: f64,
}

impl Trial {
    /// The design presented on this trial.
    pub fn design(&self) -> Design {
        Design {
            t_ss: self.t_ss,
            t_ll: self.t_ll,
            r_ss: self.r_ss,
            r_ll: self.r_ll,
        }
    }
}

/// Append-only ordered record of a session's completed trials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialLog {
    trials: Vec<Trial>,
}

impl TrialLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded trials.
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Returns true when no trial has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Immutable view over the trials in ordinal order.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// The most recently recorded trial.
    pub fn last(&self) -> Option<&Trial> {
        self.trials.last()
    }

    /// Appends a trial, assigning it the next ordinal index.
    ///
    /// Whatever ordinal the caller set is overwritten; past entries are never
    /// touched. Returns the assigned ordinal.
    pub fn append(&mut self, mut trial: Trial) -> u32 {
        let ordinal = self.trials.len() as u32 + 1;
        trial.trial = ordinal;
        self.trials.push(trial);
        ordinal
    }

    /// Rebuilds a log from persisted records, enforcing replay order.
    ///
    /// Ordinals must run 1..=n without gaps; anything else means the record
    /// set was truncated or reordered and cannot be replayed safely.
    pub fn from_records(records: Vec<Trial>) -> Result<Self, DdtError> {
        for (index, record) in records.iter().enumerate() {
            let expected = index as u32 + 1;
            if record.trial != expected {
                return Err(DdtError::Configuration(
                    ErrorInfo::new("trial-order", "trial ordinals are not contiguous from 1")
                        .with_context("position", expected.to_string())
                        .with_context("found", record.trial.to_string()),
                ));
            }
        }
        Ok(Self { trials: records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trial(ordinal: u32) -> Trial {
        Trial {
            subject: SubjectId::new(1001).unwrap(),
            block: 1,
            block_type: BlockType::Ado,
            trial: ordinal,
            t_ss: 0.0,
            t_ll: 4.3,
            r_ss: 500.0,
            r_ll: 800.0,
            resp_ss: 1,
            rt: 0.8,
            mean_k: 0.02,
            mean_tau: 1.5,
            sd_k: 0.01,
            sd_tau: 0.9,
        }
    }

    #[test]
    fn append_assigns_sequential_ordinals() {
        let mut log = TrialLog::new();
        assert_eq!(log.append(sample_trial(99)), 1);
        assert_eq!(log.append(sample_trial(0)), 2);
        assert_eq!(log.trials()[0].trial, 1);
        assert_eq!(log.trials()[1].trial, 2);
    }

    #[test]
    fn from_records_rejects_gaps_and_reordering() {
        let records = vec![sample_trial(1), sample_trial(3)];
        assert!(TrialLog::from_records(records).is_err());

        let records = vec![sample_trial(2), sample_trial(1)];
        assert!(TrialLog::from_records(records).is_err());

        let records = vec![sample_trial(1), sample_trial(2)];
        assert_eq!(TrialLog::from_records(records).unwrap().len(), 2);
    }
}
