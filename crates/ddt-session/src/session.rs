//! Request-scoped session state machine.
//!
//! A `Session` is the explicit context object the orchestration layer passes
//! into each handler; there are no ambient globals. The caller must serialize
//! requests for one session id, since concurrent updates to the same
//! posterior are undefined and prevented upstream. Distinct sessions share
//! nothing except the read-only grids.

use chrono::{DateTime, Utc};
use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::{resp_ss_from, BlockType, Design, QueryMode, RngHandle, SubjectId};
use ddt_engine::{
    DesignSelector, DesignSpace, ParamEstimate, ParamSpace, PosteriorEngine,
};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::record;
use crate::seeds;
use crate::trial::{Trial, TrialLog};

/// Default session lifetime in seconds; the external store enforces the
/// actual TTL, this is the fallback the replay path checks against.
pub const DEFAULT_TTL_SECONDS: i64 = 7200;

/// A design handed out for presentation, with its layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignQuery {
    /// The stimulus to present.
    pub design: Design,
    /// 1 presents the sooner option on the left, 0 mirrors the layout.
    pub direction: u8,
    /// Mode the design was requested under.
    pub mode: QueryMode,
}

/// Raw response payload as captured by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseInput {
    /// 1 when the left option was chosen.
    pub resp_left: u8,
    /// Layout direction echoed back from the query.
    pub direction: u8,
    /// Reaction time in seconds, non-negative.
    pub rt: f64,
}

/// Result of recording a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutcome {
    /// True once the scored block holds the configured number of trials.
    pub finished: bool,
    /// The recorded trial; `None` for training responses, which are dropped.
    pub recorded: Option<Trial>,
}

#[derive(Debug)]
pub(crate) struct PendingQuery {
    pub design: Design,
    pub mode: QueryMode,
}

/// One logical experiment run over the standard grids.
#[derive(Debug)]
pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) output_path: String,
    pub(crate) block: u32,
    pub(crate) block_type: BlockType,
    pub(crate) engine: PosteriorEngine,
    pub(crate) selector: DesignSelector,
    pub(crate) log: TrialLog,
    pub(crate) pending: Option<PendingQuery>,
    master_seed: u64,
    query_seq: u64,
}

impl Session {
    /// Starts a fresh session over the standard design and parameter grids.
    pub fn start(config: SessionConfig, now: DateTime<Utc>) -> Result<Self, DdtError> {
        let params = ParamSpace::standard()?;
        let designs = DesignSpace::standard()?;
        let selector = DesignSelector::new(designs, &params);
        let engine = PosteriorEngine::new(params);
        let output_path = record::record_filename(config.subject_id, config.session, &now);
        let master_seed = seeds::session_seed(config.subject_id, config.session, &now);
        tracing::info!(
            subject = %config.subject_id,
            session = config.session,
            output = %output_path,
            "session started"
        );
        Ok(Self {
            config,
            created_at: now,
            output_path,
            block: 1,
            block_type: BlockType::Ado,
            engine,
            selector,
            log: TrialLog::new(),
            pending: None,
            master_seed,
            query_seq: 0,
        })
    }

    pub(crate) fn assemble(
        config: SessionConfig,
        created_at: DateTime<Utc>,
        output_path: String,
        block: u32,
        block_type: BlockType,
        engine: PosteriorEngine,
        selector: DesignSelector,
        log: TrialLog,
        pending: Option<PendingQuery>,
    ) -> Self {
        let master_seed = seeds::session_seed(config.subject_id, config.session, &created_at);
        let query_seq = log.len() as u64 + u64::from(pending.is_some());
        Self {
            config,
            created_at,
            output_path,
            block,
            block_type,
            engine,
            selector,
            log,
            pending,
            master_seed,
            query_seq,
        }
    }

    /// Picks the next design and presentation direction.
    ///
    /// Fails with an invalid-state error while a previous query is still
    /// unanswered; a session holds at most one outstanding design.
    pub fn next_design(&mut self, mode: QueryMode) -> Result<DesignQuery, DdtError> {
        if self.pending.is_some() {
            return Err(DdtError::InvalidState(ErrorInfo::new(
                "design-pending",
                "a queried design is still awaiting its response",
            )));
        }
        let mut design_rng =
            RngHandle::from_seed(seeds::design_seed(self.master_seed, self.query_seq));
        let design = self.selector.choose(mode, &self.engine, &mut design_rng)?;
        let mut direction_rng =
            RngHandle::from_seed(seeds::direction_seed(self.master_seed, self.query_seq));
        let direction = direction_rng.uniform_index(2) as u8;
        self.query_seq += 1;
        self.pending = Some(PendingQuery { design, mode });
        tracing::debug!(
            subject = %self.config.subject_id,
            mode = mode.as_str(),
            t_ll = design.t_ll,
            r_ss = design.r_ss,
            "design chosen"
        );
        Ok(DesignQuery {
            design,
            direction,
            mode,
        })
    }

    /// Records a response to the pending design.
    ///
    /// Training responses consume the pending design but leave the posterior
    /// and the trial log untouched. Scored responses run the Bayes update and
    /// append a trial carrying the post-update posterior summary. Invalid
    /// payloads are rejected without consuming the pending design, so the
    /// caller may correct and resubmit.
    pub fn submit_response(&mut self, input: ResponseInput) -> Result<ResponseOutcome, DdtError> {
        if self.pending.is_none() {
            return Err(DdtError::InvalidState(ErrorInfo::new(
                "no-pending-design",
                "a response arrived with no design outstanding",
            )));
        }
        if input.resp_left > 1 || input.direction > 1 {
            return Err(DdtError::InvalidState(
                ErrorInfo::new("response-flags", "resp_left and direction must be 0 or 1")
                    .with_context("resp_left", input.resp_left.to_string())
                    .with_context("direction", input.direction.to_string()),
            ));
        }
        if !input.rt.is_finite() || input.rt < 0.0 {
            return Err(DdtError::InvalidState(
                ErrorInfo::new("reaction-time", "reaction time must be finite and non-negative")
                    .with_context("rt", input.rt.to_string()),
            ));
        }
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => unreachable!("pending presence checked above"),
        };
        if pending.mode == QueryMode::Train {
            return Ok(ResponseOutcome {
                finished: false,
                recorded: None,
            });
        }
        let resp_ss = resp_ss_from(input.resp_left, input.direction);
        self.engine.update(&pending.design, resp_ss)?;
        let mean = self.engine.posterior_mean();
        let sd = self.engine.posterior_sd();
        let ordinal = self.log.append(Trial {
            subject: self.config.subject_id,
            block: self.block,
            block_type: self.block_type,
            trial: 0,
            t_ss: pending.design.t_ss,
            t_ll: pending.design.t_ll,
            r_ss: pending.design.r_ss,
            r_ll: pending.design.r_ll,
            resp_ss,
            rt: input.rt,
            mean_k: mean.k,
            mean_tau: mean.tau,
            sd_k: sd.k,
            sd_tau: sd.tau,
        });
        let finished = self.log.len() as u32 >= self.config.num_main_trials;
        tracing::info!(
            subject = %self.config.subject_id,
            trial = ordinal,
            resp_ss,
            mean_k = mean.k,
            finished,
            "trial recorded"
        );
        Ok(ResponseOutcome {
            finished,
            recorded: self.log.last().cloned(),
        })
    }

    /// Advances to the next scored block.
    ///
    /// The posterior is reset to uniform so earlier blocks leave no trace;
    /// any outstanding query is discarded.
    pub fn begin_block(&mut self, block_type: BlockType) {
        self.block += 1;
        self.block_type = block_type;
        self.pending = None;
        self.engine.reset();
        tracing::info!(
            subject = %self.config.subject_id,
            block = self.block,
            block_type = block_type.as_str(),
            "block started"
        );
    }

    /// True once the session outlived the given TTL at instant `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_seconds: i64) -> bool {
        now.signed_duration_since(self.created_at).num_seconds() > ttl_seconds
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subject the session belongs to.
    pub fn subject(&self) -> SubjectId {
        self.config.subject_id
    }

    /// Instant the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record filename the session persists to.
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Current scored block number.
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Current block type.
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Recorded trials in ordinal order.
    pub fn log(&self) -> &TrialLog {
        &self.log
    }

    /// The design awaiting a response, if any.
    pub fn pending_design(&self) -> Option<&Design> {
        self.pending.as_ref().map(|pending| &pending.design)
    }

    /// True once the scored block holds the configured number of trials.
    pub fn finished(&self) -> bool {
        self.log.len() as u32 >= self.config.num_main_trials
    }

    /// Marginal posterior means under the current weights.
    pub fn posterior_mean(&self) -> ParamEstimate {
        self.engine.posterior_mean()
    }

    /// Marginal posterior standard deviations under the current weights.
    pub fn posterior_sd(&self) -> ParamEstimate {
        self.engine.posterior_sd()
    }

    /// Digest binding this session to its design and parameter grids.
    pub fn grid_digest(&self) -> String {
        format!(
            "{}:{}",
            self.selector.designs().digest(),
            self.engine.params().digest()
        )
    }
}
