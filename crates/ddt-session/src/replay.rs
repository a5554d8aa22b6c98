//! Deterministic state reconstruction from persisted trial records.
//!
//! Replaying a snapshot's trial records through a fresh engine must land on
//! the same posterior the original sequential updates produced; that property
//! is what lets the experiment run across stateless invocations with no
//! retained process memory. Updates are applied one trial at a time in
//! ordinal order with a full renormalization each step, exactly as the online
//! path does, so the floating-point reduction order is identical.

use chrono::{DateTime, Utc};
use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_engine::{DesignSelector, DesignSpace, ParamSpace, PosteriorEngine};

use crate::session::{PendingQuery, Session};
use crate::snapshot::SessionSnapshot;
use crate::trial::TrialLog;

/// Tolerance for the recorded-vs-rebuilt posterior consistency check.
pub const REPLAY_TOLERANCE: f64 = 1e-6;

/// Rebuilds a live session from a snapshot.
///
/// Refuses expired snapshots outright: a pending design in an expired
/// session is stale context and must never be answered, so the whole session
/// is discarded rather than resumed. Also refuses snapshots whose grid
/// digest does not match the standard grids and records whose replayed
/// posterior disagrees with the persisted summary.
pub fn rebuild(
    snapshot: &SessionSnapshot,
    now: DateTime<Utc>,
    ttl_seconds: i64,
) -> Result<Session, DdtError> {
    let age = now.signed_duration_since(snapshot.created_at).num_seconds();
    if age > ttl_seconds {
        return Err(DdtError::Expired(
            ErrorInfo::new("session-ttl", "snapshot is older than the session TTL")
                .with_context("age_seconds", age.to_string())
                .with_context("ttl_seconds", ttl_seconds.to_string()),
        ));
    }
    if snapshot.exp_state.subject != snapshot.config.subject_id
        || snapshot.exp_state.session != snapshot.config.session
    {
        return Err(DdtError::Serde(ErrorInfo::new(
            "snapshot-inconsistent",
            "exp_state identity disagrees with the session config",
        )));
    }

    let params = ParamSpace::standard()?;
    let designs = DesignSpace::standard()?;
    let selector = DesignSelector::new(designs, &params);
    let mut engine = PosteriorEngine::new(params);

    if let Some(digest) = &snapshot.grid_digest {
        let current = format!(
            "{}:{}",
            selector.designs().digest(),
            engine.params().digest()
        );
        if *digest != current {
            return Err(DdtError::Configuration(
                ErrorInfo::new(
                    "grid-digest-mismatch",
                    "snapshot was produced against different grids",
                )
                .with_context("snapshot", digest.clone()),
            ));
        }
    }

    let log = TrialLog::from_records(snapshot.exp_state.trials.clone())?;
    replay_log(&mut engine, &log, snapshot.exp_state.block)?;

    if let Some(last) = log.last() {
        let mean = engine.posterior_mean();
        let sd = engine.posterior_sd();
        // only compare when the final trial belongs to the current block;
        // otherwise the reset at the block boundary already cleared it
        let comparable = last.block == snapshot.exp_state.block;
        if comparable
            && ((mean.k - last.mean_k).abs() > REPLAY_TOLERANCE
                || (mean.tau - last.mean_tau).abs() > REPLAY_TOLERANCE
                || (sd.k - last.sd_k).abs() > REPLAY_TOLERANCE
                || (sd.tau - last.sd_tau).abs() > REPLAY_TOLERANCE)
        {
            return Err(DdtError::Configuration(
                ErrorInfo::new(
                    "replay-divergence",
                    "replayed posterior disagrees with the recorded summary",
                )
                .with_context("recorded_mean_k", last.mean_k.to_string())
                .with_context("replayed_mean_k", mean.k.to_string()),
            ));
        }
    }

    let pending = snapshot.last_design.map(|design| PendingQuery {
        design,
        mode: snapshot.exp_state.block_type.query_mode(),
    });

    tracing::info!(
        subject = %snapshot.exp_state.subject,
        trials = log.len(),
        block = snapshot.exp_state.block,
        "session rebuilt from snapshot"
    );

    Ok(Session::assemble(
        snapshot.config.clone(),
        snapshot.created_at,
        snapshot.exp_state.output_path.clone(),
        snapshot.exp_state.block,
        snapshot.exp_state.block_type,
        engine,
        selector,
        log,
        pending,
    ))
}

/// Re-applies every trial in ascending ordinal order.
///
/// The posterior resets at each block boundary, mirroring the online path
/// where a new scored block starts from uniform weights; a trailing reset
/// covers a block that was begun but has no trials yet.
fn replay_log(
    engine: &mut PosteriorEngine,
    log: &TrialLog,
    current_block: u32,
) -> Result<(), DdtError> {
    let mut replay_block = None;
    for trial in log.trials() {
        if replay_block.is_some_and(|block| block != trial.block) {
            engine.reset();
        }
        replay_block = Some(trial.block);
        engine.update(&trial.design(), trial.resp_ss)?;
    }
    if replay_block.is_some_and(|block| block != current_block) {
        engine.reset();
    }
    Ok(())
}
