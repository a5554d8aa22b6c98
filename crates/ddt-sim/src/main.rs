//! CLI for running simulated experiment sessions end to end.

use std::error::Error;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ddt_core::{derive_substream_seed, resp_ss_from, QueryMode, RngHandle, SubjectId};
use ddt_engine::choice_prob_ss;
use ddt_session::{
    allocate_reserved, build_snapshot, rebuild, scan_used, write_records, DesignQuery,
    DirReservations, ResponseInput, Session, SessionConfig, SessionSnapshot, DEFAULT_TTL_SECONDS,
};

#[derive(Parser, Debug)]
#[command(name = "ddt-sim", about = "Simulated DDT experiment sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full simulated session and persist its record and snapshot.
    Run(RunArgs),
    /// Rebuild a session from a snapshot and report the next optimal design.
    Replay(ReplayArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Data directory holding records, snapshots and reservations.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Subject id; allocated from the namespace scan when omitted.
    #[arg(long)]
    subject: Option<u16>,
    /// Session number for the subject.
    #[arg(long, default_value_t = 1)]
    session: u32,
    /// Number of recorded trials in the scored block.
    #[arg(long, default_value_t = 20)]
    trials: u32,
    /// Number of unrecorded training trials.
    #[arg(long, default_value_t = 5)]
    train_trials: u32,
    /// True discount rate of the simulated subject.
    #[arg(long, default_value_t = 0.02)]
    true_k: f64,
    /// True choice temperature of the simulated subject.
    #[arg(long, default_value_t = 1.5)]
    true_tau: f64,
    /// Master seed for the simulated subject's responses.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(ClapArgs, Debug)]
struct ReplayArgs {
    /// Snapshot file produced by a previous run.
    #[arg(long)]
    snapshot: PathBuf,
    /// Session TTL in seconds; raise it when replaying old snapshots.
    #[arg(long, default_value_t = DEFAULT_TTL_SECONDS)]
    ttl: i64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_session(args),
        Command::Replay(args) => run_replay(args),
    }
}

fn run_session(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let subject = match args.subject {
        Some(raw) => SubjectId::new(raw)?,
        None => {
            let used = scan_used(&args.data_dir)?;
            let store = DirReservations::new(&args.data_dir);
            allocate_reserved(&used, &store)?
        }
    };

    let mut config = SessionConfig::new(subject);
    config.session = args.session;
    config.num_main_trials = args.trials;
    config.num_train_trials = args.train_trials;
    let mut session = Session::start(config, Utc::now())?;

    for trial in 0..args.train_trials {
        let query = session.next_design(QueryMode::Train)?;
        let input = simulate_response(&query, &args, u64::from(trial));
        session.submit_response(input)?;
    }

    let mut finished = session.finished();
    let mut trial = args.train_trials;
    while !finished {
        let query = session.next_design(QueryMode::Optimal)?;
        let input = simulate_response(&query, &args, u64::from(trial));
        finished = session.submit_response(input)?.finished;
        trial += 1;
    }

    let record_path = args.data_dir.join(session.output_path());
    write_records(&record_path, session.log())?;

    let snapshot = build_snapshot(&session);
    let snapshot_path = record_path.with_extension("snapshot.json");
    snapshot.store(&snapshot_path)?;

    let mean = session.posterior_mean();
    let sd = session.posterior_sd();
    let summary = json!({
        "subject": subject.as_raw(),
        "session": args.session,
        "trials": session.log().len(),
        "true_k": args.true_k,
        "true_tau": args.true_tau,
        "mean_k": mean.k,
        "mean_tau": mean.tau,
        "sd_k": sd.k,
        "sd_tau": sd.tau,
        "record": record_path,
        "snapshot": snapshot_path,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn Error>> {
    let snapshot = SessionSnapshot::load(&args.snapshot)?;
    let mut session = rebuild(&snapshot, Utc::now(), args.ttl)?;

    let mean = session.posterior_mean();
    let sd = session.posterior_sd();
    let next = if session.pending_design().is_some() {
        None
    } else {
        Some(session.next_design(QueryMode::Optimal)?.design)
    };
    let summary = json!({
        "subject": session.subject().as_raw(),
        "trials": session.log().len(),
        "mean_k": mean.k,
        "mean_tau": mean.tau,
        "sd_k": sd.k,
        "sd_tau": sd.tau,
        "pending_design": session.pending_design(),
        "next_optimal_design": next,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Simulated subject: responds through the same hyperbolic choice model the
/// engine infers against, with a deterministic per-trial substream.
fn simulate_response(query: &DesignQuery, args: &RunArgs, trial: u64) -> ResponseInput {
    let mut rng = RngHandle::from_seed(derive_substream_seed(args.seed, trial));
    let p_ss = choice_prob_ss(&query.design, args.true_k, args.true_tau);
    let resp_ss = u8::from(rng.uniform_f64() < p_ss);
    // express the model's choice as the key press the capture layer would see
    let resp_left = resp_ss_from(resp_ss, query.direction);
    let rt = 0.3 + 1.2 * rng.uniform_f64();
    ResponseInput {
        resp_left,
        direction: query.direction,
        rt,
    }
}
