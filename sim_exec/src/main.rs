//! # Scenario runner
//!
//! Runs every simulation of a scenario file, logs a summary of each run and archives the
//! trajectories into a new session directory.
//!
//! ```text
//! sim_exec potential_field.toml --log-level trace
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    env,
    path::{Path, PathBuf},
};

use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use structopt::StructOpt;

use sim_lib::scenario::{RunOutput, ScenarioParams};
use util::{
    host,
    logger::{logger_init, parse_level},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CLI
// ------------------------------------------------------------------------------------------------

/// Run a trajectory simulation scenario.
#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec")]
struct Opt {
    /// Path to the scenario TOML file. If no such file exists it is looked up in the
    /// `params/scenarios` directory of the root, so `potential_field.toml` is enough.
    #[structopt(parse(from_os_str))]
    scenario: PathBuf,

    /// Minimum log level. Trace also logs every step.
    #[structopt(
        short,
        long,
        default_value = "info",
        possible_values = &["info", "debug", "trace"],
        case_insensitive = true
    )]
    log_level: String,

    /// Directory in which the sessions directory is created. Defaults to the software root, or the
    /// current directory if that is not set.
    #[structopt(long, parse(from_os_str))]
    root: Option<PathBuf>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let root = match opt.root.clone() {
        Some(r) => r,
        None => match host::get_sw_root() {
            Ok(r) => r,
            Err(_) => env::current_dir().wrap_err("Could not get the current directory")?,
        },
    };

    // Initialise session
    let session =
        Session::new("sim_exec", &root, "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = parse_level(&opt.log_level).wrap_err("Invalid log level")?;
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    info!("Trajectory Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let scenario: ScenarioParams = if opt.scenario.is_file() {
        util::params::load_path(&opt.scenario)
    } else {
        util::params::load_in(&root, Path::new("scenarios").join(&opt.scenario))
    }
    .wrap_err_with(|| format!("Could not load scenario {:?}", opt.scenario))?;

    info!(
        "Loaded scenario \"{}\" with {} run(s)",
        scenario.title,
        scenario.runs.len()
    );

    // ---- RUN ----

    let outputs = scenario.run().wrap_err("Scenario failed")?;

    info!("Scenario complete\n");
    log_summary(&outputs);

    // ---- ARCHIVE ----

    scenario
        .archive(&session, &outputs)
        .wrap_err("Failed to archive the scenario")?;

    info!("Trajectories archived to {:?}", session.session_root);

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn log_summary(outputs: &[RunOutput]) {
    info!(
        "{:<20} {:<16} {:>7} {:>11} {:>10} {:>6} {:>10}",
        "run", "mode", "samples", "final err", "dist [m]", "early", "margin [m]"
    );

    for o in outputs {
        let s = &o.summary;
        let margin = match s.min_obstacle_margin_m {
            Some(m) => format!("{:.3}", m),
            None => "-".into(),
        };

        info!(
            "{:<20} {:<16} {:>7} {:>11.4} {:>10.4} {:>6} {:>10}",
            o.label, s.mode, s.num_samples, s.final_error, s.final_dist_m, s.terminated_early, margin
        );

        if s.num_samples < 2 {
            warn!("Run \"{}\" produced no steps", o.label);
        }
    }
}
