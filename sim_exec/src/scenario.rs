//! # Scenarios
//!
//! A scenario is a titled set of simulation runs sharing a parameter file, for example an open
//! loop and a closed loop run towards the same target so the two can be compared. Each run's
//! trajectory is archived into the session both as a flat CSV and as a JSON document holding
//! everything a renderer needs to draw it (target, obstacles and samples).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::{
    archive::{ArchiveError, Archiver},
    session::{Session, SessionError},
};

use crate::traj_sim::{simulate, Obstacle, SimParams, TrajSimError, Trajectory, TrajectorySample};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Title of the scenario, used in reports and by the renderer
    pub title: String,

    /// The runs making up the scenario
    pub runs: Vec<RunParams>,
}

/// A single labelled run of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    /// Label of the run, must be unique within the scenario as it names the archive files
    pub label: String,

    /// The simulation parameters
    pub sim: SimParams,
}

/// The result of a run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub label: String,
    pub trajectory: Trajectory,
    pub summary: RunSummary,
}

/// Summary figures of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Name of the control mode
    pub mode: &'static str,

    /// Number of samples in the trajectory
    pub num_samples: usize,

    /// Error of the last sample
    pub final_error: f64,

    /// Distance from the last sample to the target
    pub final_dist_m: f64,

    /// True if the target was reached before the step limit
    pub terminated_early: bool,

    /// Smallest clearance (distance to centre minus radius) over all obstacles, negative values
    /// mean a collision.
    pub min_obstacle_margin_m: Option<f64>,
}

/// Document written for the renderer.
#[derive(Serialize)]
struct RenderData<'a> {
    title: &'a str,
    label: &'a str,
    target_m: &'a Vector2<f64>,
    obstacles: &'a [Obstacle],
    summary: &'a RunSummary,
    samples: &'a [TrajectorySample],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("The scenario contains no runs")]
    NoRuns,

    #[error("Run label \"{0}\" is used more than once")]
    DuplicateLabel(String),

    #[error("Run \"{0}\" failed: {1}")]
    RunFailed(String, TrajSimError),

    #[error("Could not archive run \"{0}\": {1}")]
    ArchiveFailed(String, ArchiveError),

    #[error("Could not save run \"{0}\": {1}")]
    SaveFailed(String, SessionError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScenarioParams {
    /// Check the scenario's structure. The parameters of each run are checked when it starts.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.runs.is_empty() {
            return Err(ScenarioError::NoRuns);
        }

        for (i, run) in self.runs.iter().enumerate() {
            if self.runs[..i].iter().any(|r| r.label == run.label) {
                return Err(ScenarioError::DuplicateLabel(run.label.clone()));
            }
        }

        Ok(())
    }

    /// Simulate every run of the scenario in order.
    ///
    /// All runs are checked before any is simulated, so an invalid run stops the scenario before
    /// any output is produced.
    pub fn run(&self) -> Result<Vec<RunOutput>, ScenarioError> {
        self.validate()?;

        for run in &self.runs {
            run.sim
                .validate()
                .map_err(|e| ScenarioError::RunFailed(run.label.clone(), e))?;
        }

        info!("Running scenario \"{}\" ({} runs)", self.title, self.runs.len());

        self.runs.iter().map(RunParams::run).collect()
    }

    /// Archive the outputs of the scenario into the session.
    pub fn archive(&self, session: &Session, outputs: &[RunOutput]) -> Result<(), ScenarioError> {
        for (run, output) in self.runs.iter().zip(outputs) {
            archive_run(session, &self.title, run, output)?;
        }

        Ok(())
    }
}

impl RunParams {
    /// Simulate the run.
    pub fn run(&self) -> Result<RunOutput, ScenarioError> {
        let trajectory =
            simulate(&self.sim).map_err(|e| ScenarioError::RunFailed(self.label.clone(), e))?;

        let summary = RunSummary::new(&self.sim, &trajectory);

        if let Some(m) = summary.min_obstacle_margin_m {
            if m < 0.0 {
                warn!("Run \"{}\" passed {:.3} m inside an obstacle", self.label, -m);
            }
        }

        Ok(RunOutput {
            label: self.label.clone(),
            trajectory,
            summary,
        })
    }
}

impl RunSummary {
    pub fn new(params: &SimParams, trajectory: &Trajectory) -> Self {
        let last = trajectory.last();

        let min_obstacle_margin_m = params
            .obstacles
            .iter()
            .filter_map(|o| trajectory.min_clearance_m(o).map(|c| c - o.radius_m))
            .fold(None, |min: Option<f64>, m| match min {
                Some(v) if v <= m => Some(v),
                _ => Some(m),
            });

        Self {
            mode: params.mode.name(),
            num_samples: trajectory.len(),
            final_error: last.map_or(std::f64::NAN, |s| s.error),
            final_dist_m: last.map_or(std::f64::NAN, |s| (params.target_m - s.position_m).norm()),
            terminated_early: trajectory.terminated_early(),
            min_obstacle_margin_m,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Write the CSV archive and the renderer document of a single run.
///
/// Files are `arch/{label}.csv` and `{label}.json` relative to the session root.
pub fn archive_run(
    session: &Session,
    title: &str,
    run: &RunParams,
    output: &RunOutput,
) -> Result<(), ScenarioError> {
    let archive_err = |e| ScenarioError::ArchiveFailed(run.label.clone(), e);

    let mut archiver = Archiver::from_path(session, format!("{}.csv", run.label))
        .map_err(archive_err)?;
    for record in output.trajectory.records() {
        archiver.serialise(record).map_err(archive_err)?;
    }
    archiver.flush().map_err(archive_err)?;

    let render_data = RenderData {
        title,
        label: &run.label,
        target_m: &run.sim.target_m,
        obstacles: &run.sim.obstacles,
        summary: &output.summary,
        samples: output.trajectory.samples(),
    };

    session
        .save_json(format!("{}.json", run.label), &render_data)
        .map_err(|e| ScenarioError::SaveFailed(run.label.clone(), e))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        loc::Pose,
        traj_sim::{ControlMode, ErrorMetric, OpenLoopPlan},
    };

    fn run(label: &str, mode: ControlMode) -> RunParams {
        RunParams {
            label: label.into(),
            sim: SimParams {
                initial_pose: Pose::new(Vector2::zeros(), 0.0),
                target_m: Vector2::new(10.0, 0.0),
                obstacles: vec![Obstacle::new(Vector2::new(20.0, 5.0), 1.0)],
                num_steps: 20,
                mode,
                speed_ms: 0.5,
                drift_m: Vector2::zeros(),
                noise: None,
                error_metric: ErrorMetric::SignedX,
            },
        }
    }

    fn scenario() -> ScenarioParams {
        ScenarioParams {
            title: "Open vs closed loop".into(),
            runs: vec![
                run(
                    "open_loop",
                    ControlMode::OpenLoop {
                        plan: OpenLoopPlan::Constant {
                            delta_m: Vector2::new(0.5, 0.0),
                        },
                    },
                ),
                run("closed_loop", ControlMode::Proportional { gain: 0.1 }),
            ],
        }
    }

    #[test]
    fn test_run_summaries() {
        let outputs = scenario().run().unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].label, "open_loop");
        assert_eq!(outputs[0].summary.num_samples, 21);
        assert_eq!(outputs[0].summary.final_error, 0.0);
        assert_eq!(outputs[0].summary.mode, "open loop");

        // Gain 0.1 over 20 steps leaves 10 * 0.9^20 ~= 1.22 m to go
        let closed = &outputs[1].summary;
        assert!((closed.final_error - 10.0 * 0.9f64.powi(20)).abs() < 1e-9);
        assert!(!closed.terminated_early);

        // Obstacle at (20, 5) radius 1, closest sample is (10, 0)
        let margin = closed.min_obstacle_margin_m.unwrap();
        assert!(margin > 9.0);
    }

    #[test]
    fn test_bad_scenarios() {
        let mut s = scenario();
        s.runs[1].label = "open_loop".into();
        assert!(matches!(s.run(), Err(ScenarioError::DuplicateLabel(_))));

        let mut s = scenario();
        s.runs.clear();
        assert!(matches!(s.run(), Err(ScenarioError::NoRuns)));

        let mut s = scenario();
        s.runs[1].sim.obstacles[0].radius_m = std::f64::NAN;
        match s.run() {
            Err(ScenarioError::RunFailed(label, TrajSimError::InvalidObstacle { .. })) => {
                assert_eq!(label, "closed_loop")
            }
            r => panic!("Unexpected result {:?}", r.map(|o| o.len())),
        }
    }

    #[test]
    fn test_shipped_scenarios() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let load = |name: &str| -> ScenarioParams {
            util::params::load_in(&root, format!("scenarios/{}.toml", name))
                .unwrap_or_else(|e| panic!("Could not load {}: {}", name, e))
        };

        for name in &[
            "open_vs_closed_1d",
            "weak_motor_1d",
            "open_vs_closed_2d",
            "pure_pursuit",
            "potential_field",
        ] {
            let s = load(name);
            let outputs = s.run().unwrap();
            assert_eq!(outputs.len(), s.runs.len());
        }

        let outputs = load("potential_field").run().unwrap();
        assert!(outputs[0].summary.min_obstacle_margin_m.unwrap() > 0.0);
        assert!(outputs[0].trajectory.samples()[5].heading_rad.is_some());
    }

    #[test]
    fn test_archive() {
        let root = tempfile::tempdir().unwrap();
        let session = Session::new("scenario_test", root.path(), "sessions").unwrap();

        let s = scenario();
        let outputs = s.run().unwrap();
        s.archive(&session, &outputs).unwrap();

        let csv = std::fs::read_to_string(session.arch_root.join("closed_loop.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("step,x_m,y_m,heading_rad,error"));
        assert_eq!(lines.count(), 21);

        let json = std::fs::read_to_string(session.session_root.join("open_loop.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["title"], "Open vs closed loop");
        assert_eq!(doc["samples"].as_array().unwrap().len(), 21);
        assert_eq!(doc["target_m"][0], 10.0);
        assert_eq!(doc["obstacles"][0]["radius_m"], 1.0);
    }
}
