//! Trajectory simulation module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use rand_distr::NormalError;
use util::{logger::STEP_TARGET, module::State};

// Internal
use super::*;
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single simulation run.
///
/// Each call to `proc` advances the run by one step and appends a sample to
/// the trajectory.
pub struct TrajSim {
    params: SimParams,

    /// Controller computing each step's action
    controller: Controller,

    /// Actuator noise, if any
    noise: Option<NoiseGenerator>,

    /// Current pose of the robot
    pose: Pose,

    /// Number of steps simulated so far
    step: usize,

    /// Set once the step limit is hit or the controller stops
    finished: bool,

    trajectory: Trajectory
}

/// The status report of a single step.
#[derive(Debug, Default, Copy, Clone)]
pub struct StatusReport {
    /// Step number of the sample produced, if any
    pub step: usize,

    /// Distance from the robot to the target
    pub dist_to_target_m: f64,

    /// True if the controller ended the run on this step
    pub stopped_at_target: bool,

    /// True if the run is over
    pub finished: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur in the simulation.
#[derive(Debug, thiserror::Error)]
pub enum TrajSimError {
    #[error("Obstacle {index} has an invalid radius or centre (radius = {radius_m})")]
    InvalidObstacle {
        index: usize,
        radius_m: f64
    },

    #[error("Parameter {0} is not finite")]
    NonFiniteParam(&'static str),

    #[error("Parameter {0} must not be negative")]
    NegativeParam(&'static str),

    /// The target is at the initial position and the mode needs a direction
    /// to it at the first step.
    #[error("The target is at the initial position, {0} mode has no direction to follow")]
    DegenerateDirection(&'static str),

    #[error("Invalid noise parameters: {0}")]
    InvalidNoise(NormalError),

    /// `proc` was called after the run had finished.
    #[error("The simulation run has already finished")]
    RunFinished
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajSim {
    type InitData = SimParams;
    type InitError = TrajSimError;

    type InputData = ();
    type OutputData = TrajectorySample;
    type StatusReport = StatusReport;
    type ProcError = TrajSimError;

    /// Initialise a run, seeding the noise from the parameters.
    fn init(params: SimParams) -> Result<Self, TrajSimError> {
        params.validate()?;

        let noise = match &params.noise {
            Some(p) => Some(NoiseGenerator::new(p).map_err(TrajSimError::InvalidNoise)?),
            None => None
        };

        Self::build(params, noise)
    }

    /// Simulate one step.
    ///
    /// The output is the sample appended to the trajectory. If the controller
    /// ends the run on this step no new sample is produced and the last
    /// sample is returned again.
    fn proc(
        &mut self,
        _input_data: &()
    ) -> Result<(TrajectorySample, StatusReport), TrajSimError> {
        if self.finished {
            return Err(TrajSimError::RunFinished)
        }

        let mut report = StatusReport {
            dist_to_target_m: self.pose.distance_to(&self.params.target_m),
            ..Default::default()
        };

        let action = self.controller.action(
            &self.pose,
            &self.params.target_m,
            &self.params.obstacles
        );

        // Motion commanded by the controller, heading is only changed by a
        // steer action
        let commanded_m = match action {
            Action::Translate(delta_m) => delta_m,
            Action::Steer { heading_rad } => {
                self.pose.heading_rad = heading_rad;
                self.params.speed_ms * self.pose.forward2()
            },
            Action::Stop => {
                info!(
                    "Target reached after {} steps ({:.3} m away)",
                    self.step, report.dist_to_target_m
                );
                self.trajectory.set_terminated_early();
                self.finished = true;

                report.step = self.step;
                report.stopped_at_target = true;
                report.finished = true;

                return Ok((self.last_sample(), report))
            }
        };

        let actual_m = match self.noise.as_mut() {
            Some(n) => n.perturb(commanded_m),
            None => commanded_m
        };

        self.pose.position_m += actual_m + self.params.drift_m;
        self.step += 1;

        let sample = self.sample();
        self.trajectory.push(sample);

        trace!(
            target: STEP_TARGET,
            "{:4}: pos [{:8.4}, {:8.4}], head {:7.4}, error {:8.4}",
            sample.step,
            sample.position_m[0],
            sample.position_m[1],
            self.pose.heading_rad,
            sample.error
        );

        if self.step >= self.params.num_steps {
            self.finished = true;
        }

        report.step = sample.step;
        report.dist_to_target_m = self.pose.distance_to(&self.params.target_m);
        report.finished = self.finished;

        Ok((sample, report))
    }
}

impl TrajSim {
    /// Initialise a run with an explicitly provided noise generator.
    ///
    /// The noise parameters in `params` are ignored.
    pub fn with_noise(params: SimParams, noise: NoiseGenerator) -> Result<Self, TrajSimError> {
        Self::build(params, Some(noise))
    }

    fn build(params: SimParams, noise: Option<NoiseGenerator>) -> Result<Self, TrajSimError> {
        params.validate()?;

        let controller = Controller::new(&params);

        debug!(
            "TrajSim init: {} mode, {} steps, {} obstacle(s), noise: {}",
            params.mode.name(),
            params.num_steps,
            params.obstacles.len(),
            noise.is_some()
        );

        let mut sim = Self {
            pose: Pose::new(params.initial_pose.position_m, params.initial_pose.heading_rad),
            controller,
            noise,
            step: 0,
            finished: params.num_steps == 0,
            trajectory: Trajectory::with_capacity(params.num_steps + 1),
            params
        };

        // The initial pose is always the first sample
        let initial = sim.sample();
        sim.trajectory.push(initial);

        Ok(sim)
    }

    /// Run all remaining steps and return the trajectory.
    pub fn run(mut self) -> Result<Trajectory, TrajSimError> {
        while !self.finished {
            self.proc(&())?;
        }

        Ok(self.trajectory)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Build the sample for the current pose.
    fn sample(&self) -> TrajectorySample {
        let error = match self.params.error_metric {
            ErrorMetric::Distance => self.pose.distance_to(&self.params.target_m),
            ErrorMetric::SignedX => self.params.target_m[0] - self.pose.position_m[0]
        };

        TrajectorySample {
            step: self.step,
            position_m: self.pose.position_m,
            heading_rad: match self.params.mode.models_heading() {
                true => Some(self.pose.heading_rad),
                false => None
            },
            error
        }
    }

    fn last_sample(&self) -> TrajectorySample {
        match self.trajectory.last() {
            Some(s) => *s,
            None => self.sample()
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Simulate a full run.
///
/// Noise, if any, is seeded from the parameters, so the result is a pure
/// function of `params`.
pub fn simulate(params: &SimParams) -> Result<Trajectory, TrajSimError> {
    TrajSim::init(params.clone())?.run()
}

/// Simulate a full run using the given noise generator.
pub fn simulate_with_noise(
    params: &SimParams,
    noise: NoiseGenerator
) -> Result<Trajectory, TrajSimError> {
    TrajSim::with_noise(params.clone(), noise)?.run()
}
