//! Trajectory simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use super::{NoiseParams, Obstacle, TrajSimError};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a single simulation run.
///
/// Built once per run and never modified by the simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimParams {

    /// Pose of the robot at step 0
    pub initial_pose: Pose,

    /// Position the robot is controlled towards
    pub target_m: Vector2<f64>,

    /// Circular obstacles, only the potential field mode reacts to them.
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,

    /// Maximum number of steps to simulate
    pub num_steps: usize,

    /// The control mode and its gains
    pub mode: ControlMode,

    /// Magnitude of the commanded motion per step, used by the open loop
    /// `TowardTarget` plan and by the constant speed, pure pursuit and
    /// potential field modes.
    #[serde(default = "default_speed_ms")]
    pub speed_ms: f64,

    /// Constant displacement added to the position every step (e.g. wind)
    #[serde(default)]
    pub drift_m: Vector2<f64>,

    /// Optional actuator noise
    #[serde(default)]
    pub noise: Option<NoiseParams>,

    /// How the per-sample error is measured
    #[serde(default)]
    pub error_metric: ErrorMetric
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The control mode used to choose each step's motion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ControlMode {
    /// Repeat a plan computed once at the start, never reading the error.
    OpenLoop {
        plan: OpenLoopPlan
    },

    /// Translate by `gain * (target - position)`.
    Proportional {
        gain: f64
    },

    /// Translate by `speed_ms` along the direction to the target.
    ConstantSpeed,

    /// Turn towards the bearing of the target and drive forward.
    PurePursuit {
        /// Fraction of the heading error corrected each step
        heading_gain: f64
    },

    /// Turn towards the sum of target attraction and obstacle repulsion and
    /// drive forward.
    PotentialField {
        /// Fraction of the heading error corrected each step
        heading_gain: f64,

        /// Distance beyond an obstacle's radius within which it repels
        danger_margin_m: f64,

        /// The run ends once the distance to the target is below this
        stop_tolerance_m: f64,

        /// Weight of the tangential detour around obstacles blocking the way
        /// to the target. Zero leaves only the radial repulsion, which cannot
        /// steer around an obstacle lying exactly on the robot's path.
        #[serde(default = "default_detour_gain")]
        detour_gain: f64
    }
}

/// The plan of an open loop run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum OpenLoopPlan {
    /// The same fixed displacement every step.
    Constant {
        delta_m: Vector2<f64>
    },

    /// `speed_ms` along the direction from the initial position to the
    /// target, as seen at the start of the run.
    TowardTarget
}

/// Error quantity recorded in each sample.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum ErrorMetric {
    /// Euclidian distance to the target
    Distance,

    /// `target.x - position.x`, for one dimensional runs along the X axis
    SignedX
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ErrorMetric {
    fn default() -> Self {
        ErrorMetric::Distance
    }
}

impl ControlMode {
    /// Whether the mode steers a heading, in which case samples carry it.
    pub fn models_heading(&self) -> bool {
        matches!(
            self,
            ControlMode::PurePursuit { .. } | ControlMode::PotentialField { .. }
        )
    }

    /// Whether the mode needs a direction to the target at step 0.
    fn needs_direction(&self) -> bool {
        match self {
            ControlMode::OpenLoop { plan } => matches!(plan, OpenLoopPlan::TowardTarget),
            ControlMode::Proportional { .. } => false,
            ControlMode::ConstantSpeed | ControlMode::PurePursuit { .. } => true,
            // With a non-zero tolerance the run simply stops on the first step
            ControlMode::PotentialField { stop_tolerance_m, .. } => *stop_tolerance_m <= 0.0
        }
    }

    /// Short name of the mode for reporting.
    pub fn name(&self) -> &'static str {
        match self {
            ControlMode::OpenLoop { .. } => "open loop",
            ControlMode::Proportional { .. } => "proportional",
            ControlMode::ConstantSpeed => "constant speed",
            ControlMode::PurePursuit { .. } => "pure pursuit",
            ControlMode::PotentialField { .. } => "potential field"
        }
    }
}

impl SimParams {
    /// Check the parameters before a run is started.
    pub fn validate(&self) -> Result<(), TrajSimError> {
        check_finite_vec("initial_pose.position_m", &self.initial_pose.position_m)?;
        check_finite("initial_pose.heading_rad", self.initial_pose.heading_rad)?;
        check_finite_vec("target_m", &self.target_m)?;
        check_finite_vec("drift_m", &self.drift_m)?;
        check_non_negative("speed_ms", self.speed_ms)?;

        for (index, obs) in self.obstacles.iter().enumerate() {
            let centre_finite = obs.centre_m.iter().all(|c| c.is_finite());
            if !centre_finite || !obs.radius_m.is_finite() || obs.radius_m < 0.0 {
                return Err(TrajSimError::InvalidObstacle {
                    index,
                    radius_m: obs.radius_m
                })
            }
        }

        match &self.mode {
            ControlMode::OpenLoop { plan: OpenLoopPlan::Constant { delta_m } } => {
                check_finite_vec("mode.plan.delta_m", delta_m)?;
            },
            ControlMode::OpenLoop { plan: OpenLoopPlan::TowardTarget } => (),
            ControlMode::Proportional { gain } => {
                check_non_negative("mode.gain", *gain)?;
            },
            ControlMode::ConstantSpeed => (),
            ControlMode::PurePursuit { heading_gain } => {
                check_non_negative("mode.heading_gain", *heading_gain)?;
            },
            ControlMode::PotentialField {
                heading_gain,
                danger_margin_m,
                stop_tolerance_m,
                detour_gain
            } => {
                check_non_negative("mode.heading_gain", *heading_gain)?;
                check_non_negative("mode.danger_margin_m", *danger_margin_m)?;
                check_non_negative("mode.stop_tolerance_m", *stop_tolerance_m)?;
                check_non_negative("mode.detour_gain", *detour_gain)?;
            }
        }

        if let Some(noise) = &self.noise {
            check_finite("noise.mean", noise.mean)?;
            check_non_negative("noise.std_dev", noise.std_dev)?;
        }

        if self.mode.needs_direction() && self.initial_pose.position_m == self.target_m {
            return Err(TrajSimError::DegenerateDirection(self.mode.name()))
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_speed_ms() -> f64 {
    0.5
}

fn default_detour_gain() -> f64 {
    1.0
}

fn check_finite(name: &'static str, value: f64) -> Result<(), TrajSimError> {
    if value.is_finite() {
        Ok(())
    }
    else {
        Err(TrajSimError::NonFiniteParam(name))
    }
}

fn check_finite_vec(name: &'static str, value: &Vector2<f64>) -> Result<(), TrajSimError> {
    check_finite(name, value[0])?;
    check_finite(name, value[1])
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), TrajSimError> {
    check_finite(name, value)?;

    if value < 0.0 {
        return Err(TrajSimError::NegativeParam(name))
    }

    Ok(())
}
