//! # Trajectory controllers module
//!
//! This module provides the controller for each control mode. A controller
//! looks at the current pose and returns the action for the step, it never
//! applies noise or drift, that is left to the simulation state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector2;
use util::maths::{get_ang_dist, wrap_angle};

// Internal
use super::{ControlMode, Obstacle, OpenLoopPlan, SimParams, EPSILON};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runtime form of a `ControlMode`, with anything that is computed once per
/// run (the open loop plan) already resolved.
#[derive(Debug, Clone)]
pub enum Controller {
    OpenLoop {
        planned_m: Vector2<f64>
    },
    Proportional {
        gain: f64
    },
    ConstantSpeed {
        step_size_m: f64
    },
    PurePursuit {
        heading_gain: f64
    },
    PotentialField {
        heading_gain: f64,
        danger_margin_m: f64,
        stop_tolerance_m: f64,
        detour_gain: f64
    }
}

/// The action chosen by a controller for one step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Action {
    /// Translate by the given displacement, heading is unchanged.
    Translate(Vector2<f64>),

    /// Set the heading to the given (already smoothed) value and drive
    /// forward along it.
    Steer {
        heading_rad: f64
    },

    /// The target has been reached, end the run.
    Stop
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Controller {

    /// Create the controller for the given parameters.
    pub fn new(params: &SimParams) -> Self {
        match &params.mode {
            ControlMode::OpenLoop { plan } => Controller::OpenLoop {
                planned_m: plan_open_loop(plan, params)
            },
            ControlMode::Proportional { gain } => Controller::Proportional {
                gain: *gain
            },
            ControlMode::ConstantSpeed => Controller::ConstantSpeed {
                step_size_m: params.speed_ms
            },
            ControlMode::PurePursuit { heading_gain } => Controller::PurePursuit {
                heading_gain: *heading_gain
            },
            ControlMode::PotentialField {
                heading_gain,
                danger_margin_m,
                stop_tolerance_m,
                detour_gain
            } => Controller::PotentialField {
                heading_gain: *heading_gain,
                danger_margin_m: *danger_margin_m,
                stop_tolerance_m: *stop_tolerance_m,
                detour_gain: *detour_gain
            }
        }
    }

    /// Get the action for the current pose.
    pub fn action(
        &self,
        pose: &Pose,
        target_m: &Vector2<f64>,
        obstacles: &[Obstacle]
    ) -> Action {
        match self {
            // The plan is fixed, the pose is deliberately not read.
            Controller::OpenLoop { planned_m } => Action::Translate(*planned_m),

            Controller::Proportional { gain } => {
                Action::Translate(*gain * pose.vector_to(target_m))
            },

            Controller::ConstantSpeed { step_size_m } => {
                Action::Translate(*step_size_m * normalize_eps(&pose.vector_to(target_m)))
            },

            Controller::PurePursuit { heading_gain } => Action::Steer {
                heading_rad: steer(pose.heading_rad, pose.bearing_to(target_m), *heading_gain)
            },

            Controller::PotentialField {
                heading_gain,
                danger_margin_m,
                stop_tolerance_m,
                detour_gain
            } => {
                if pose.distance_to(target_m) < *stop_tolerance_m {
                    return Action::Stop
                }

                let desired_rad = potential_field_heading(
                    pose, target_m, obstacles, *danger_margin_m, *detour_gain
                );

                Action::Steer {
                    heading_rad: steer(pose.heading_rad, desired_rad, *heading_gain)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a vector, dividing by `norm + EPSILON`.
///
/// A zero vector gives a zero vector rather than NaNs.
pub fn normalize_eps(vector: &Vector2<f64>) -> Vector2<f64> {
    vector / (vector.norm() + EPSILON)
}

/// Turn from `heading_rad` towards `desired_rad` by `gain` times the shortest
/// signed angular difference.
///
/// The difference is wrapped with `atan2(sin, cos)` so a heading of 3 rad
/// chasing a bearing of -3 rad turns through ~0.28 rad, not ~6.
pub fn steer(heading_rad: f64, desired_rad: f64, gain: f64) -> f64 {
    wrap_angle(heading_rad + gain * get_ang_dist(heading_rad, desired_rad))
}

/// Compute the open loop action from the plan and the initial conditions.
fn plan_open_loop(plan: &OpenLoopPlan, params: &SimParams) -> Vector2<f64> {
    match plan {
        OpenLoopPlan::Constant { delta_m } => *delta_m,
        OpenLoopPlan::TowardTarget => {
            params.speed_ms * normalize_eps(&params.initial_pose.vector_to(&params.target_m))
        }
    }
}

/// Desired heading for the potential field controller.
///
/// The attraction is the unit vector to the target, each obstacle whose
/// danger zone contains the robot adds its repulsion and its weighted detour.
/// If no obstacle is in range the desired heading is just the bearing of the
/// target.
fn potential_field_heading(
    pose: &Pose,
    target_m: &Vector2<f64>,
    obstacles: &[Obstacle],
    danger_margin_m: f64,
    detour_gain: f64
) -> f64 {
    let attraction = normalize_eps(&pose.vector_to(target_m));

    let mut repulsion = Vector2::zeros();
    let mut detour = Vector2::zeros();
    let mut num_in_range = 0usize;

    for obs in obstacles {
        if let Some(r) = obs.repulsion(&pose.position_m, danger_margin_m) {
            repulsion += r;
            detour += obs.detour(&pose.position_m, &attraction);
            num_in_range += 1;
        }
    }

    if num_in_range == 0 {
        return pose.bearing_to(target_m)
    }

    let total = normalize_eps(&(attraction + repulsion + detour_gain * detour));

    trace!(
        "{} obstacle(s) in range, repulsion: [{:.4}, {:.4}], detour: [{:.4}, {:.4}]",
        num_in_range, repulsion[0], repulsion[1], detour[0], detour[1]
    );

    total[1].atan2(total[0])
}
