//! # Trajectory simulation module
//!
//! Trajectory simulation steps a point robot from its initial pose towards a
//! fixed target, recording the pose and error at every step. How each step's
//! motion is chosen is set by the control mode:
//!
//! - Open loop: a single action is planned at the start and repeated every
//!   step, whatever happens to the robot.
//! - Proportional / constant speed: the position error is read every step and
//!   the robot translates along it.
//! - Pure pursuit: the robot has a heading which is turned towards the
//!   bearing of the target by a fraction of the angular error, then the robot
//!   drives forward at constant speed.
//! - Potential field: as pure pursuit, but the desired direction is the sum of
//!   an attraction towards the target and an inverse square repulsion from
//!   every obstacle whose danger zone the robot is inside. The run stops early
//!   once the robot is within the stopping tolerance of the target.
//!
//! After the mode has chosen the motion the optional actuator noise is
//! applied, followed by the constant drift (wind) vector.
//!
//! Every run is a pure function of its parameters: randomness only comes from
//! a `NoiseGenerator` seeded from the parameters (or injected explicitly), so
//! two runs with the same parameters produce bit-identical trajectories.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod noise;
pub mod obstacle;
pub mod params;
pub mod state;
pub mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use noise::*;
pub use obstacle::Obstacle;
pub use params::*;
pub use state::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Added to the denominator of every vector normalisation.
///
/// A zero length vector therefore normalises to a finite (zero or arbitrary
/// direction) vector rather than dividing by zero.
pub const EPSILON: f64 = 1e-6;
