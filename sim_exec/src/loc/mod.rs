//! # Localisation module
//!
//! The simulated robot is a point on the XY plane with a heading, there is no
//! attitude beyond the rotation about Z.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading) of the robot.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {

    /// The position on the XY plane
    pub position_m: Vector2<f64>,

    /// The heading (angle to the positive X axis), in the range (-pi, pi].
    #[serde(default)]
    pub heading_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {

    /// Create a new pose, wrapping the heading into (-pi, pi].
    pub fn new(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad: wrap_angle(heading_rad)
        }
    }

    /// Unit vector pointing along the heading.
    pub fn forward2(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Vector from this pose's position to the given point.
    pub fn vector_to(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        point_m - self.position_m
    }

    /// Bearing (angle to the positive X axis) from this pose to the given point.
    pub fn bearing_to(&self, point_m: &Vector2<f64>) -> f64 {
        let to_point = self.vector_to(point_m);
        to_point[1].atan2(to_point[0])
    }

    /// Distance from this pose to the given point.
    pub fn distance_to(&self, point_m: &Vector2<f64>) -> f64 {
        self.vector_to(point_m).norm()
    }
}
