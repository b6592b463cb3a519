//! Circular obstacles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::EPSILON;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A circular obstacle on the XY plane.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obstacle {
    /// Centre of the obstacle
    pub centre_m: Vector2<f64>,

    /// Radius of the obstacle, must be finite and non-negative.
    pub radius_m: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Obstacle {
    pub fn new(centre_m: Vector2<f64>, radius_m: f64) -> Self {
        Self { centre_m, radius_m }
    }

    /// Distance between the given point and the centre of the obstacle.
    pub fn centre_dist_m(&self, point_m: &Vector2<f64>) -> f64 {
        (point_m - self.centre_m).norm()
    }

    /// Get the repulsion exerted on a robot at `position_m`.
    ///
    /// Returns `None` if the robot is outside the danger zone, which extends
    /// `danger_margin_m` beyond the radius. Inside the zone the repulsion
    /// points away from the centre with a magnitude of `1/d` (the offset
    /// divided by `d^2 + EPSILON`).
    pub fn repulsion(
        &self,
        position_m: &Vector2<f64>,
        danger_margin_m: f64
    ) -> Option<Vector2<f64>> {
        let offset = position_m - self.centre_m;
        let dist_m = offset.norm();

        if dist_m < self.radius_m + danger_margin_m {
            Some(offset / (dist_m.powi(2) + EPSILON))
        }
        else {
            None
        }
    }

    /// Get the detour direction for a robot at `position_m` travelling along
    /// the unit vector `attraction`.
    ///
    /// The detour is tangent to the obstacle, on the side which keeps making
    /// progress along `attraction`, and is weighted by how directly the
    /// obstacle blocks the way (1 dead ahead, 0 abeam). An obstacle abeam or
    /// behind gives a zero vector. If the obstacle is exactly dead ahead the
    /// detour goes to the left of `attraction`.
    pub fn detour(
        &self,
        position_m: &Vector2<f64>,
        attraction: &Vector2<f64>
    ) -> Vector2<f64> {
        let offset = position_m - self.centre_m;
        let away = offset / (offset.norm() + EPSILON);

        let blocking = -attraction.dot(&away);
        if blocking <= 0.0 {
            return Vector2::zeros()
        }

        let mut tangent = Vector2::new(-away[1], away[0]);
        let left = Vector2::new(-attraction[1], attraction[0]);
        let progress = tangent.dot(attraction);

        if progress < 0.0 || (progress == 0.0 && tangent.dot(&left) < 0.0) {
            tangent = -tangent;
        }

        blocking * tangent
    }
}
