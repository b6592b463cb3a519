//! # Trajectory
//!
//! The ordered, append-only record of a simulation run. The index of a sample
//! is its step number.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::Obstacle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of the robot after a step.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrajectorySample {
    /// Step number, 0 is the initial pose
    pub step: usize,

    /// Position of the robot
    pub position_m: Vector2<f64>,

    /// Heading of the robot, only for modes which steer a heading.
    pub heading_rad: Option<f64>,

    /// The error according to the run's `ErrorMetric`
    pub error: f64
}

/// Flat form of a sample, suitable for a CSV archive.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleRecord {
    pub step: usize,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: Option<f64>,
    pub error: f64
}

/// The full record of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,

    /// True if the run ended before the step limit because the target was
    /// reached.
    terminated_early: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Create an empty trajectory.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            terminated_early: false
        }
    }

    pub(crate) fn push(&mut self, sample: TrajectorySample) {
        self.samples.push(sample);
    }

    pub(crate) fn set_terminated_early(&mut self) {
        self.terminated_early = true;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn terminated_early(&self) -> bool {
        self.terminated_early
    }

    /// Iterator over the sample positions.
    pub fn positions(&self) -> impl Iterator<Item = &Vector2<f64>> + '_ {
        self.samples.iter().map(|s| &s.position_m)
    }

    /// Error of the last sample.
    pub fn final_error(&self) -> Option<f64> {
        self.last().map(|s| s.error)
    }

    /// Smallest distance between any sample and the obstacle's centre.
    pub fn min_clearance_m(&self, obstacle: &Obstacle) -> Option<f64> {
        self.positions()
            .map(|p| obstacle.centre_dist_m(p))
            .fold(None, |min, d| match min {
                Some(m) if m <= d => Some(m),
                _ => Some(d)
            })
    }

    /// True if the error magnitude never increases from one step to the next.
    pub fn is_error_non_increasing(&self) -> bool {
        self.samples
            .windows(2)
            .all(|w| w[1].error.abs() <= w[0].error.abs())
    }

    /// Flat records for archiving.
    pub fn records(&self) -> impl Iterator<Item = SampleRecord> + '_ {
        self.samples.iter().map(|s| SampleRecord {
            step: s.step,
            x_m: s.position_m[0],
            y_m: s.position_m[1],
            heading_rad: s.heading_rad,
            error: s.error
        })
    }
}
