//! # Simulation library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the simulation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation types - the pose of the simulated robot
pub mod loc;

/// Trajectory simulation - steps a robot towards its target under a chosen control mode
pub mod traj_sim;

/// Scenarios - sets of simulation runs loaded from parameter files and archived for rendering
pub mod scenario;
