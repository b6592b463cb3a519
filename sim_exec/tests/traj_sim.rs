//! # Trajectory simulation tests
//!
//! Whole-run properties of the simulation engine.

use nalgebra::Vector2;
use sim_lib::{
    loc::Pose,
    traj_sim::{
        simulate, simulate_with_noise, ControlMode, ErrorMetric, NoiseGenerator, NoiseKind,
        NoiseParams, Obstacle, OpenLoopPlan, SimParams, TrajSim, TrajSimError,
    },
};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// HELPERS
// ------------------------------------------------------------------------------------------------

/// Obstacle course from the heading demonstrations. The first obstacle sits on the straight line
/// from the start to the target.
fn obstacle_course() -> Vec<Obstacle> {
    vec![
        Obstacle::new(Vector2::new(5.0, 5.0), 1.5),
        Obstacle::new(Vector2::new(7.0, 8.0), 1.0),
    ]
}

fn heading_params(mode: ControlMode, obstacles: Vec<Obstacle>) -> SimParams {
    SimParams {
        initial_pose: Pose::new(Vector2::zeros(), 0.0),
        target_m: Vector2::new(10.0, 10.0),
        obstacles,
        num_steps: 100,
        mode,
        speed_ms: 0.5,
        drift_m: Vector2::new(0.05, -0.02),
        noise: None,
        error_metric: ErrorMetric::Distance,
    }
}

fn line_params(mode: ControlMode, num_steps: usize) -> SimParams {
    SimParams {
        initial_pose: Pose::new(Vector2::zeros(), 0.0),
        target_m: Vector2::new(10.0, 0.0),
        obstacles: vec![],
        num_steps,
        mode,
        speed_ms: 0.5,
        drift_m: Vector2::zeros(),
        noise: None,
        error_metric: ErrorMetric::SignedX,
    }
}

fn potential_field(stop_tolerance_m: f64) -> ControlMode {
    ControlMode::PotentialField {
        heading_gain: 0.15,
        danger_margin_m: 1.5,
        stop_tolerance_m,
        detour_gain: 1.0,
    }
}

/// A potential field with a danger zone wide enough to turn away from an obstacle dead ahead.
fn wide_potential_field(detour_gain: f64) -> ControlMode {
    ControlMode::PotentialField {
        heading_gain: 0.3,
        danger_margin_m: 2.5,
        stop_tolerance_m: 0.1,
        detour_gain,
    }
}

fn weak_motor() -> NoiseParams {
    NoiseParams {
        kind: NoiseKind::Multiplicative,
        mean: 0.9,
        std_dev: 0.05,
        seed: 42,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[test]
fn test_deterministic() {
    let mut open = line_params(
        ControlMode::OpenLoop {
            plan: OpenLoopPlan::Constant {
                delta_m: Vector2::new(0.5, 0.0),
            },
        },
        40,
    );
    open.noise = Some(weak_motor());

    assert_eq!(simulate(&open).unwrap(), simulate(&open).unwrap());

    let mut field = heading_params(potential_field(0.1), obstacle_course());
    field.noise = Some(NoiseParams {
        kind: NoiseKind::Additive,
        mean: 0.0,
        std_dev: 0.05,
        seed: 7,
    });

    assert_eq!(simulate(&field).unwrap(), simulate(&field).unwrap());

    // Changing the seed changes the run
    let mut reseeded = field.clone();
    reseeded.noise = reseeded.noise.map(|n| NoiseParams { seed: 8, ..n });
    assert_ne!(simulate(&field).unwrap(), simulate(&reseeded).unwrap());
}

#[test]
fn test_injected_noise_matches_seeded() {
    let mut params = line_params(
        ControlMode::OpenLoop {
            plan: OpenLoopPlan::Constant {
                delta_m: Vector2::new(0.5, 0.0),
            },
        },
        40,
    );
    params.noise = Some(weak_motor());

    let injected = simulate_with_noise(&params, NoiseGenerator::new(&weak_motor()).unwrap());
    assert_eq!(injected.unwrap(), simulate(&params).unwrap());
}

#[test]
fn test_length_without_early_stop() {
    for mode in vec![
        ControlMode::OpenLoop {
            plan: OpenLoopPlan::TowardTarget,
        },
        ControlMode::Proportional { gain: 0.3 },
        ControlMode::ConstantSpeed,
        ControlMode::PurePursuit { heading_gain: 0.1 },
    ] {
        let traj = simulate(&heading_params(mode.clone(), obstacle_course())).unwrap();
        assert_eq!(traj.len(), 101, "wrong length for {:?}", mode);
        assert!(!traj.terminated_early());

        // The time axis is the index
        for (i, s) in traj.samples().iter().enumerate() {
            assert_eq!(s.step, i);
        }
    }
}

#[test]
fn test_zero_steps() {
    let traj = simulate(&line_params(ControlMode::Proportional { gain: 0.3 }, 0)).unwrap();

    assert_eq!(traj.len(), 1);
    assert_eq!(traj.samples()[0].position_m, Vector2::zeros());
    assert_eq!(traj.samples()[0].error, 10.0);
}

#[test]
fn test_early_termination() {
    let params = line_params(potential_field(0.3), 100);
    let traj = simulate(&params).unwrap();

    // 0.5 m per step along the X axis reaches the target exactly after 20 steps
    assert!(traj.terminated_early());
    assert_eq!(traj.len(), 21);
    assert!(traj.len() <= params.num_steps + 1);

    let last = traj.last().unwrap();
    assert!((params.target_m - last.position_m).norm() < 0.3);
}

#[test]
fn test_potential_field_length_bound() {
    let params = heading_params(potential_field(0.1), obstacle_course());
    let traj = simulate(&params).unwrap();

    assert!(traj.len() >= 1 && traj.len() <= params.num_steps + 1);
    if traj.terminated_early() {
        let last = traj.last().unwrap();
        assert!((params.target_m - last.position_m).norm() < 0.1);
    }
    else {
        assert_eq!(traj.len(), params.num_steps + 1);
    }
}

#[test]
fn test_open_loop_ignores_obstacles_and_error() {
    let mode = ControlMode::OpenLoop {
        plan: OpenLoopPlan::TowardTarget,
    };
    let with_obstacles = simulate(&heading_params(mode.clone(), obstacle_course())).unwrap();
    let without = simulate(&heading_params(mode, vec![])).unwrap();

    assert_eq!(with_obstacles, without);

    // The step never changes even once the target has been overshot
    let steps: Vec<Vector2<f64>> = without
        .samples()
        .windows(2)
        .map(|w| w[1].position_m - w[0].position_m)
        .collect();
    for s in &steps {
        assert!((s - steps[0]).norm() < 1e-12);
    }
    assert!(without.final_error().unwrap() > 30.0);
}

#[test]
fn test_open_loop_drifts_with_weak_motor() {
    let mut params = line_params(
        ControlMode::OpenLoop {
            plan: OpenLoopPlan::Constant {
                delta_m: Vector2::new(0.5, 0.0),
            },
        },
        20,
    );

    // A perfect plan lands on the target
    let perfect = simulate(&params).unwrap();
    assert_eq!(perfect.final_error(), Some(0.0));

    // A weak, noisy motor falls short and never corrects
    params.noise = Some(weak_motor());
    let noisy = simulate(&params).unwrap();
    let final_error = noisy.final_error().unwrap();
    assert!(final_error > 0.3 && final_error < 2.0);
}

#[test]
fn test_proportional_convergence() {
    let traj = simulate(&line_params(ControlMode::Proportional { gain: 0.3 }, 40)).unwrap();

    assert_eq!(traj.len(), 41);
    assert!(traj.is_error_non_increasing());
    assert!(traj.final_error().unwrap().abs() < 0.5);
    assert!(traj.samples().iter().all(|s| s.heading_rad.is_none()));
}

#[test]
fn test_constant_speed_converges_to_step_size() {
    let params = SimParams {
        target_m: Vector2::new(2.0, 10.0),
        speed_ms: 0.3,
        error_metric: ErrorMetric::Distance,
        ..line_params(ControlMode::ConstantSpeed, 50)
    };
    let traj = simulate(&params).unwrap();

    // Reaches the target within 34 steps then chatters within one step of it
    assert!(traj.samples()[34..].iter().all(|s| s.error < 0.31));
}

#[test]
fn test_pure_pursuit_turns_short_way() {
    // Heading just below pi, target just clockwise of -pi: the short turn is through pi
    let params = SimParams {
        initial_pose: Pose::new(Vector2::zeros(), 3.0),
        target_m: Vector2::new(-10.0, -10.0 * 0.1425),
        drift_m: Vector2::zeros(),
        ..heading_params(ControlMode::PurePursuit { heading_gain: 0.5 }, vec![])
    };
    let traj = simulate(&params).unwrap();

    let h1 = traj.samples()[1].heading_rad.unwrap();
    assert!(h1.abs() > 3.0, "turned the long way, heading {}", h1);
    assert!(h1.abs() <= std::f64::consts::PI);
}

#[test]
fn test_obstacle_on_path_is_avoided() {
    let course = obstacle_course();

    let pursuit = simulate(&heading_params(
        ControlMode::PurePursuit { heading_gain: 0.15 },
        course.clone(),
    ))
    .unwrap();
    let field = simulate(&heading_params(potential_field(0.1), course.clone())).unwrap();

    for obs in &course {
        let clearance = field.min_clearance_m(obs).unwrap();
        assert!(
            clearance >= obs.radius_m,
            "collided with obstacle at {:?} ({} m)",
            obs.centre_m,
            clearance
        );
    }

    // The repulsion pushed the robot further away than pursuit alone
    assert!(field.min_clearance_m(&course[0]) > pursuit.min_clearance_m(&course[0]));
    assert_ne!(field, pursuit);
}

#[test]
fn test_obstacle_on_path_is_avoided_without_wind() {
    let course = vec![Obstacle::new(Vector2::new(5.0, 5.0), 1.5)];
    let params = SimParams {
        drift_m: Vector2::zeros(),
        ..heading_params(potential_field(0.1), course.clone())
    };

    let traj = simulate(&params).unwrap();
    assert!(traj.min_clearance_m(&course[0]).unwrap() >= 1.5);
}

#[test]
fn test_obstacle_dead_ahead_on_line_is_avoided() {
    let obs = Obstacle::new(Vector2::new(5.0, 0.0), 1.5);
    let params = SimParams {
        obstacles: vec![obs],
        error_metric: ErrorMetric::Distance,
        ..line_params(wide_potential_field(1.0), 100)
    };

    let traj = simulate(&params).unwrap();
    let clearance = traj.min_clearance_m(&obs).unwrap();
    assert!(clearance >= obs.radius_m, "collided ({} m)", clearance);

    // The tie is broken to the left of the direction of travel
    let closest = traj
        .samples()
        .iter()
        .find(|s| obs.centre_dist_m(&s.position_m) == clearance)
        .unwrap();
    assert!(closest.position_m[1] > 0.0);

    // A smaller obstacle on the same line
    let small = Obstacle::new(Vector2::new(5.0, 0.0), 1.0);
    let traj = simulate(&SimParams {
        obstacles: vec![small],
        ..params.clone()
    })
    .unwrap();
    assert!(traj.min_clearance_m(&small).unwrap() >= small.radius_m);

    // Radial repulsion alone drives straight into it
    let traj = simulate(&SimParams {
        mode: wide_potential_field(0.0),
        ..params
    })
    .unwrap();
    assert!(traj.min_clearance_m(&obs).unwrap() < obs.radius_m);
}

#[test]
fn test_obstacle_dead_ahead_on_diagonal_is_avoided() {
    let obs = Obstacle::new(Vector2::new(5.0, 5.0), 1.5);
    let params = SimParams {
        initial_pose: Pose::new(Vector2::zeros(), FRAC_PI_4),
        drift_m: Vector2::zeros(),
        ..heading_params(wide_potential_field(1.0), vec![obs])
    };

    let traj = simulate(&params).unwrap();
    let clearance = traj.min_clearance_m(&obs).unwrap();
    assert!(clearance >= obs.radius_m, "collided ({} m)", clearance);
}

#[test]
fn test_zero_obstacles_is_pure_pursuit() {
    let pursuit = simulate(&heading_params(
        ControlMode::PurePursuit { heading_gain: 0.15 },
        vec![],
    ))
    .unwrap();
    let field = simulate(&heading_params(potential_field(0.0), vec![])).unwrap();

    assert_eq!(pursuit.samples(), field.samples());

    // Obstacles which are never in range make no difference either
    let far = vec![Obstacle::new(Vector2::new(-50.0, 50.0), 1.0)];
    let field_far = simulate(&heading_params(potential_field(0.0), far)).unwrap();
    assert_eq!(pursuit.samples(), field_far.samples());
}

#[test]
fn test_stepwise_proc() {
    let params = line_params(ControlMode::PurePursuit { heading_gain: 0.1 }, 3);
    let mut sim = TrajSim::init(params).unwrap();

    let mut steps = vec![];
    while !sim.is_finished() {
        let (sample, report) = sim.proc(&()).unwrap();
        assert_eq!(sample.step, report.step);
        assert_eq!(sim.pose().position_m, sample.position_m);
        assert_eq!(Some(sim.pose().heading_rad), sample.heading_rad);
        steps.push(sample.step);
    }

    assert_eq!(steps, vec![1, 2, 3]);
    assert_eq!(sim.trajectory().len(), 4);
    assert!(matches!(sim.proc(&()), Err(TrajSimError::RunFinished)));
}

#[test]
fn test_invalid_config_fails_before_running() {
    let mut params = heading_params(potential_field(0.1), obstacle_course());
    params.obstacles[1].radius_m = -1.0;
    assert!(matches!(
        simulate(&params),
        Err(TrajSimError::InvalidObstacle { index: 1, .. })
    ));

    let params = SimParams {
        target_m: Vector2::zeros(),
        ..heading_params(ControlMode::PurePursuit { heading_gain: 0.1 }, vec![])
    };
    assert!(matches!(
        simulate(&params),
        Err(TrajSimError::DegenerateDirection(_))
    ));
}

#[test]
fn test_heading_samples() {
    let params = SimParams {
        initial_pose: Pose::new(Vector2::zeros(), FRAC_PI_2),
        ..heading_params(ControlMode::PurePursuit { heading_gain: 0.1 }, vec![])
    };
    let traj = simulate(&params).unwrap();

    let h0 = traj.samples()[0].heading_rad.unwrap();
    assert!((h0 - FRAC_PI_2).abs() < 1e-12);
    assert!(traj
        .samples()
        .iter()
        .all(|s| s.heading_rad.map_or(false, |h| h.abs() <= std::f64::consts::PI)));
}
