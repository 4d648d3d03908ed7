use direct_fire::{
    find_launch_angle, hit_test, line_of_sight_angle, sample_trajectory, solve_launch_angle,
    AngleSearchConfig, AngleSearchResult, HitTestConfig, LaunchParameters, PhysicsConstants,
    SolveRequest, Target, TrajectoryRequest,
};

fn solve(target_x: f64, target_y: f64) -> AngleSearchResult {
    solve_launch_angle(&SolveRequest::new(840.0, 1.5, target_x, target_y)).expect("valid request")
}

#[test]
fn solved_angles_are_confirmed_hits() {
    let launch = LaunchParameters::new(840.0, 1.5);
    for &(x, y) in &[(100.0, 1.5), (400.0, 1.5), (700.0, 3.0)] {
        let target = Target::new(x, y);
        let angle = solve(x, y).angle().expect("target should be reachable");
        let report = hit_test(&launch, &target, angle, &HitTestConfig::default()).unwrap();
        assert!(report.outcome.is_hit(), "angle {angle} for ({x}, {y}) did not re-hit");
    }
}

#[test]
fn solved_angle_does_not_decrease_with_range() {
    let angles: Vec<f64> = [100.0, 300.0, 500.0, 700.0, 1000.0]
        .iter()
        .map(|&x| solve(x, 1.5).angle().expect("target should be reachable"))
        .collect();

    for pair in angles.windows(2) {
        assert!(pair[1] >= pair[0], "angles not monotonic: {angles:?}");
    }
}

#[test]
fn reference_scenario_is_flat_fire() {
    let angle = solve(700.0, 1.5).angle().expect("700 m should be reachable");
    assert!((angle - 0.45).abs() < 0.02, "angle {angle}");
    assert!(angle > 0.0 && angle < 5.0);
}

#[test]
fn target_on_line_of_sight_solves_near_estimate() {
    let target = Target::new(100.0, 1.65);
    let estimate = line_of_sight_angle(&target, 1.5, 0.15);
    let angle = solve(target.x, target.y).angle().expect("target should be reachable");

    assert!(estimate.abs() < 1e-9);
    assert!(angle >= estimate && angle - estimate < 0.25, "angle {angle}");
}

#[test]
fn unreachable_target_is_not_found() {
    let report = find_launch_angle(
        &LaunchParameters::new(840.0, 1.5),
        &Target::new(100_000.0, 1.5),
        &AngleSearchConfig::default(),
    )
    .expect("search should finish");

    assert_eq!(report.result, AngleSearchResult::NotFound);
    assert_eq!(report.candidates_tried, 500);
}

#[test]
fn drag_free_range_matches_closed_form() {
    let request = TrajectoryRequest {
        constants: PhysicsConstants::drag_free(),
        ..TrajectoryRequest::new(100.0, 45.0, 0.0)
    };
    let samples = sample_trajectory(&request).unwrap();
    let range = samples.last().unwrap().x;

    let analytic = 100.0_f64.powi(2) / 9.81;
    assert!((range - analytic).abs() < 0.5, "range {range} vs {analytic}");
}

#[test]
fn drag_shortens_range() {
    let with_drag = sample_trajectory(&TrajectoryRequest::new(100.0, 45.0, 0.0)).unwrap();
    let range = with_drag.last().unwrap().x;
    assert!(range < 700.0 && range > 500.0, "range {range}");
}
