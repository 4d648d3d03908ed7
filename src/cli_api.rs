// CLI API module - request/response boundary used by the command-line tool
use crate::angle_calculations::{find_launch_angle, AngleSearchConfig, AngleSearchResult};
use crate::constants::{
    DEFAULT_LAUNCH_HEIGHT_M, DEFAULT_MUZZLE_VELOCITY_MPS, MAX_FLIGHT_TIME_S, MILS_PER_DEGREE,
    TRAJECTORY_TIME_STEP_S,
};
use crate::trajectory_solver::{LaunchParameters, PhysicsConstants, Target, Trajectory, TrajectorySample};
use serde::Serialize;
use std::error::Error;
use std::fmt;

// Error type for solver operations
#[derive(Debug, Clone, PartialEq)]
pub enum BallisticsError {
    /// Out-of-domain or non-finite input
    InvalidInput { field: &'static str, reason: String },
    /// The scan finished without a confirmed hit
    NoSolutionFound { target_x: f64, target_y: f64 },
    /// The search budget ran out before the scan finished
    BudgetExhausted { candidates_tried: usize, steps: u64 },
    /// Trajectory sampling hit its flight-time limit before ground impact
    FlightTimeExceeded { max_flight_time: f64, last_x: f64, last_y: f64 },
}

impl BallisticsError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        BallisticsError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BallisticsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BallisticsError::InvalidInput { field, reason } => {
                write!(f, "invalid {field}: {reason}")
            }
            BallisticsError::NoSolutionFound { target_x, target_y } => write!(
                f,
                "no suitable launch angle found for target at {target_x} m, {target_y} m"
            ),
            BallisticsError::BudgetExhausted {
                candidates_tried,
                steps,
            } => write!(
                f,
                "search budget exhausted after {candidates_tried} candidate angles ({steps} integration steps)"
            ),
            BallisticsError::FlightTimeExceeded {
                max_flight_time,
                last_x,
                last_y,
            } => write!(
                f,
                "projectile still airborne after {max_flight_time} s (x = {last_x:.1} m, y = {last_y:.1} m)"
            ),
        }
    }
}

impl Error for BallisticsError {}

// Launch angle request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveRequest {
    pub launch: LaunchParameters,
    pub target: Target,
    pub search: AngleSearchConfig,
}

impl SolveRequest {
    pub fn new(initial_velocity: f64, launch_height: f64, target_x: f64, target_y: f64) -> Self {
        Self {
            launch: LaunchParameters::new(initial_velocity, launch_height),
            target: Target::new(target_x, target_y),
            search: AngleSearchConfig::default(),
        }
    }
}

// Solve result as printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub target_x: f64,
    pub target_y: f64,
    pub line_of_sight_deg: f64,
    pub angle_deg: Option<f64>,
    pub angle_mils: Option<f64>,
    pub candidates_tried: usize,
    pub integration_steps: u64,
}

impl SolveReport {
    pub fn result(&self) -> AngleSearchResult {
        match self.angle_deg {
            Some(angle) => AngleSearchResult::Solved(angle),
            None => AngleSearchResult::NotFound,
        }
    }
}

// Trajectory sample request (for plotting)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRequest {
    pub launch: LaunchParameters,
    pub angle_degrees: f64,
    pub constants: PhysicsConstants,
    pub time_step: f64,
    pub max_flight_time: f64,
}

impl TrajectoryRequest {
    pub fn new(initial_velocity: f64, angle_degrees: f64, launch_height: f64) -> Self {
        Self {
            launch: LaunchParameters::new(initial_velocity, launch_height),
            angle_degrees,
            constants: PhysicsConstants::default(),
            time_step: TRAJECTORY_TIME_STEP_S,
            max_flight_time: MAX_FLIGHT_TIME_S,
        }
    }
}

impl Default for TrajectoryRequest {
    fn default() -> Self {
        Self::new(DEFAULT_MUZZLE_VELOCITY_MPS, 0.0, DEFAULT_LAUNCH_HEIGHT_M)
    }
}

// One line of a firing table
#[derive(Debug, Clone, Serialize)]
pub struct FiringTableRow {
    pub target_x: f64,
    pub target_y: f64,
    pub angle_deg: Option<f64>,
    pub angle_mils: Option<f64>,
}

pub fn degrees_to_mils(degrees: f64) -> f64 {
    degrees * MILS_PER_DEGREE
}

/// Solve for the launch angle; `NotFound` is a normal result, not an error.
pub fn solve_launch_angle(request: &SolveRequest) -> Result<AngleSearchResult, BallisticsError> {
    Ok(solve_with_report(request)?.result())
}

pub fn solve_with_report(request: &SolveRequest) -> Result<SolveReport, BallisticsError> {
    let report = find_launch_angle(&request.launch, &request.target, &request.search)?;
    let angle_deg = report.result.angle();

    Ok(SolveReport {
        target_x: request.target.x,
        target_y: request.target.y,
        line_of_sight_deg: report.line_of_sight_deg,
        angle_deg,
        angle_mils: angle_deg.map(degrees_to_mils),
        candidates_tried: report.candidates_tried,
        integration_steps: report.total_steps,
    })
}

/// Lazy ground-to-ground trajectory for the request
pub fn trajectory_iter(request: &TrajectoryRequest) -> Result<Trajectory, BallisticsError> {
    let mut trajectory = Trajectory::new(
        &request.launch,
        request.angle_degrees,
        request.constants,
        request.time_step,
    )?;
    trajectory.set_max_flight_time(request.max_flight_time)?;
    Ok(trajectory)
}

/// Every sample from launch to ground impact.
///
/// A flight still airborne at `max_flight_time` is an error rather than a
/// shortened trajectory.
pub fn sample_trajectory(request: &TrajectoryRequest) -> Result<Vec<TrajectorySample>, BallisticsError> {
    let mut trajectory = trajectory_iter(request)?;
    let samples: Vec<TrajectorySample> = trajectory.by_ref().collect();

    if trajectory.is_truncated() {
        let last = trajectory.state();
        return Err(BallisticsError::FlightTimeExceeded {
            max_flight_time: request.max_flight_time,
            last_x: last.x(),
            last_y: last.y(),
        });
    }
    Ok(samples)
}

/// Solve a series of ranges at a common target height.
///
/// Unreachable ranges produce rows without an angle; invalid input or an
/// exhausted budget aborts the whole table.
pub fn build_firing_table(
    launch: &LaunchParameters,
    ranges: &[f64],
    target_y: f64,
    search: &AngleSearchConfig,
) -> Result<Vec<FiringTableRow>, BallisticsError> {
    if ranges.is_empty() {
        return Err(BallisticsError::invalid("ranges", "at least one range is required"));
    }

    ranges
        .iter()
        .map(|&range| {
            let request = SolveRequest {
                launch: *launch,
                target: Target::new(range, target_y),
                search: *search,
            };
            let report = solve_with_report(&request)?;
            Ok(FiringTableRow {
                target_x: range,
                target_y,
                angle_deg: report.angle_deg,
                angle_mils: report.angle_mils,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory_solver::{hit_test, HitTestConfig};

    #[test]
    fn test_solve_round_trip_is_a_hit() {
        let request = SolveRequest::new(840.0, 1.5, 500.0, 1.5);
        let angle = solve_launch_angle(&request)
            .unwrap()
            .into_result(&request.target)
            .unwrap();

        let report = hit_test(&request.launch, &request.target, angle, &HitTestConfig::default()).unwrap();
        assert!(report.outcome.is_hit());
    }

    #[test]
    fn test_solve_report_includes_mils() {
        let report = solve_with_report(&SolveRequest::new(840.0, 1.5, 300.0, 1.5)).unwrap();

        let degrees = report.angle_deg.unwrap();
        let mils = report.angle_mils.unwrap();
        assert!((mils - degrees * 6400.0 / 360.0).abs() < 1e-9);
        assert!(report.line_of_sight_deg < 0.0);
    }

    #[test]
    fn test_solve_rejects_invalid_velocity() {
        let err = solve_launch_angle(&SolveRequest::new(-840.0, 1.5, 700.0, 1.5)).unwrap_err();
        assert!(matches!(err, BallisticsError::InvalidInput { field: "initial_velocity", .. }));
        assert!(err.to_string().contains("initial_velocity"));
    }

    #[test]
    fn test_sample_trajectory_defaults() {
        let request = TrajectoryRequest::new(840.0, 0.45, 1.5);
        let samples = sample_trajectory(&request).unwrap();

        assert_eq!(samples[0].y, 1.5);
        assert!(samples.last().unwrap().y < 0.0);
        // 1 ms sampling
        assert!((samples[1].time - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn test_drag_free_long_flight_reports_flight_time_exceeded() {
        let request = TrajectoryRequest {
            constants: PhysicsConstants::drag_free(),
            ..TrajectoryRequest::new(840.0, 45.0, 1.5)
        };

        match sample_trajectory(&request).unwrap_err() {
            BallisticsError::FlightTimeExceeded {
                max_flight_time,
                last_y,
                ..
            } => {
                assert_eq!(max_flight_time, 100.0);
                assert!(last_y > 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_longer_flight_time_reaches_ground() {
        let request = TrajectoryRequest {
            constants: PhysicsConstants::drag_free(),
            max_flight_time: 200.0,
            ..TrajectoryRequest::new(840.0, 45.0, 1.5)
        };
        let samples = sample_trajectory(&request).unwrap();

        assert!(samples.last().unwrap().y < 0.0);
    }

    #[test]
    fn test_trajectory_request_rejects_bad_flight_time() {
        let request = TrajectoryRequest {
            max_flight_time: 0.0,
            ..TrajectoryRequest::default()
        };
        assert!(matches!(
            trajectory_iter(&request),
            Err(BallisticsError::InvalidInput { field: "max_flight_time", .. })
        ));
    }

    #[test]
    fn test_firing_table_rows() {
        let launch = LaunchParameters::new(840.0, 1.5);
        let search = AngleSearchConfig {
            window: 1.0,
            ..AngleSearchConfig::default()
        };
        let rows = build_firing_table(&launch, &[100.0, 300.0, 5000.0], 1.5, &search).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].angle_deg.is_some());
        assert!(rows[1].angle_deg.is_some());
        assert!(rows[2].angle_deg.is_none());
        assert!(rows[2].angle_mils.is_none());
        assert!(rows[0].angle_deg.unwrap() <= rows[1].angle_deg.unwrap());
    }

    #[test]
    fn test_firing_table_requires_ranges() {
        let launch = LaunchParameters::new(840.0, 1.5);
        assert!(build_firing_table(&launch, &[], 1.5, &AngleSearchConfig::default()).is_err());
    }
}
