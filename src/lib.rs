//! # Direct Fire
//!
//! Launch angle solver for direct-fire ballistics: integrates a point-mass
//! trajectory under gravity and quadratic drag, and scans elevations upward
//! from the line of sight until the trajectory strikes the target.

// Re-export the main types and functions
pub use angle_calculations::{
    find_launch_angle, line_of_sight_angle, AngleSearchConfig, AngleSearchReport, AngleSearchResult,
    SearchBudget,
};
pub use cli_api::{
    build_firing_table, degrees_to_mils, sample_trajectory, solve_launch_angle, solve_with_report,
    trajectory_iter, BallisticsError, FiringTableRow, SolveReport, SolveRequest, TrajectoryRequest,
};
pub use trajectory_solver::{
    hit_test, HitOutcome, HitPhase, HitTestConfig, HitTestReport, HitTolerance, LaunchParameters,
    PhysicsConstants, SimulationState, Target, Trajectory, TrajectorySample,
};

// Module declarations
pub mod angle_calculations;
pub mod cli_api;
pub mod constants;
pub mod trajectory_solver;
