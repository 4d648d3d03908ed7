//! Point-mass trajectory integration under gravity and quadratic drag.
//!
//! Two stopping policies are provided: [`Trajectory`] runs until the
//! projectile goes below ground and yields every step, while [`hit_test`]
//! runs towards a target and reports whether the projectile passes through
//! the target box.

use crate::cli_api::BallisticsError;
use crate::constants::{
    COARSE_X_TOLERANCE_M, DRAG_COEFFICIENT, G_ACCEL_MPS2, HIT_TEST_TIME_STEP_S,
    MAX_FLIGHT_TIME_S, MAX_HIT_TEST_ITERATIONS, REFINED_TIME_STEP_S, REFINED_X_TOLERANCE_M,
    TRAJECTORY_TIME_STEP_S, Y_TOLERANCE_M,
};
use nalgebra::Vector2;
use serde::Serialize;
use std::iter::FusedIterator;

/// Gravity and drag used by the integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConstants {
    pub gravity: f64,          // m/s²
    pub drag_coefficient: f64, // 1/m
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            gravity: G_ACCEL_MPS2,
            drag_coefficient: DRAG_COEFFICIENT,
        }
    }
}

impl PhysicsConstants {
    /// Vacuum trajectory with standard gravity
    pub fn drag_free() -> Self {
        Self {
            drag_coefficient: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), BallisticsError> {
        require_finite("gravity", self.gravity)?;
        require_finite("drag_coefficient", self.drag_coefficient)?;
        if self.gravity < 0.0 {
            return Err(BallisticsError::invalid("gravity", "must not be negative"));
        }
        if self.drag_coefficient < 0.0 {
            return Err(BallisticsError::invalid(
                "drag_coefficient",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// Fixed launch conditions shared by every candidate angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParameters {
    pub initial_velocity: f64, // m/s
    pub launch_height: f64,    // meters above ground
}

impl LaunchParameters {
    pub fn new(initial_velocity: f64, launch_height: f64) -> Self {
        Self {
            initial_velocity,
            launch_height,
        }
    }

    pub fn validate(&self) -> Result<(), BallisticsError> {
        require_finite("initial_velocity", self.initial_velocity)?;
        require_finite("launch_height", self.launch_height)?;
        if self.initial_velocity <= 0.0 {
            return Err(BallisticsError::invalid(
                "initial_velocity",
                "must be greater than zero",
            ));
        }
        if self.launch_height < 0.0 {
            return Err(BallisticsError::invalid(
                "launch_height",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// Point to be struck, relative to the foot of the launcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Target {
    pub x: f64, // horizontal distance, meters
    pub y: f64, // height above ground, meters
}

impl Target {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn validate(&self) -> Result<(), BallisticsError> {
        require_finite("target_x", self.x)?;
        require_finite("target_y", self.y)?;
        if self.x <= 0.0 {
            return Err(BallisticsError::invalid("target_x", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Position, velocity and clock of one integration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub position: Vector2<f64>, // [x, y] meters
    pub velocity: Vector2<f64>, // [vx, vy] m/s
    pub elapsed_time: f64,      // seconds
}

impl SimulationState {
    /// State at the muzzle for the given elevation
    pub fn at_launch(launch: &LaunchParameters, angle_deg: f64) -> Self {
        let angle_rad = angle_deg.to_radians();
        Self {
            position: Vector2::new(0.0, launch.launch_height),
            velocity: Vector2::new(
                launch.initial_velocity * angle_rad.cos(),
                launch.initial_velocity * angle_rad.sin(),
            ),
            elapsed_time: 0.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Advance by one semi-implicit Euler step.
    ///
    /// Velocity is updated from the current acceleration first, then position
    /// is advanced with the new velocity.
    pub fn step(&mut self, constants: &PhysicsConstants, dt: f64) {
        let speed = self.velocity.norm();
        let k = constants.drag_coefficient;
        let accel = Vector2::new(
            -k * speed * self.velocity.x,
            -constants.gravity - k * speed * self.velocity.y,
        );

        self.velocity += accel * dt;
        self.position += self.velocity * dt;
        self.elapsed_time += dt;
    }

    fn sample(&self) -> TrajectorySample {
        TrajectorySample {
            time: self.elapsed_time,
            x: self.position.x,
            y: self.position.y,
        }
    }
}

/// One row of a sampled trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
}

/// Flight from the muzzle until the projectile drops below ground.
///
/// Yields the launch point first and then the state after every step. The
/// first sample below ground is the last one. A fresh `Trajectory` is needed
/// for every angle.
///
/// The sequence also ends once the flight time limit is reached. In that case
/// [`Trajectory::is_truncated`] reports that the projectile never came down.
#[derive(Debug, Clone)]
pub struct Trajectory {
    state: SimulationState,
    constants: PhysicsConstants,
    time_step: f64,
    max_flight_time: f64,
    launched: bool,
    finished: bool,
    truncated: bool,
}

impl Trajectory {
    pub fn new(
        launch: &LaunchParameters,
        angle_deg: f64,
        constants: PhysicsConstants,
        time_step: f64,
    ) -> Result<Self, BallisticsError> {
        launch.validate()?;
        constants.validate()?;
        require_finite("angle_degrees", angle_deg)?;
        validate_time_step("time_step", time_step)?;

        Ok(Self {
            state: SimulationState::at_launch(launch, angle_deg),
            constants,
            time_step,
            max_flight_time: MAX_FLIGHT_TIME_S,
            launched: false,
            finished: false,
            truncated: false,
        })
    }

    /// Trajectory with the reference constants and sampling step
    pub fn with_defaults(launch: &LaunchParameters, angle_deg: f64) -> Result<Self, BallisticsError> {
        Self::new(
            launch,
            angle_deg,
            PhysicsConstants::default(),
            TRAJECTORY_TIME_STEP_S,
        )
    }

    pub fn set_max_flight_time(&mut self, seconds: f64) -> Result<(), BallisticsError> {
        require_finite("max_flight_time", seconds)?;
        if seconds <= 0.0 {
            return Err(BallisticsError::invalid("max_flight_time", "must be greater than zero"));
        }
        self.max_flight_time = seconds;
        Ok(())
    }

    /// True once the flight-time limit ended the sequence above ground
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }
}

impl Iterator for Trajectory {
    type Item = TrajectorySample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.launched {
            self.launched = true;
            return Some(self.state.sample());
        }
        if self.state.y() < 0.0 {
            self.finished = true;
            return None;
        }
        if self.state.elapsed_time >= self.max_flight_time {
            self.finished = true;
            self.truncated = true;
            return None;
        }

        self.state.step(&self.constants, self.time_step);
        Some(self.state.sample())
    }
}

impl FusedIterator for Trajectory {}

/// Target box tolerances for the two hit test phases
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    pub coarse_x: f64,          // meters
    pub refined_x: f64,         // meters
    pub y: f64,                 // meters
    pub refined_time_step: f64, // seconds
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            coarse_x: COARSE_X_TOLERANCE_M,
            refined_x: REFINED_X_TOLERANCE_M,
            y: Y_TOLERANCE_M,
            refined_time_step: REFINED_TIME_STEP_S,
        }
    }
}

/// Settings for one hit test run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestConfig {
    pub constants: PhysicsConstants,
    pub time_step: f64,
    pub tolerance: HitTolerance,
    pub max_iterations: u64,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            constants: PhysicsConstants::default(),
            time_step: HIT_TEST_TIME_STEP_S,
            tolerance: HitTolerance::default(),
            max_iterations: MAX_HIT_TEST_ITERATIONS,
        }
    }
}

impl HitTestConfig {
    pub fn validate(&self) -> Result<(), BallisticsError> {
        self.constants.validate()?;
        validate_time_step("time_step", self.time_step)?;
        validate_time_step("refined_time_step", self.tolerance.refined_time_step)?;
        for (field, value) in [
            ("coarse_x_tolerance", self.tolerance.coarse_x),
            ("refined_x_tolerance", self.tolerance.refined_x),
            ("y_tolerance", self.tolerance.y),
        ] {
            require_finite(field, value)?;
            if value <= 0.0 {
                return Err(BallisticsError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

/// Hit test phase. `Searching` uses the coarse step and box; after the first
/// match the run continues as `Confirming` with the refined step and box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPhase {
    Searching,
    Confirming,
}

impl HitPhase {
    fn x_tolerance(self, config: &HitTestConfig) -> f64 {
        match self {
            HitPhase::Searching => config.tolerance.coarse_x,
            HitPhase::Confirming => config.tolerance.refined_x,
        }
    }

    fn time_step(self, config: &HitTestConfig) -> f64 {
        match self {
            HitPhase::Searching => config.time_step,
            HitPhase::Confirming => config.tolerance.refined_time_step,
        }
    }
}

/// How a hit test run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Matched the target box in both phases
    Hit,
    /// Dropped below ground first
    Grounded,
    /// Passed the target distance without a confirmed match
    Overshot,
    /// Ran out of steps
    IterationCapExceeded,
}

impl HitOutcome {
    pub fn is_hit(self) -> bool {
        self == HitOutcome::Hit
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HitTestReport {
    pub outcome: HitOutcome,
    pub phase: HitPhase,
    pub steps: u64,
    pub final_state: SimulationState,
}

/// Inside the target box while still above the target
pub fn within_target_box(position: &Vector2<f64>, target: &Target, x_tolerance: f64, y_tolerance: f64) -> bool {
    (position.x - target.x).abs() < x_tolerance
        && (position.y - target.y).abs() < y_tolerance
        && position.y > target.y
}

/// Fly towards `target` at `angle_deg` and report whether it is struck.
pub fn hit_test(
    launch: &LaunchParameters,
    target: &Target,
    angle_deg: f64,
    config: &HitTestConfig,
) -> Result<HitTestReport, BallisticsError> {
    launch.validate()?;
    target.validate()?;
    config.validate()?;
    require_finite("angle_degrees", angle_deg)?;

    Ok(run_hit_test(launch, target, angle_deg, config, config.max_iterations))
}

/// Hit test without input validation; `step_cap` overrides the configured cap.
pub(crate) fn run_hit_test(
    launch: &LaunchParameters,
    target: &Target,
    angle_deg: f64,
    config: &HitTestConfig,
    step_cap: u64,
) -> HitTestReport {
    let mut state = SimulationState::at_launch(launch, angle_deg);
    let mut phase = HitPhase::Searching;
    let mut steps = 0u64;

    let report = |outcome: HitOutcome, phase: HitPhase, steps: u64, state: SimulationState| HitTestReport {
        outcome,
        phase,
        steps,
        final_state: state,
    };

    while state.y() >= 0.0 && state.x() <= target.x {
        if steps >= step_cap {
            return report(HitOutcome::IterationCapExceeded, phase, steps, state);
        }

        state.step(&config.constants, phase.time_step(config));
        steps += 1;

        if within_target_box(&state.position, target, phase.x_tolerance(config), config.tolerance.y) {
            match phase {
                HitPhase::Searching => {
                    tracing::trace!(
                        angle_deg,
                        x = state.x(),
                        y = state.y(),
                        steps,
                        "entered target box, refining"
                    );
                    phase = HitPhase::Confirming;
                }
                HitPhase::Confirming => {
                    return report(HitOutcome::Hit, phase, steps, state);
                }
            }
        }
    }

    let outcome = if state.y() < 0.0 {
        HitOutcome::Grounded
    } else {
        HitOutcome::Overshot
    };
    report(outcome, phase, steps, state)
}

fn require_finite(field: &'static str, value: f64) -> Result<(), BallisticsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BallisticsError::invalid(field, "must be a finite number"))
    }
}

fn validate_time_step(field: &'static str, dt: f64) -> Result<(), BallisticsError> {
    require_finite(field, dt)?;
    if dt <= 0.0 {
        return Err(BallisticsError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}
