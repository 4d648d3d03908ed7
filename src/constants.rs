/// Physical constants and solver defaults for the direct-fire model

/// Gravitational acceleration in m/s²
pub const G_ACCEL_MPS2: f64 = 9.81;

/// Quadratic drag coefficient (1/m)
///
/// Drag deceleration is applied per axis as `-k * |v| * v_axis`, so the
/// retardation along the flight path is `k * |v|²`. The value corresponds to a
/// 7.62 mm ball round fired from a medium machine gun.
pub const DRAG_COEFFICIENT: f64 = 0.000898;

/// Reference muzzle velocity (m/s)
pub const DEFAULT_MUZZLE_VELOCITY_MPS: f64 = 840.0;

/// Reference muzzle height above ground (m)
pub const DEFAULT_LAUNCH_HEIGHT_M: f64 = 1.5;

/// Height of the line of sight above the muzzle (m)
pub const SIGHT_HEIGHT_OFFSET_M: f64 = 0.15;

// Integration step sizes
/// Coarse step used while searching for the target box (s)
pub const HIT_TEST_TIME_STEP_S: f64 = 1e-4;

/// Step used once the projectile is inside the coarse target box (s)
pub const REFINED_TIME_STEP_S: f64 = 1e-8;

/// Step used for full trajectory sampling (s)
pub const TRAJECTORY_TIME_STEP_S: f64 = 1e-3;

/// Flight time after which trajectory sampling gives up (s)
pub const MAX_FLIGHT_TIME_S: f64 = 100.0;

// Hit test tolerances
/// Horizontal half-width of the target box before refinement (m)
pub const COARSE_X_TOLERANCE_M: f64 = 0.2;

/// Horizontal half-width of the target box after refinement (m)
pub const REFINED_X_TOLERANCE_M: f64 = 0.01;

/// Vertical half-height of the target box (m)
pub const Y_TOLERANCE_M: f64 = 0.1;

/// Step cap for a single hit test run
///
/// Covers the coarse flight to ~1500 m plus the refined approach for
/// projectiles down to roughly 20 m/s at the target.
pub const MAX_HIT_TEST_ITERATIONS: u64 = 2_000_000;

// Angle search
/// Scan increment (degrees)
pub const ANGLE_STEP_DEG: f64 = 0.01;

/// Scan window above the line-of-sight estimate (degrees)
pub const SEARCH_WINDOW_DEG: f64 = 5.0;

/// Decimal places the line-of-sight estimate is rounded to
pub const ESTIMATE_DECIMALS: i32 = 2;

/// NATO mils per degree (6400 mils per full turn)
pub const MILS_PER_DEGREE: f64 = 6400.0 / 360.0;
