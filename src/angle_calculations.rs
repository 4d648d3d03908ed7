use crate::cli_api::BallisticsError;
use crate::constants::{ANGLE_STEP_DEG, ESTIMATE_DECIMALS, SEARCH_WINDOW_DEG, SIGHT_HEIGHT_OFFSET_M};
use crate::trajectory_solver::{run_hit_test, HitTestConfig, LaunchParameters, Target};
use std::time::{Duration, Instant};

/// Outcome of a launch angle search
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleSearchResult {
    Solved(f64), // degrees
    NotFound,
}

impl AngleSearchResult {
    pub fn angle(&self) -> Option<f64> {
        match self {
            AngleSearchResult::Solved(angle) => Some(*angle),
            AngleSearchResult::NotFound => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, AngleSearchResult::Solved(_))
    }

    /// Treat `NotFound` as an error for callers that only want an angle
    pub fn into_result(self, target: &Target) -> Result<f64, BallisticsError> {
        match self {
            AngleSearchResult::Solved(angle) => Ok(angle),
            AngleSearchResult::NotFound => Err(BallisticsError::NoSolutionFound {
                target_x: target.x,
                target_y: target.y,
            }),
        }
    }
}

/// Limits on the total work of one search
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchBudget {
    pub max_total_steps: Option<u64>,
    pub deadline: Option<Duration>,
}

/// Settings for the forward angle scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSearchConfig {
    pub hit_test: HitTestConfig,
    pub angle_step: f64,   // degrees
    pub window: f64,       // degrees above the line-of-sight estimate
    pub sight_offset: f64, // meters above the muzzle
    pub budget: SearchBudget,
}

impl Default for AngleSearchConfig {
    fn default() -> Self {
        Self {
            hit_test: HitTestConfig::default(),
            angle_step: ANGLE_STEP_DEG,
            window: SEARCH_WINDOW_DEG,
            sight_offset: SIGHT_HEIGHT_OFFSET_M,
            budget: SearchBudget::default(),
        }
    }
}

impl AngleSearchConfig {
    pub fn validate(&self) -> Result<(), BallisticsError> {
        self.hit_test.validate()?;
        if !self.angle_step.is_finite() || self.angle_step <= 0.0 {
            return Err(BallisticsError::invalid("angle_step", "must be a positive number"));
        }
        if !self.window.is_finite() || self.window <= 0.0 {
            return Err(BallisticsError::invalid("window", "must be a positive number"));
        }
        if !self.sight_offset.is_finite() {
            return Err(BallisticsError::invalid("sight_offset", "must be a finite number"));
        }
        Ok(())
    }
}

/// Search outcome together with the work it took
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSearchReport {
    pub result: AngleSearchResult,
    pub line_of_sight_deg: f64,
    pub candidates_tried: usize,
    pub total_steps: u64,
}

/// Elevation of the straight line from the sight to the target, in degrees.
///
/// The sight sits `sight_offset` above a muzzle at `launch_height`.
pub fn line_of_sight_angle(target: &Target, launch_height: f64, sight_offset: f64) -> f64 {
    let slope = (target.y - (launch_height + sight_offset)) / target.x;
    slope.atan().to_degrees()
}

pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Candidate elevations `start, start + step, ...` strictly inside `start + window`
pub fn candidate_angles(start: f64, step: f64, window: f64) -> impl Iterator<Item = f64> {
    let count = (window / step).round() as usize;
    (0..count).map(move |i| start + i as f64 * step)
}

/// Scan upward from the line-of-sight estimate for the lowest elevation that
/// strikes the target.
///
/// Every candidate is checked with the two-phase hit test; the first hit is
/// returned without looking further.
pub fn find_launch_angle(
    launch: &LaunchParameters,
    target: &Target,
    config: &AngleSearchConfig,
) -> Result<AngleSearchReport, BallisticsError> {
    launch.validate()?;
    target.validate()?;
    config.validate()?;

    let line_of_sight_deg = line_of_sight_angle(target, launch.launch_height, config.sight_offset);
    let start = round_to_decimals(line_of_sight_deg, ESTIMATE_DECIMALS);
    let started_at = Instant::now();

    let mut total_steps = 0u64;
    let mut candidates_tried = 0usize;

    for angle in candidate_angles(start, config.angle_step, config.window) {
        let step_cap = match config.budget.max_total_steps {
            Some(limit) if total_steps >= limit => {
                return Err(budget_exhausted(candidates_tried, total_steps));
            }
            Some(limit) => (limit - total_steps).min(config.hit_test.max_iterations),
            None => config.hit_test.max_iterations,
        };
        if let Some(deadline) = config.budget.deadline {
            if started_at.elapsed() >= deadline {
                return Err(budget_exhausted(candidates_tried, total_steps));
            }
        }

        let report = run_hit_test(launch, target, angle, &config.hit_test, step_cap);
        total_steps += report.steps;
        candidates_tried += 1;

        tracing::debug!(
            angle_deg = angle,
            outcome = ?report.outcome,
            steps = report.steps,
            "candidate tested"
        );

        if report.outcome.is_hit() {
            tracing::info!(
                angle_deg = angle,
                line_of_sight_deg,
                candidates_tried,
                total_steps,
                "launch angle found"
            );
            return Ok(AngleSearchReport {
                result: AngleSearchResult::Solved(angle),
                line_of_sight_deg,
                candidates_tried,
                total_steps,
            });
        }
    }

    tracing::info!(
        target_x = target.x,
        target_y = target.y,
        start_deg = start,
        window_deg = config.window,
        "no launch angle within search window"
    );
    Ok(AngleSearchReport {
        result: AngleSearchResult::NotFound,
        line_of_sight_deg,
        candidates_tried,
        total_steps,
    })
}

fn budget_exhausted(candidates_tried: usize, steps: u64) -> BallisticsError {
    tracing::warn!(candidates_tried, steps, "angle search budget exhausted");
    BallisticsError::BudgetExhausted {
        candidates_tried,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_launch() -> LaunchParameters {
        LaunchParameters::new(840.0, 1.5)
    }

    #[test]
    fn test_line_of_sight_angle() {
        // Sight at 1.65 m looking at a target at the same height
        let angle = line_of_sight_angle(&Target::new(100.0, 1.65), 1.5, 0.15);
        assert!(angle.abs() < 1e-12);

        let angle = line_of_sight_angle(&Target::new(100.0, 101.65), 1.5, 0.15);
        assert!((angle - 45.0).abs() < 1e-9);

        let angle = line_of_sight_angle(&Target::new(700.0, 1.5), 1.5, 0.15);
        assert!(angle < 0.0 && angle > -0.02);
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(-0.012278, 2), -0.01);
        assert_eq!(round_to_decimals(1.23456, 2), 1.23);
        assert_eq!(round_to_decimals(1.236, 2), 1.24);
    }

    #[test]
    fn test_candidate_angles_cover_window() {
        let angles: Vec<f64> = candidate_angles(-0.01, 0.01, 5.0).collect();
        assert_eq!(angles.len(), 500);
        assert_eq!(angles[0], -0.01);
        assert!((angles[499] - 4.98).abs() < 1e-9);
    }

    #[test]
    fn test_reference_scenario_solves() {
        let report = find_launch_angle(
            &reference_launch(),
            &Target::new(700.0, 1.5),
            &AngleSearchConfig::default(),
        )
        .unwrap();

        let angle = report.result.angle().expect("700 m target should be reachable");
        assert!((angle - 0.45).abs() < 0.02, "angle {angle}");
        assert!(report.candidates_tried > 1);
        assert!(report.total_steps > 0);
    }

    #[test]
    fn test_narrow_window_reports_not_found() {
        let config = AngleSearchConfig {
            window: 0.4,
            ..AngleSearchConfig::default()
        };
        let report = find_launch_angle(&reference_launch(), &Target::new(700.0, 1.5), &config).unwrap();

        assert_eq!(report.result, AngleSearchResult::NotFound);
        assert_eq!(report.candidates_tried, 40);
    }

    #[test]
    fn test_step_budget_is_enforced() {
        let config = AngleSearchConfig {
            budget: SearchBudget {
                max_total_steps: Some(50_000),
                deadline: None,
            },
            ..AngleSearchConfig::default()
        };
        let err = find_launch_angle(&reference_launch(), &Target::new(700.0, 1.5), &config).unwrap_err();

        match err {
            BallisticsError::BudgetExhausted { steps, .. } => assert_eq!(steps, 50_000),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_deadline_is_exhausted_immediately() {
        let config = AngleSearchConfig {
            budget: SearchBudget {
                max_total_steps: None,
                deadline: Some(Duration::ZERO),
            },
            ..AngleSearchConfig::default()
        };
        let err = find_launch_angle(&reference_launch(), &Target::new(700.0, 1.5), &config).unwrap_err();

        assert!(matches!(
            err,
            BallisticsError::BudgetExhausted { candidates_tried: 0, .. }
        ));
    }

    #[test]
    fn test_into_result_maps_not_found() {
        let target = Target::new(100.0, 1.5);
        assert_eq!(AngleSearchResult::Solved(0.05).into_result(&target).unwrap(), 0.05);
        assert!(matches!(
            AngleSearchResult::NotFound.into_result(&target),
            Err(BallisticsError::NoSolutionFound { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_search_config() {
        let config = AngleSearchConfig {
            angle_step: 0.0,
            ..AngleSearchConfig::default()
        };
        let err = find_launch_angle(&reference_launch(), &Target::new(700.0, 1.5), &config).unwrap_err();
        assert!(matches!(err, BallisticsError::InvalidInput { field: "angle_step", .. }));

        let err = find_launch_angle(
            &reference_launch(),
            &Target::new(-5.0, 1.5),
            &AngleSearchConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BallisticsError::InvalidInput { field: "target_x", .. }));
    }
}
