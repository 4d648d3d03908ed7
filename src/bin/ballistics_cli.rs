use clap::{Parser, Subcommand, ValueEnum};
use direct_fire::constants::{
    ANGLE_STEP_DEG, DEFAULT_LAUNCH_HEIGHT_M, DEFAULT_MUZZLE_VELOCITY_MPS, DRAG_COEFFICIENT,
    G_ACCEL_MPS2, HIT_TEST_TIME_STEP_S, MAX_FLIGHT_TIME_S, MAX_HIT_TEST_ITERATIONS, SEARCH_WINDOW_DEG,
    SIGHT_HEIGHT_OFFSET_M, TRAJECTORY_TIME_STEP_S,
};
use direct_fire::{
    build_firing_table, sample_trajectory, solve_with_report, AngleSearchConfig, BallisticsError,
    FiringTableRow, HitTestConfig, LaunchParameters, PhysicsConstants, SearchBudget, SolveReport,
    SolveRequest, Target, TrajectoryRequest, TrajectorySample,
};
use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

/// Exit code for a target that cannot be struck within the search window
const EXIT_NO_SOLUTION: u8 = 3;

#[derive(Parser)]
#[command(name = "ballistics-cli")]
#[command(version)]
#[command(about = "Direct-fire launch angle solver with quadratic drag", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct LaunchArgs {
    /// Muzzle velocity (m/s)
    #[arg(short = 'v', long, default_value_t = DEFAULT_MUZZLE_VELOCITY_MPS)]
    velocity: f64,

    /// Muzzle height above ground (m)
    #[arg(long, default_value_t = DEFAULT_LAUNCH_HEIGHT_M)]
    height: f64,

    /// Gravitational acceleration (m/s²)
    #[arg(long, default_value_t = G_ACCEL_MPS2)]
    gravity: f64,

    /// Quadratic drag coefficient (1/m)
    #[arg(long, default_value_t = DRAG_COEFFICIENT)]
    drag: f64,
}

impl LaunchArgs {
    fn launch(&self) -> LaunchParameters {
        LaunchParameters::new(self.velocity, self.height)
    }

    fn constants(&self) -> PhysicsConstants {
        PhysicsConstants {
            gravity: self.gravity,
            drag_coefficient: self.drag,
        }
    }
}

#[derive(clap::Args, Clone, Copy)]
struct SearchArgs {
    /// Search window above the line-of-sight angle (degrees)
    #[arg(long, default_value_t = SEARCH_WINDOW_DEG)]
    window: f64,

    /// Scan increment (degrees)
    #[arg(long, default_value_t = ANGLE_STEP_DEG)]
    angle_step: f64,

    /// Sight height above the muzzle (m)
    #[arg(long, default_value_t = SIGHT_HEIGHT_OFFSET_M)]
    sight_offset: f64,

    /// Coarse integration step for the hit test (seconds)
    #[arg(long, default_value_t = HIT_TEST_TIME_STEP_S)]
    time_step: f64,

    /// Step cap for a single candidate angle
    #[arg(long, default_value_t = MAX_HIT_TEST_ITERATIONS)]
    max_iterations: u64,

    /// Total integration steps allowed for one solve
    #[arg(long)]
    max_steps: Option<u64>,

    /// Wall-clock limit for one solve (milliseconds)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl SearchArgs {
    fn config(&self, constants: PhysicsConstants) -> AngleSearchConfig {
        AngleSearchConfig {
            hit_test: HitTestConfig {
                constants,
                time_step: self.time_step,
                max_iterations: self.max_iterations,
                ..HitTestConfig::default()
            },
            angle_step: self.angle_step,
            window: self.window,
            sight_offset: self.sight_offset,
            budget: SearchBudget {
                max_total_steps: self.max_steps,
                deadline: self.timeout_ms.map(Duration::from_millis),
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find the launch angle that strikes a target
    Solve {
        /// Horizontal distance to the target (m)
        #[arg(short = 'x', long)]
        target_x: f64,

        /// Target height above ground (m)
        #[arg(short = 'y', long, allow_negative_numbers = true)]
        target_y: f64,

        #[command(flatten)]
        launch: LaunchArgs,

        #[command(flatten)]
        search: SearchArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Sample a full trajectory from launch to ground impact
    Trajectory {
        /// Launch angle (degrees)
        #[arg(short = 'a', long, allow_negative_numbers = true)]
        angle: f64,

        #[command(flatten)]
        launch: LaunchArgs,

        /// Integration step (seconds)
        #[arg(long, default_value_t = TRAJECTORY_TIME_STEP_S)]
        time_step: f64,

        /// Flight time after which a still-airborne projectile is an error (seconds)
        #[arg(long, default_value_t = MAX_FLIGHT_TIME_S)]
        max_flight_time: f64,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// Print every sample instead of roughly ten
        #[arg(long)]
        full: bool,
    },

    /// Solve a series of ranges and print angles in degrees and mils
    Table {
        /// Comma-separated target distances (m)
        #[arg(long, value_delimiter = ',', required = true)]
        ranges: Vec<f64>,

        /// Target height for every range (m)
        #[arg(long, default_value_t = DEFAULT_LAUNCH_HEIGHT_M, allow_negative_numbers = true)]
        target_y: f64,

        #[command(flatten)]
        launch: LaunchArgs,

        #[command(flatten)]
        search: SearchArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Display model information
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Commands::Solve {
            target_x,
            target_y,
            launch,
            search,
            output,
        } => {
            let request = SolveRequest {
                launch: launch.launch(),
                target: Target::new(target_x, target_y),
                search: search.config(launch.constants()),
            };
            let report = solve_with_report(&request)?;
            display_solve_report(&report, output)?;

            if report.angle_deg.is_none() {
                eprintln!(
                    "Error: {}",
                    BallisticsError::NoSolutionFound { target_x, target_y }
                );
                return Ok(ExitCode::from(EXIT_NO_SOLUTION));
            }
        }

        Commands::Trajectory {
            angle,
            launch,
            time_step,
            max_flight_time,
            output,
            full,
        } => {
            let request = TrajectoryRequest {
                launch: launch.launch(),
                angle_degrees: angle,
                constants: launch.constants(),
                time_step,
                max_flight_time,
            };
            let samples = sample_trajectory(&request)?;
            display_trajectory(&samples, output, full)?;
        }

        Commands::Table {
            ranges,
            target_y,
            launch,
            search,
            output,
        } => {
            let rows = build_firing_table(
                &launch.launch(),
                &ranges,
                target_y,
                &search.config(launch.constants()),
            )?;
            display_firing_table(&rows, output)?;
        }

        Commands::Info => {
            println!("╔════════════════════════════════════════╗");
            println!("║       DIRECT FIRE ANGLE SOLVER         ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Gravity:           {:>8.3} m/s²       ║", G_ACCEL_MPS2);
            println!("║ Drag coefficient:  {:>8.6} 1/m        ║", DRAG_COEFFICIENT);
            println!("║ Muzzle velocity:   {:>8.1} m/s        ║", DEFAULT_MUZZLE_VELOCITY_MPS);
            println!("║ Muzzle height:     {:>8.2} m          ║", DEFAULT_LAUNCH_HEIGHT_M);
            println!("║ Sight offset:      {:>8.2} m          ║", SIGHT_HEIGHT_OFFSET_M);
            println!("╠════════════════════════════════════════╣");
            println!("║ • Semi-implicit Euler integration      ║");
            println!("║ • Two-phase target hit test            ║");
            println!("║ • Forward scan from line of sight      ║");
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn display_solve_report(report: &SolveReport, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }

        OutputFormat::Csv => {
            println!("target_x,target_y,line_of_sight_deg,angle_deg,angle_mils");
            println!(
                "{},{},{:.4},{},{}",
                report.target_x,
                report.target_y,
                report.line_of_sight_deg,
                format_optional(report.angle_deg, 2),
                format_optional(report.angle_mils, 2),
            );
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║          LAUNCH ANGLE SOLUTION         ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Target X:          {:>8.2} m          ║", report.target_x);
            println!("║ Target Y:          {:>8.2} m          ║", report.target_y);
            println!("║ Line of sight:     {:>8.4} °          ║", report.line_of_sight_deg);
            match (report.angle_deg, report.angle_mils) {
                (Some(degrees), Some(mils)) => {
                    println!("║ Launch angle:      {:>8.2} °          ║", degrees);
                    println!("║ Launch angle:      {:>8.2} mil        ║", mils);
                }
                _ => {
                    println!("║ Launch angle:      not found           ║");
                }
            }
            println!("║ Candidates tried:  {:>8}            ║", report.candidates_tried);
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn display_trajectory(samples: &[TrajectorySample], format: OutputFormat, full: bool) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(samples)?);
        }

        OutputFormat::Csv => {
            println!("time,x,y");
            for s in samples {
                println!("{:.4},{:.4},{:.4}", s.time, s.x, s.y);
            }
        }

        OutputFormat::Table => {
            let step = if full { 1 } else { (samples.len() / 10).max(1) };

            println!("┌──────────┬──────────┬──────────┐");
            println!("│ Time (s) │  X (m)   │  Y (m)   │");
            println!("├──────────┼──────────┼──────────┤");
            for (i, s) in samples.iter().enumerate() {
                if i % step == 0 || i == samples.len() - 1 {
                    println!("│ {:>8.3} │ {:>8.2} │ {:>8.3} │", s.time, s.x, s.y);
                }
            }
            println!("└──────────┴──────────┴──────────┘");
        }
    }

    Ok(())
}

fn display_firing_table(rows: &[FiringTableRow], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }

        OutputFormat::Csv => {
            println!("target_x,target_y,angle_deg,angle_mils");
            for row in rows {
                println!(
                    "{},{},{},{}",
                    row.target_x,
                    row.target_y,
                    format_optional(row.angle_deg, 2),
                    format_optional(row.angle_mils, 2),
                );
            }
        }

        OutputFormat::Table => {
            println!("┌──────────┬──────────┬──────────┬──────────┐");
            println!("│ Range(m) │ Height(m)│ Angle(°) │ Mils     │");
            println!("├──────────┼──────────┼──────────┼──────────┤");
            for row in rows {
                println!(
                    "│ {:>8.1} │ {:>8.2} │ {:>8} │ {:>8} │",
                    row.target_x,
                    row.target_y,
                    format_optional(row.angle_deg, 2),
                    format_optional(row.angle_mils, 2),
                );
            }
            println!("└──────────┴──────────┴──────────┴──────────┘");
        }
    }

    Ok(())
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}
