//! spring - spinner and pull-to-refresh indicator demo

mod logging;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simulate::{render_table, Script, Simulation};
use spring_core::SpringConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "spring",
    version,
    about = "Spinner and pull-to-refresh indicator demo",
    long_about = "Animated arc spinner with a pull-to-refresh control.\n\
                  \n\
                  Examples:\n\
                    spring                           # Run the TUI demo (default)\n\
                    spring demo --refresh-secs 4     # Longer simulated refresh\n\
                    spring simulate                  # Headless scripted pull, prints transitions\n\
                    spring simulate --pull 60        # Pull that stays below the threshold\n\
                    spring config                    # Print the effective configuration\n\
                    spring config --write            # Save it to the config path\n\
                  \n\
                  Environment Variables:\n\
                    SPRING_CONFIG                    # Path of the TOML config file\n\
                    SPRING_NO_COLOR                  # Disable ANSI colors in tables\n\
                    RUST_LOG                         # Log filter (default: spring=info)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path of the config file (default: <config_dir>/spring/config.toml)
    #[arg(long, global = true, env = "SPRING_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the TUI demo (default)
    Demo {
        /// Seconds a refresh runs before it is ended
        #[arg(long, default_value_t = 2.0)]
        refresh_secs: f64,
    },
    /// Run a scripted pull-to-refresh without a terminal UI
    Simulate {
        /// Initial top inset of the scroll view
        #[arg(long, default_value_t = 0.0)]
        inset: f64,

        /// Total pull distance
        #[arg(long, default_value_t = 120.0, value_parser = parse_pull)]
        pull: f64,

        /// Distance of each drag step
        #[arg(long, default_value_t = 10.0, value_parser = parse_step)]
        step: f64,

        /// Milliseconds between refresh start and end
        #[arg(long, default_value_t = 1500)]
        work_ms: u64,

        /// Simulated frame interval in milliseconds
        #[arg(long, default_value_t = 16)]
        frame_ms: u64,

        /// Pace frames in wall-clock time
        #[arg(long)]
        realtime: bool,

        /// Disable ANSI colors (log-friendly)
        #[arg(long, env = "SPRING_NO_COLOR")]
        no_color: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Write the configuration to the config path
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = cli.mode.unwrap_or(Mode::Demo { refresh_secs: 2.0 });

    // The TUI owns the terminal, keep its logs in a file
    let _guard = match mode {
        Mode::Demo { .. } => Some(logging::init_file()?),
        _ => {
            logging::init_stderr();
            None
        }
    };

    let config_path = cli.config.clone().or_else(SpringConfig::default_path);
    let config = load_config(cli.config.as_deref(), config_path.as_deref())?;

    match mode {
        Mode::Demo { refresh_secs } => {
            let work = Duration::try_from_secs_f64(refresh_secs)
                .context("--refresh-secs must be a non-negative number")?;
            spring_tui::run(config, work)?;
        }
        Mode::Simulate {
            inset,
            pull,
            step,
            work_ms,
            frame_ms,
            realtime,
            no_color,
        } => {
            let script = Script {
                inset_top: inset,
                pull,
                step,
                work: Duration::from_millis(work_ms),
                frame: Duration::from_millis(frame_ms.max(1)),
            };
            run_simulation(&config, script, realtime, no_color).await;
        }
        Mode::Config { write } => {
            print!("{}", config.to_toml_string()?);
            if write {
                let path = config_path.context("Could not determine config directory")?;
                config
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}

/// Smallest accepted drag step
const MIN_STEP: f64 = 0.1;

/// Largest accepted pull distance
const MAX_PULL: f64 = 10_000.0;

fn parse_pull(s: &str) -> Result<f64, String> {
    let pull: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=MAX_PULL).contains(&pull) {
        return Err(format!("must be between 0 and {MAX_PULL}"));
    }
    Ok(pull)
}

fn parse_step(s: &str) -> Result<f64, String> {
    let step: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !step.is_finite() || step < MIN_STEP {
        return Err(format!("must be a finite number of at least {MIN_STEP}"));
    }
    Ok(step)
}

/// An explicit `--config` must load; the default path degrades to defaults
fn load_config(
    explicit: Option<&std::path::Path>,
    default: Option<&std::path::Path>,
) -> Result<SpringConfig> {
    if let Some(path) = explicit {
        return SpringConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    Ok(default
        .map(SpringConfig::load_or_default)
        .unwrap_or_default())
}

async fn run_simulation(config: &SpringConfig, script: Script, realtime: bool, no_color: bool) {
    info!(?script, realtime, "running simulation");
    let mut simulation = Simulation::new(config, script);
    if realtime {
        simulation = simulation.paced();
    }
    let log = simulation.run().await;

    println!("{}", render_table(&log, no_color));

    let refreshes = log
        .iter()
        .flat_map(|row| row.events.iter())
        .filter(|e| **e == spring_core::ControlEvent::ValueChanged)
        .count();
    println!("\n{} transitions, {} refresh(es)", log.len(), refreshes);
}
