//! Tickflow - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tickflow::demo::{run_demo, DemoOptions};
use tickflow::util::config::{load_config, to_toml};
use tickflow::util::logger::{self, LogLevel};
use tickflow::{NAME, VERSION};

/// Cooperative task engine driven by a host tick loop
#[derive(Parser, Debug)]
#[command(name = "tickflow")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user config, if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scripted demo workflow
    Demo {
        /// Progress values produced by the processing stage
        #[arg(long, default_value_t = 3)]
        steps: u32,

        /// Tick on which the simulated download finishes
        #[arg(long, default_value_t = 2)]
        download_ticks: u64,

        /// Make the publish stage fail
        #[arg(long)]
        fail: bool,

        /// Cancel the workflow on this tick
        #[arg(long, value_name = "TICK")]
        cancel_at: Option<u64>,

        /// Deadline in milliseconds, overriding the config
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Milliseconds between ticks, overriding the config
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load config")?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config
            .log
            .level
            .parse::<LogLevel>()
            .with_context(|| format!("Invalid log level in config: {}", config.log.level))?
    };
    logger::init_with_level(level);

    match args.command {
        Commands::Demo {
            steps,
            download_ticks,
            fail,
            cancel_at,
            timeout_ms,
            interval_ms,
        } => {
            if let Some(interval_ms) = interval_ms {
                config.host.tick_interval_ms = interval_ms;
            }
            let options = DemoOptions {
                steps,
                download_ticks,
                fail,
                cancel_at,
                timeout: timeout_ms.map(Duration::from_millis),
            };
            let report = run_demo(&config, &options);
            for output in &report.outputs {
                println!("{}", output);
            }
            println!(
                "status: {} after {} ticks ({} tasks completed)",
                report.status, report.host.ticks, report.stats.tasks_completed
            );
            if let Some(error) = &report.error {
                println!("error: {}", error);
            }
        }
        Commands::Config => {
            let rendered = to_toml(&config).context("Failed to render config")?;
            print!("{}", rendered);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
