//! `simbridge` – command-line entry point for the simulator bridge.
//!
//! - `serve` runs the relay: the HTTP control API and the simulator
//!   WebSocket listener, side by side, until Ctrl-C.
//! - `autopilot` drives a connected simulator through the control API.
//! - `probe` fires a short request sequence at a running bridge.
//! - `config` shows the effective configuration, or writes the defaults.

mod autopilot;
mod config;
mod probe;
mod serve;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::warn;

use autopilot::Variant;

#[derive(Parser)]
#[command(name = "simbridge")]
#[command(about = "Relay commands and telemetry between HTTP callers and a 3-D simulator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (control API + simulator listener)
    Serve {
        /// Interface to bind both listeners to
        #[arg(long)]
        host: Option<String>,

        /// Control API port
        #[arg(long)]
        http_port: Option<u16>,

        /// Simulator WebSocket port
        #[arg(long)]
        simulator_port: Option<u16>,
    },

    /// Drive the simulator from camera captures
    Autopilot {
        #[arg(long, value_enum, default_value = "single")]
        variant: Variant,

        /// Control API base URL
        #[arg(long)]
        bridge_url: Option<String>,

        /// Step budget per goal
        #[arg(long)]
        max_steps: Option<usize>,

        /// Skip the pre-flight movement check
        #[arg(long)]
        skip_self_test: bool,
    },

    /// Send move, goal and capture requests and print the answers
    Probe {
        /// Control API base URL
        #[arg(long)]
        bridge_url: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to ~/.simbridge/config.toml
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _tracing = simbridge_runtime::init_tracing("simbridge");

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "using default configuration");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    let timeout = Duration::from_secs(cfg.request_timeout_secs);

    let result = match cli.command {
        Commands::Serve {
            host,
            http_port,
            simulator_port,
        } => {
            print_banner();
            serve::run(
                host.as_deref().unwrap_or(&cfg.bind_host),
                http_port.unwrap_or(cfg.http_port),
                simulator_port.unwrap_or(cfg.simulator_port),
            )
        }
        Commands::Autopilot {
            variant,
            bridge_url,
            max_steps,
            skip_self_test,
        } => autopilot::run(autopilot::Options {
            bridge_url: bridge_url.unwrap_or(cfg.bridge_url),
            timeout,
            variant,
            max_steps,
            skip_self_test,
        })
        .map(drop),
        Commands::Probe { bridge_url } => {
            probe::run(&bridge_url.unwrap_or(cfg.bridge_url), timeout).map(drop)
        }
        Commands::Config { init } => show_config(&cfg, init),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn show_config(cfg: &config::Config, init: bool) -> Result<(), String> {
    if init {
        let path = config::save(&config::Config::default())?;
        println!("  {} defaults written to {}", "✓".green().bold(), path.display().to_string().bold());
        return Ok(());
    }
    println!("  {}", config::config_path().display().to_string().dimmed());
    let raw = toml::to_string_pretty(cfg).map_err(|e| e.to_string())?;
    for line in raw.lines() {
        println!("  {line}");
    }
    Ok(())
}

fn print_banner() {
    println!();
    println!("{}", "  ┌─────────────────────────────┐".bold().cyan());
    println!("{}", "  │          simbridge          │".bold().cyan());
    println!("{}", "  └─────────────────────────────┘".bold().cyan());
    println!(
        "  {} {}",
        "Simulator bridge".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}
