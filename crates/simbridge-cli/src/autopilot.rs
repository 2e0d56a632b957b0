//! `simbridge autopilot` – drive the simulator from camera captures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::ValueEnum;
use colored::Colorize;
use simbridge_perception::ContourDetector;
use simbridge_runtime::{BridgeClient, NavigationLoop, NavigationReport, NavigatorConfig};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// One fixed goal, trigger captures, turn on any obstacle.
    Single,
    /// Tour the four corners with moving obstacles.
    Corners,
}

pub struct Options {
    pub bridge_url: String,
    pub timeout: Duration,
    pub variant: Variant,
    pub max_steps: Option<usize>,
    pub skip_self_test: bool,
}

pub(crate) fn navigator_config(opts: &Options) -> NavigatorConfig {
    let mut cfg = match opts.variant {
        Variant::Single => NavigatorConfig::single_goal(),
        Variant::Corners => NavigatorConfig::corner_tour(),
    };
    if let Some(steps) = opts.max_steps {
        cfg.max_steps = steps;
    }
    if opts.skip_self_test {
        cfg.self_test = None;
    }
    cfg
}

pub fn run(opts: Options) -> Result<NavigationReport, String> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this step …".yellow().bold());
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end on its step budget");
    }

    let nav_cfg = navigator_config(&opts);
    let client = BridgeClient::new(opts.bridge_url.as_str(), opts.timeout).map_err(|e| e.to_string())?;
    let detector = ContourDetector::new(nav_cfg.min_area);

    println!(
        "  {} {:?} autopilot against {} ({} goal(s), {} steps each)",
        "🤖".bold(),
        opts.variant,
        client.base_url().bold(),
        nav_cfg.goals.len(),
        nav_cfg.max_steps
    );

    let report = NavigationLoop::new(client, detector, nav_cfg)
        .with_shutdown(shutdown)
        .run()
        .map_err(|e| e.to_string())?;
    print_report(&report);
    Ok(report)
}

fn print_report(report: &NavigationReport) {
    println!();
    let headline = if report.interrupted {
        "Navigation interrupted.".yellow().bold()
    } else {
        "Navigation finished.".green().bold()
    };
    println!("  {headline}");
    println!("    steps         {}", report.steps);
    println!("    moves sent    {}", report.moves_sent);
    if report.move_failures > 0 {
        println!("    move failures {}", report.move_failures.to_string().red());
    }
    println!("    blind cycles  {}", report.blind_cycles);
    println!("    avoidances    {}", report.obstacle_cycles);
    if !report.goals_reached.is_empty() {
        println!("    goals reached {}", report.goals_reached.join(", "));
    }
}
