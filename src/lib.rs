// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod sim;
pub mod types;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, PlanFile};
use crate::engine::{IntervalTicker, Mission, MissionEvent, Runtime, RuntimeOptions, SystemClock};
use crate::sim::SimChannel;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading
/// - one task graph per target
/// - the simulated command channel
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_validate(&args.plan)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let mission = Mission::from_plan(&plan)?;

    let (event_tx, event_rx) = mpsc::channel::<MissionEvent>(64);
    let channel = SimChannel::from_plan(&plan, event_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(MissionEvent::ShutdownRequested).await;
        });
    }

    info!(
        targets = plan.target.len(),
        tasks = plan.task_count(),
        loop_freq_hz = plan.config.loop_freq_hz,
        "starting mission"
    );

    let ticker = IntervalTicker::from_hz(plan.config.loop_freq_hz)?;
    let options = RuntimeOptions {
        exit_when_idle: args.exit_when_idle,
        max_ticks: args.max_ticks,
    };

    let runtime = Runtime::new(mission, event_rx, channel, ticker, SystemClock::new(), options);
    let mission = runtime.run().await?;

    report_final_status(&mission);
    Ok(())
}

fn report_final_status(mission: &Mission) {
    for (target, status) in mission.status() {
        if status.failed.is_empty() {
            info!(target_id = %target, %status, "final status");
        } else {
            warn!(target_id = %target, %status, "final status");
        }
    }
}

/// Simple dry-run output: print targets, tasks and dependencies.
fn print_dry_run(plan: &PlanFile) {
    println!("missiongraph dry-run");
    println!("  config.loop_freq_hz = {}", plan.config.loop_freq_hz);
    println!("  config.failure_policy = {:?}", plan.config.failure_policy);
    println!("  config.resolution_mode = {:?}", plan.config.resolution_mode);
    println!();

    for (name, target) in plan.target.iter() {
        println!("target {name} ({} tasks):", target.task.len());
        println!("  reachable: {}", target.reachable);
        println!("  latency: {}", target.latency);
        if !target.fail.is_empty() {
            println!("  fail: {:?}", target.fail);
        }
        for (id, task) in target.task.iter() {
            println!("  - {id}");
            if let Some(ref command) = task.command {
                println!("      command: {command:?}");
            }
            if let Some(seconds) = task.timer {
                println!("      timer: {seconds}s");
            }
            if !task.after.is_empty() {
                println!("      after: {:?}", task.after);
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
