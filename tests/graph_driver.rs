// tests/graph_driver.rs

mod common;
use crate::common::{command_task, init_tracing, move_task, timer_task, ROVER};

use std::error::Error;
use std::time::Duration;

use missiongraph::command::{CommandKind, CommandType};
use missiongraph::dag::TaskGraph;
use missiongraph::engine::{GraphDriver, ManualClock};
use missiongraph_test_utils::FakeChannel;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn scenario_c_rejected_dispatch_is_retried_each_tick() -> TestResult {
    init_tracing();

    let mut graph = TaskGraph::new();
    graph.add_task(move_task("Move1", 20.0), &[])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    channel.script([false, false, false, true]);
    let clock = ManualClock::new();

    for tick in 1..=3 {
        let report = driver.tick(&mut graph, &mut channel, &clock);
        assert_eq!(report.rejected, vec!["Move1"], "tick {tick}");
        assert!(!graph.get_task("Move1")?.is_started(), "tick {tick}");
        assert_eq!(channel.attempts(), tick);
    }

    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.dispatched, vec!["Move1"]);
    assert!(graph.get_task("Move1")?.is_started());
    assert_eq!(channel.attempts(), 4);
    assert_eq!(channel.accepted().len(), 1);

    // Started and unresolved: never re-sent.
    driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(channel.attempts(), 4);
    assert!(graph.pending_tasks().contains("Move1"));
    Ok(())
}

#[test]
fn scenario_d_timer_completes_once_after_duration() -> TestResult {
    init_tracing();

    let mut graph = TaskGraph::new();
    graph.add_task(timer_task("Wait", 5.0), &[])?;
    graph.add_task(move_task("After", 1.0), &["Wait"])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    let clock = ManualClock::new();

    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.timers_started, vec!["Wait"]);
    assert!(graph.get_task("Wait")?.is_started());

    clock.set_secs(4.9);
    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert!(report.timers_completed.is_empty());
    assert!(graph.pending_tasks().contains("Wait"));

    clock.set_secs(5.0);
    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.timers_completed, vec!["Wait"]);
    assert_eq!(report.unlocked, vec!["After"]);
    assert!(graph.completed_tasks().contains("Wait"));

    // Unlocked mid-tick: starts on the next tick, not this one.
    assert!(report.dispatched.is_empty());
    assert_eq!(channel.attempts(), 0);

    clock.advance(Duration::from_secs(1));
    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert!(report.timers_completed.is_empty());
    assert_eq!(report.dispatched, vec!["After"]);
    assert_eq!(graph.get_status().completed, vec!["Wait"]);
    Ok(())
}

#[test]
fn zero_length_timer_completes_on_following_tick() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_task(timer_task("Now", 0.0), &[])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    let clock = ManualClock::new();

    driver.tick(&mut graph, &mut channel, &clock);
    assert!(graph.pending_tasks().contains("Now"));

    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.timers_completed, vec!["Now"]);
    Ok(())
}

#[test]
fn timer_start_time_is_recorded_once() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_task(timer_task("Wait", 2.0), &[])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    let clock = ManualClock::new();

    clock.set_secs(10.0);
    driver.tick(&mut graph, &mut channel, &clock);
    clock.set_secs(11.0);
    driver.tick(&mut graph, &mut channel, &clock);
    clock.set_secs(12.0);
    let report = driver.tick(&mut graph, &mut channel, &clock);

    assert_eq!(report.timers_completed, vec!["Wait"]);
    Ok(())
}

#[test]
fn same_type_commands_on_one_target_are_serialized() -> TestResult {
    init_tracing();

    let mut graph = TaskGraph::new();
    graph.add_task(move_task("MoveA", 1.0), &[])?;
    graph.add_task(move_task("MoveB", 2.0), &[])?;
    graph.add_task(
        command_task("Pan", CommandKind::CameraPan { azimuth: 90.0, elevation: 10.0 }),
        &[],
    )?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    let clock = ManualClock::new();

    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.dispatched, vec!["MoveA", "Pan"]);
    assert_eq!(report.deferred, vec!["MoveB"]);

    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.deferred, vec!["MoveB"]);
    assert!(report.dispatched.is_empty());

    graph.mark_completed("MoveA")?;
    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.dispatched, vec!["MoveB"]);

    let types: Vec<CommandType> = channel
        .accepted()
        .iter()
        .map(|s| s.envelope.command_type())
        .collect();
    assert_eq!(
        types,
        vec![CommandType::MoveToCoord, CommandType::CameraPan, CommandType::MoveToCoord]
    );
    Ok(())
}

#[test]
fn dispatched_envelope_carries_task_id_and_command_id() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_task(move_task("Move1", 20.0), &[])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    driver.tick(&mut graph, &mut channel, &ManualClock::new());

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target, ROVER);
    assert_eq!(sent[0].task_id(), Some("Move1"));
    assert_eq!(sent[0].envelope.meta.command_id, "MM_Cmd_LTV1_MoveToCoord");
    assert_eq!(sent[0].envelope.meta.generation, Some(0));
    assert_eq!(
        sent[0].envelope.command,
        CommandKind::MoveToCoord { x: 20.0, y: 0.0 }
    );
    Ok(())
}

#[test]
fn blocked_tasks_are_never_offered() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_task(move_task("Move1", 1.0), &[])?;
    graph.add_task(
        command_task("Snap", CommandKind::CaptureImage { exposure: 0.5 }),
        &["Move1"],
    )?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    let clock = ManualClock::new();

    for _ in 0..3 {
        driver.tick(&mut graph, &mut channel, &clock);
    }
    assert_eq!(channel.accepted_task_ids(), vec!["Move1"]);
    Ok(())
}

#[test]
fn unreachable_target_is_retried_until_back_in_comms() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_task(move_task("Move1", 1.0), &[])?;

    let driver = GraphDriver::new(ROVER);
    let mut channel = FakeChannel::new();
    channel.set_reachable(ROVER, false);
    let clock = ManualClock::new();

    for _ in 0..5 {
        driver.tick(&mut graph, &mut channel, &clock);
    }
    assert_eq!(channel.attempts(), 5);
    assert!(channel.accepted().is_empty());

    channel.set_reachable(ROVER, true);
    let report = driver.tick(&mut graph, &mut channel, &clock);
    assert_eq!(report.dispatched, vec!["Move1"]);
    Ok(())
}

#[test]
fn empty_graph_tick_is_quiet() {
    let mut graph = TaskGraph::new();
    let mut channel = FakeChannel::new();
    let report = GraphDriver::new(ROVER).tick(&mut graph, &mut channel, &ManualClock::new());
    assert!(report.is_quiet());
    assert_eq!(channel.attempts(), 0);
}
