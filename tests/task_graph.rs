// tests/task_graph.rs

mod common;
use crate::common::{init_tracing, move_task, timer_task};

use std::error::Error;

use missiongraph::dag::{TaskGraph, TaskOutcome};
use missiongraph::errors::MissionError;
use missiongraph::types::ResolutionMode;

type TestResult = Result<(), Box<dyn Error>>;

/// A; B after A; C after A; D after B and C.
fn diamond() -> Result<TaskGraph, MissionError> {
    let mut g = TaskGraph::new();
    g.add_task(move_task("A", 1.0), &[])?;
    g.add_task(move_task("B", 2.0), &["A"])?;
    g.add_task(move_task("C", 3.0), &["A"])?;
    g.add_task(move_task("D", 4.0), &["B", "C"])?;
    Ok(g)
}

#[test]
fn scenario_a_chain_unlocks_second_move() -> TestResult {
    init_tracing();

    let mut g = TaskGraph::new();
    g.add_task(move_task("Move1", 20.0), &[])?;
    g.add_task(move_task("Move2", 40.0), &["Move1"])?;

    assert_eq!(g.get_status().pending, vec!["Move1"]);

    let unlocked = g.mark_completed("Move1")?;
    assert_eq!(unlocked, vec!["Move2"]);

    let status = g.get_status();
    assert_eq!(status.pending, vec!["Move2"]);
    assert_eq!(status.completed, vec!["Move1"]);
    assert!(status.failed.is_empty());
    Ok(())
}

#[test]
fn scenario_b_diamond_waits_for_both_branches() -> TestResult {
    init_tracing();
    let mut g = diamond()?;

    g.mark_completed("A")?;
    assert!(g.pending_tasks().contains("B"));
    assert!(g.pending_tasks().contains("C"));
    assert!(!g.pending_tasks().contains("D"));

    g.mark_completed("B")?;
    assert!(!g.pending_tasks().contains("D"), "D must still wait on C");
    assert_eq!(g.blocked_tasks(), vec!["D"]);

    let unlocked = g.mark_completed("C")?;
    assert_eq!(unlocked, vec!["D"]);
    assert!(g.pending_tasks().contains("D"));
    Ok(())
}

#[test]
fn dependency_may_be_registered_after_its_dependent() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("Later", 2.0), &["Early"])?;
    assert!(g.pending_tasks().is_empty());

    g.add_task(move_task("Early", 1.0), &[])?;
    assert_eq!(g.get_status().pending, vec!["Early"]);

    g.mark_completed("Early")?;
    assert_eq!(g.get_status().pending, vec!["Later"]);
    Ok(())
}

#[test]
fn already_completed_prerequisite_counts_as_satisfied() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("Move1", 1.0), &[])?;
    g.mark_completed("Move1")?;

    g.add_task(move_task("Move2", 2.0), &["Move1"])?;
    assert!(g.pending_tasks().contains("Move2"));
    Ok(())
}

#[test]
fn duplicate_id_is_rejected_and_graph_untouched() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("Move1", 1.0), &[])?;
    g.add_task(move_task("Move2", 2.0), &["Move1"])?;
    let before = g.get_status();

    let err = g.add_task(move_task("Move2", 9.0), &[]).unwrap_err();
    assert!(matches!(err, MissionError::DuplicateTaskId(ref id) if id == "Move2"));

    assert_eq!(g.get_status(), before);
    assert_eq!(g.len(), 2);
    assert_eq!(g.blocked_tasks(), vec!["Move2"]);
    Ok(())
}

#[test]
fn cycle_is_rejected_at_add_task() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("A", 1.0), &["C"])?;
    g.add_task(move_task("B", 2.0), &["A"])?;

    let err = g.add_task(move_task("C", 3.0), &["B"]).unwrap_err();
    assert!(matches!(err, MissionError::DependencyCycle { .. }));
    assert!(!g.contains("C"));

    // Registering C without the closing edge still works.
    g.add_task(move_task("C", 3.0), &[])?;
    g.mark_completed("C")?;
    g.mark_completed("A")?;
    assert_eq!(g.get_status().pending, vec!["B"]);
    Ok(())
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut g = TaskGraph::new();
    let err = g.add_task(move_task("A", 1.0), &["A"]).unwrap_err();
    assert!(matches!(err, MissionError::DependencyCycle { .. }));
    assert!(g.is_empty());
}

#[test]
fn unknown_ids_are_reported() {
    let mut g = TaskGraph::new();
    assert!(matches!(g.get_task("nope"), Err(MissionError::UnknownTaskId(_))));
    assert!(matches!(g.mark_completed("nope"), Err(MissionError::UnknownTaskId(_))));
    assert!(matches!(g.mark_failed("nope"), Err(MissionError::UnknownTaskId(_))));
}

#[test]
fn second_resolution_is_a_no_op_in_idempotent_mode() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("A", 1.0), &[])?;
    g.add_task(move_task("B", 2.0), &["A"])?;

    assert_eq!(g.mark_completed("A")?, vec!["B"]);
    assert!(g.mark_completed("A")?.is_empty());
    g.mark_failed("A")?;

    assert_eq!(g.get_task("A")?.outcome(), TaskOutcome::Completed);
    assert!(g.completed_tasks().contains("A"));
    assert!(!g.failed_tasks().contains("A"));
    assert!(!g.pending_tasks().contains("A"));
    Ok(())
}

#[test]
fn second_resolution_errors_in_strict_mode() -> TestResult {
    let mut g = TaskGraph::with_mode(ResolutionMode::Strict);
    g.add_task(move_task("A", 1.0), &[])?;
    g.mark_failed("A")?;

    assert!(matches!(g.mark_completed("A"), Err(MissionError::AlreadyResolved(_))));
    assert!(matches!(g.mark_failed("A"), Err(MissionError::AlreadyResolved(_))));
    assert_eq!(g.get_status().failed, vec!["A"]);
    assert!(g.completed_tasks().is_empty());
    Ok(())
}

#[test]
fn failure_leaves_dependents_blocked_and_graph_stalled() -> TestResult {
    let mut g = diamond()?;
    g.mark_completed("A")?;
    g.mark_failed("B")?;
    g.mark_completed("C")?;

    assert!(!g.pending_tasks().contains("D"));
    assert_eq!(g.blocked_tasks(), vec!["D"]);
    assert!(g.is_stalled());
    assert!(g.is_idle());
    Ok(())
}

#[test]
fn cascade_failure_fails_transitive_dependents() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("A", 1.0), &[])?;
    g.add_task(move_task("B", 2.0), &["A"])?;
    g.add_task(move_task("C", 3.0), &["B"])?;
    g.add_task(move_task("Other", 4.0), &[])?;

    g.mark_failed("A")?;
    let mut cascaded = g.cascade_failure("A");
    cascaded.sort();
    assert_eq!(cascaded, vec!["B", "C"]);

    let status = g.get_status();
    assert_eq!(status.failed, vec!["A", "B", "C"]);
    assert_eq!(status.pending, vec!["Other"]);
    assert!(g.blocked_tasks().is_empty());
    assert!(!g.is_stalled());
    Ok(())
}

#[test]
fn cascade_skips_already_resolved_dependents() -> TestResult {
    let mut g = TaskGraph::new();
    g.add_task(move_task("A", 1.0), &[])?;
    g.add_task(move_task("B", 2.0), &["A"])?;
    g.mark_completed("A")?;
    g.mark_completed("B")?;

    assert!(g.cascade_failure("A").is_empty());
    assert_eq!(g.get_status().completed, vec!["A", "B"]);
    Ok(())
}

#[test]
fn clear_all_resets_and_ids_are_reusable() -> TestResult {
    let mut g = diamond()?;
    g.mark_completed("A")?;
    g.mark_failed("B")?;
    assert_eq!(g.generation(), 0);

    g.clear_all();
    assert_eq!(g.generation(), 1);
    assert!(g.get_status().is_empty());
    assert!(g.is_empty());
    assert!(g.blocked_tasks().is_empty());

    g.add_task(move_task("A", 1.0), &[])?;
    g.add_task(timer_task("B", 1.0), &["A"])?;
    assert_eq!(g.get_status().pending, vec!["A"]);
    assert_eq!(g.blocked_tasks(), vec!["B"]);
    Ok(())
}

#[test]
fn timer_rejects_negative_and_non_finite_durations() {
    use missiongraph::dag::Task;

    assert!(Task::timer("t", -1.0).is_err());
    assert!(Task::timer("t", f64::NAN).is_err());
    assert!(Task::timer("t", f64::INFINITY).is_err());
    assert!(Task::timer("t", 0.0).is_ok());
}

#[test]
fn display_summarises_counts() -> TestResult {
    let mut g = diamond()?;
    g.mark_completed("A")?;
    assert_eq!(
        g.to_string(),
        "<TaskGraph | Pending: 2, Completed: 1, Failed: 0>"
    );
    Ok(())
}
