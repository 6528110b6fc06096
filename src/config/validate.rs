// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PlanFile, RawPlanFile, TargetConfig};
use crate::errors::{MissionError, Result};

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = MissionError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_plan(&raw)?;
        Ok(PlanFile::new_unchecked(raw.config, raw.target))
    }
}

/// Run every plan check without consuming the plan.
pub fn validate_plan(plan: &RawPlanFile) -> Result<()> {
    ensure_has_targets(plan)?;
    validate_global_config(plan)?;
    for (name, target) in plan.target.iter() {
        validate_target(name, target)?;
        validate_task_dependencies(name, target)?;
        validate_dag(name, target)?;
    }
    Ok(())
}

fn ensure_has_targets(plan: &RawPlanFile) -> Result<()> {
    if plan.target.is_empty() {
        return Err(MissionError::ConfigError(
            "plan must contain at least one [target.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(plan: &RawPlanFile) -> Result<()> {
    let hz = plan.config.loop_freq_hz;
    if !(hz.is_finite() && hz > 0.0) {
        return Err(MissionError::ConfigError(format!(
            "[config].loop_freq_hz must be a positive number (got {hz})"
        )));
    }
    Ok(())
}

fn validate_target(name: &str, target: &TargetConfig) -> Result<()> {
    target.latency().map_err(|e| {
        MissionError::ConfigError(format!("target '{name}' has an invalid latency: {e}"))
    })?;

    for (id, task) in target.task.iter() {
        // Shape errors (both/neither of command and timer, bad timer) come
        // straight from task construction.
        task.to_task(id, name)?;
    }
    Ok(())
}

fn validate_task_dependencies(name: &str, target: &TargetConfig) -> Result<()> {
    for (id, task) in target.task.iter() {
        for dep in task.after.iter() {
            if dep == id {
                return Err(MissionError::ConfigError(format!(
                    "task '{id}' on target '{name}' cannot depend on itself in `after`"
                )));
            }
            if !target.task.contains_key(dep) {
                return Err(MissionError::ConfigError(format!(
                    "task '{id}' on target '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(name: &str, target: &TargetConfig) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in target.task.keys() {
        graph.add_node(id.as_str());
    }

    for (id, task) in target.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(MissionError::DagCycle(format!(
            "cycle detected in plan for target '{name}' involving task '{}'",
            cycle.node_id()
        ))),
    }
}
