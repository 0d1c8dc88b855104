//! The caller-facing [`SchedulingResult`] (spec.md §6). Plain data: the
//! scheduler fills it once from the chosen Candidate and never mutates
//! it afterward.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, NodeId, NodeSet, TaskId, Workflow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub assignment: HashMap<TaskId, NodeId>,
    pub start_time: HashMap<TaskId, f64>,
    pub total_cost: f64,
    pub makespan: f64,
    pub deadline_hit_rate: f64,
    pub total_energy: f64,
    pub avg_latency: f64,
    pub fog_utilization: f64,
    pub cloud_utilization: f64,
    /// Count of candidates whose fitness was the [`crate::config::UNSCHEDULABLE`]
    /// sentinel at any point during the search (spec.md §7 *Unschedulable*).
    pub sentinel_hits: u64,
    /// Count of per-candidate arithmetic faults absorbed by a fallback
    /// candidate during the search (spec.md §7 *OperatorFault*).
    pub operator_faults: u64,
}

/// Builds the caller-facing result from the winning Candidate, deriving
/// the caller-side metrics documented in spec.md §6.
pub fn finalize(best: &Candidate, workflow: &Workflow, nodes: &NodeSet, sentinel_hits: u64, operator_faults: u64) -> SchedulingResult {
    let mut assignment = HashMap::with_capacity(workflow.len());
    let mut start_time = HashMap::with_capacity(workflow.len());
    for task_id in workflow.task_ids() {
        if let Some(node_id) = best.node_of(task_id) {
            assignment.insert(task_id, node_id);
        }
        if let Some(start) = best.start_of(task_id) {
            start_time.insert(task_id, start);
        }
    }

    let task_count = workflow.len().max(1) as f64;
    let deadline_hit_rate = 1.0 - best.missed_deadlines as f64 / task_count;

    let fog_node_ids: std::collections::HashSet<NodeId> = nodes.fog_nodes().map(|n| n.id).collect();
    let cloud_node_ids: std::collections::HashSet<NodeId> = nodes.cloud_nodes().map(|n| n.id).collect();

    let mut fog_busy = 0.0;
    let mut cloud_busy = 0.0;
    let mut latency_sum = 0.0;
    let mut latency_count = 0usize;

    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };
        let (Some(node_id), Some(start), Some(finish)) = (best.node_of(task_id), best.start_of(task_id), best.finish_of(task_id))
        else {
            continue;
        };
        let _ = task;
        let duration = (finish - start).max(0.0);
        if fog_node_ids.contains(&node_id) {
            fog_busy += duration;
            if let Some(node) = nodes.get(node_id) {
                latency_sum += node.latency_ms;
                latency_count += 1;
            }
        } else if cloud_node_ids.contains(&node_id) {
            cloud_busy += duration;
        }
    }

    let fog_count = fog_node_ids.len().max(1) as f64;
    let cloud_count = cloud_node_ids.len().max(1) as f64;
    let makespan_floor = best.makespan.max(1e-9);

    SchedulingResult {
        assignment,
        start_time,
        total_cost: best.cost,
        makespan: best.makespan,
        deadline_hit_rate,
        total_energy: best.energy,
        avg_latency: if latency_count > 0 { latency_sum / latency_count as f64 } else { 0.0 },
        fog_utilization: fog_busy / (makespan_floor * fog_count),
        cloud_utilization: cloud_busy / (makespan_floor * cloud_count),
        sentinel_hits,
        operator_faults,
    }
}
