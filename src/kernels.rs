//! Pure cost/delay functions (spec.md §4.1). No state, no I/O; every
//! function returns a non-negative finite real, substituting
//! [`crate::config::UNSCHEDULABLE`] for degenerate inputs.

use crate::config::UNSCHEDULABLE;
use crate::domain::{Node, Task};

fn guard(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 { value } else { UNSCHEDULABLE }
}

/// Execution time of `task` on `node`, in seconds.
pub fn exec_time(task: &Task, node: &Node) -> f64 {
    if node.mips <= 0.0 {
        return UNSCHEDULABLE;
    }
    guard(task.length / node.mips)
}

/// Transfer delay for `task` landing on `node`: payload transfer time
/// plus folded-in network latency.
pub fn transfer_delay(task: &Task, node: &Node) -> f64 {
    if node.bandwidth <= 0.0 || task.file_size < 0.0 {
        return UNSCHEDULABLE;
    }
    let size = task.file_size.max(1.0);
    let bandwidth = node.bandwidth.max(1.0);
    guard(size / bandwidth + node.latency_ms / 1000.0)
}

/// `execTime + transferDelay`, i.e. total wall-clock duration on `node`.
pub fn duration(task: &Task, node: &Node) -> f64 {
    let e = exec_time(task, node);
    let t = transfer_delay(task, node);
    if e >= UNSCHEDULABLE || t >= UNSCHEDULABLE {
        return UNSCHEDULABLE;
    }
    guard(e + t)
}

/// Monetary cost of occupying `node` for `duration_secs` seconds.
pub fn cost(node: &Node, duration_secs: f64) -> f64 {
    if duration_secs >= UNSCHEDULABLE {
        return UNSCHEDULABLE;
    }
    guard(duration_secs * node.cost_per_sec)
}

/// Deadline-overshoot penalty: `max(0, finish - deadline) * M`.
pub fn penalty(finish: f64, deadline: f64, penalty_m: f64) -> f64 {
    if !finish.is_finite() || !deadline.is_finite() {
        return UNSCHEDULABLE;
    }
    guard((finish - deadline).max(0.0) * penalty_m)
}

/// Energy drawn by executing `task` on `node`.
pub fn energy(task: &Task, node: &Node) -> f64 {
    let e = exec_time(task, node);
    if e >= UNSCHEDULABLE {
        return UNSCHEDULABLE;
    }
    guard(e * node.energy_per_sec)
}
