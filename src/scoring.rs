//! Shared scoring helpers used by the Initializer, Ambush, the repair
//! state machine, and the elite local search, all of them pick a node
//! for a task by the same "suitability" metric (spec.md §4.3 Greedy,
//! §4.5 Completeness/NodeMigration, §4.6 Critical-Path).

use crate::config::UNSCHEDULABLE;
use crate::domain::{Node, NodeId, NodeSet, Task};
use crate::kernels;

/// `cost(duration) + 0.1*M*max(0, finish-deadline)` for `task` landing on
/// `node` starting at `start`.
pub fn node_score(task: &Task, node: &Node, start: f64, penalty_m: f64) -> f64 {
    let dur = kernels::duration(task, node);
    if dur >= UNSCHEDULABLE {
        return UNSCHEDULABLE;
    }
    let finish = start + dur;
    let cost = kernels::cost(node, dur);
    cost + 0.1 * penalty_m * (finish - task.deadline).max(0.0)
}

/// The node minimizing [`node_score`] for `task`, starting at `start`.
pub fn most_suitable_node(task: &Task, nodes: &NodeSet, start: f64, penalty_m: f64) -> NodeId {
    nodes
        .iter()
        .min_by(|a, b| node_score(task, a, start, penalty_m).total_cmp(&node_score(task, b, start, penalty_m)))
        .map(|n| n.id)
        .expect("NodeSet is non-empty")
}

/// The node minimizing raw execution time for `task`, ignoring cost;
/// used by the Aggressive repair pass and the elite Critical-Path
/// strategy's "fastest node" step.
pub fn fastest_node(task: &Task, nodes: &NodeSet) -> NodeId {
    nodes
        .iter()
        .min_by(|a, b| kernels::exec_time(task, a).total_cmp(&kernels::exec_time(task, b)))
        .map(|n| n.id)
        .expect("NodeSet is non-empty")
}

/// The `k` nodes with the lowest [`node_score`] for `task`, ascending.
pub fn top_k_nodes(task: &Task, nodes: &NodeSet, start: f64, penalty_m: f64, k: usize) -> Vec<NodeId> {
    let mut scored: Vec<(NodeId, f64)> = nodes.iter().map(|n| (n.id, node_score(task, n, start, penalty_m))).collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.into_iter().take(k).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_suitable_prefers_cheaper_node() {
        let t = Task::new(1, 1000.0, 10.0, 0.0, 1, 100.0);
        let nodes = NodeSet::new(vec![
            Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 1.0, 0.0, 0.0, 0.0, 0.1),
            Node::new(2, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.1),
        ]);
        assert_eq!(most_suitable_node(&t, &nodes, 0.0, 1000.0), 2);
    }

    #[test]
    fn fastest_node_ignores_cost() {
        let t = Task::new(1, 1000.0, 10.0, 0.0, 1, 100.0);
        let nodes = NodeSet::new(vec![
            Node::new(1, 500.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.1),
            Node::new(2, 2000.0, 1024.0, 1000.0, 1024.0, false, 10.0, 0.0, 0.0, 0.0, 0.1),
        ]);
        assert_eq!(fastest_node(&t, &nodes), 2);
    }
}
