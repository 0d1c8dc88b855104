//! Ambush (exploit): re-target critical tasks onto the node minimizing
//! `cost + 100*duration/deadline`, re-optimize their start time, and
//! lightly jitter non-critical tasks.

use rand::Rng;

use crate::clamp::clamp;
use crate::config::UNSCHEDULABLE;
use crate::domain::{Candidate, NodeId, TaskId};
use crate::kernels;
use crate::operators::{OperatorContext, critical_tasks};

pub fn apply(parent: &Candidate, ctx: &OperatorContext, rng: &mut impl Rng) -> Candidate {
    let mut child = parent.clone();
    let critical = critical_tasks(ctx.workflow, ctx.nodes, ctx.params);
    let critical_set: std::collections::HashSet<TaskId> = critical.into_iter().collect();

    for &task_id in ctx.workflow.topo_order() {
        let Some(task) = ctx.workflow.get(task_id) else { continue };
        if critical_set.contains(&task_id) {
            let ready = ctx.workflow.ready_time_from_candidate(task_id, &child);
            let node_id = ambush_best_node(task_id, ctx, &child);
            let node = ctx.nodes.get(node_id).expect("ambush_best_node returns a live node");
            let duration = kernels::duration(task, node);

            let current_start = child.start_of(task_id).unwrap_or(0.0);
            let new_start = clamp(current_start, ready, task.deadline - duration);

            child.assign(task_id, node_id);
            child.set_start(task_id, new_start);
            child.set_finish(task_id, new_start + duration);
        } else if rng.random_bool(0.3) {
            let perturbed = child.start_of(task_id).unwrap_or(0.0) + rng.random_range(-2.5..2.5);
            child.set_start(task_id, perturbed.max(0.0));
        }
    }
    child
}

fn ambush_best_node(task_id: TaskId, ctx: &OperatorContext, candidate: &Candidate) -> NodeId {
    let task = ctx.workflow.get(task_id).expect("caller holds a valid task id");
    ctx.nodes
        .iter()
        .min_by(|a, b| ambush_score(task, a, candidate).total_cmp(&ambush_score(task, b, candidate)))
        .map(|n| n.id)
        .expect("NodeSet is non-empty")
}

fn ambush_score(task: &crate::domain::Task, node: &crate::domain::Node, _candidate: &Candidate) -> f64 {
    let duration = kernels::duration(task, node);
    if duration >= UNSCHEDULABLE || task.deadline <= 0.0 {
        return UNSCHEDULABLE;
    }
    kernels::cost(node, duration) + 100.0 * duration / task.deadline
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::Parameters;
    use crate::domain::{Node, NodeSet, Task, Workflow};
    use crate::operators::Centroid;

    #[test]
    fn apply_retargets_a_critical_task_onto_the_cheaper_fast_node() {
        let critical = Task::new(1, 10000.0, 10.0, 0.0, 1, 1.0);
        let wf = Workflow::from_tasks(vec![critical]).unwrap();
        let nodes = NodeSet::new(vec![
            Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.5, 0.0, 0.0, 0.0, 0.01),
            Node::new(2, 10000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
        ]);
        let params = Parameters::default();

        let mut parent = Candidate::new();
        parent.assign(1, 1);
        parent.set_start(1, 0.0);
        let best = parent.clone();
        let centroid = Centroid { modal_node: Default::default(), mean_start: Default::default() };
        let ctx = OperatorContext { workflow: &wf, nodes: &nodes, params: &params, centroid: &centroid, best: &best };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let child = apply(&parent, &ctx, &mut rng);

        assert_eq!(child.node_of(1), Some(2), "the slow task should move onto the fast node that clears the deadline cheaply");
    }
}
