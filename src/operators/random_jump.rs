//! Random-Jump (explore): reassign a random 20% of tasks to a uniform
//! random node and start time.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::{Candidate, TaskId};
use crate::operators::OperatorContext;

pub fn apply(parent: &Candidate, ctx: &OperatorContext, rng: &mut impl Rng) -> Candidate {
    let mut child = parent.clone();
    let task_ids: Vec<TaskId> = ctx.workflow.task_ids().collect();
    let count = (task_ids.len() as f64 * 0.2).round() as usize;
    let all_node_ids: Vec<u64> = ctx.nodes.ids().collect();

    for &task_id in task_ids.choose_multiple(rng, count) {
        if let Some(&node_id) = all_node_ids.choose(rng) {
            child.assign(task_id, node_id);
        }
        child.set_start(task_id, rng.random_range(0.0..100.0));
    }
    child
}
