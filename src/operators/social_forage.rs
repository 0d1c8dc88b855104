//! Social-Forage (explore): pull a random 40% of tasks toward the
//! elite's centroid (modal node choice, mean start time).

use rand::Rng;

use crate::domain::{Candidate, TaskId};
use crate::operators::OperatorContext;

pub fn apply(parent: &Candidate, ctx: &OperatorContext, rng: &mut impl Rng) -> Candidate {
    let mut child = parent.clone();
    let task_ids: Vec<TaskId> = ctx.workflow.task_ids().collect();
    let count = (task_ids.len() as f64 * 0.4).round() as usize;

    use rand::seq::IndexedRandom;
    for &task_id in task_ids.choose_multiple(rng, count) {
        if !rng.random_bool(0.7) {
            continue;
        }
        if let Some(&node_id) = ctx.centroid.modal_node.get(&task_id) {
            child.assign(task_id, node_id);
        }
        if let Some(&mean) = ctx.centroid.mean_start.get(&task_id) {
            let jittered = mean + rng.random_range(-10.0..10.0);
            child.set_start(task_id, jittered.max(0.0));
        }
    }
    child
}
