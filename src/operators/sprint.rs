//! Sprint (exploit): pull each task toward the generation's best
//! candidate, weighted by how much better the best candidate's node
//! choice scores versus the parent's.

use rand::Rng;

use crate::clamp::clamp;
use crate::domain::Candidate;
use crate::operators::OperatorContext;
use crate::scoring;

pub fn apply(parent: &Candidate, ctx: &OperatorContext, rng: &mut impl Rng) -> Candidate {
    let mut child = parent.clone();

    for task_id in ctx.workflow.task_ids() {
        if !rng.random_bool(ctx.params.sprint_intensity) {
            continue;
        }
        let Some(task) = ctx.workflow.get(task_id) else { continue };

        if let (Some(parent_node_id), Some(best_node_id)) = (child.node_of(task_id), ctx.best.node_of(task_id)) {
            if let (Some(parent_node), Some(best_node)) = (ctx.nodes.get(parent_node_id), ctx.nodes.get(best_node_id)) {
                let parent_start = child.start_of(task_id).unwrap_or(0.0);
                let best_start = ctx.best.start_of(task_id).unwrap_or(0.0);
                let parent_score = scoring::node_score(task, parent_node, parent_start, ctx.params.penalty_m);
                let best_score = scoring::node_score(task, best_node, best_start, ctx.params.penalty_m);

                let velocity = clamp(0.5 + (parent_score - best_score) / parent_score, 0.1, 0.95);
                if rng.random_bool(velocity) {
                    child.assign(task_id, best_node_id);
                }
            }
        }

        if let Some(best_start) = ctx.best.start_of(task_id) {
            let current = child.start_of(task_id).unwrap_or(0.0);
            let moved = current + 0.6 * (best_start - current);
            child.set_start(task_id, moved.max(0.0));
        }
    }
    child
}
