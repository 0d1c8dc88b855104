//! The four evolutionary movement operators (spec.md §4.4) behind a
//! single tagged dispatch, plus the shared exploration-rate/diversity
//! machinery and 3-way tournament selection used by the generation loop.

pub mod ambush;
pub mod random_jump;
pub mod social_forage;
pub mod sprint;

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{Parameters, UNSCHEDULABLE};
use crate::domain::{Candidate, NodeId, NodeSet, TaskId, Workflow};
use crate::kernels;

/// The four operators, tagged rather than trait objects (spec.md §9
/// "Dynamic dispatch over operators").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    RandomJump,
    SocialForage,
    Ambush,
    Sprint,
}

impl Operator {
    pub fn is_exploration(self) -> bool {
        matches!(self, Operator::RandomJump | Operator::SocialForage)
    }
}

/// The centroid of the current elite window: for each task, the modal
/// node choice and the mean start time across the elite (spec.md §4.4
/// Social-Forage).
pub struct Centroid {
    pub modal_node: HashMap<TaskId, NodeId>,
    pub mean_start: HashMap<TaskId, f64>,
}

pub fn compute_centroid(elite: &[Candidate], task_ids: impl Iterator<Item = TaskId>) -> Centroid {
    let mut modal_node = HashMap::new();
    let mut mean_start = HashMap::new();

    for task_id in task_ids {
        let mut counts: HashMap<NodeId, usize> = HashMap::new();
        let mut sum = 0.0;
        let mut n = 0usize;
        for candidate in elite {
            if let Some(node_id) = candidate.node_of(task_id) {
                *counts.entry(node_id).or_insert(0) += 1;
            }
            if let Some(start) = candidate.start_of(task_id) {
                sum += start;
                n += 1;
            }
        }
        if let Some((&node_id, _)) = counts.iter().max_by_key(|&(&id, &count)| (count, std::cmp::Reverse(id))) {
            modal_node.insert(task_id, node_id);
        }
        if n > 0 {
            mean_start.insert(task_id, sum / n as f64);
        }
    }
    Centroid { modal_node, mean_start }
}

/// Read-only context operators need: the frozen previous-generation
/// elite/best (spec.md §5: "the previous-generation elite set, not the
/// partially updated next generation"), plus the static problem inputs.
pub struct OperatorContext<'a> {
    pub workflow: &'a Workflow,
    pub nodes: &'a NodeSet,
    pub params: &'a Parameters,
    pub centroid: &'a Centroid,
    pub best: &'a Candidate,
}

pub fn apply(operator: Operator, parent: &Candidate, ctx: &OperatorContext, rng: &mut impl Rng) -> Candidate {
    match operator {
        Operator::RandomJump => random_jump::apply(parent, ctx, rng),
        Operator::SocialForage => social_forage::apply(parent, ctx, rng),
        Operator::Ambush => ambush::apply(parent, ctx, rng),
        Operator::Sprint => sprint::apply(parent, ctx, rng),
    }
}

/// 3-way tournament: draw 3 candidates uniformly and keep the fittest.
pub fn tournament_select<'a>(population: &'a [Candidate], rng: &mut impl Rng) -> &'a Candidate {
    let draw: Vec<&Candidate> = population.choose_multiple(rng, 3.min(population.len())).collect();
    draw.into_iter().min_by(|a, b| a.fitness.total_cmp(&b.fitness)).expect("population is non-empty")
}

/// Normalized average pairwise distance across the population (spec.md
/// §4.4 diversity `d`). Distances are the per-task node-mismatch +
/// clamped start-time-delta metric from [`Candidate::distance_to`],
/// normalized by task count and by the number of pairs compared.
pub fn diversity(population: &[Candidate], workflow: &Workflow) -> f64 {
    if population.len() < 2 {
        return 0.0;
    }
    let task_count = workflow.len().max(1) as f64;
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..population.len() {
        for j in (i + 1)..population.len() {
            total += population[i].distance_to(&population[j], workflow.task_ids()) / task_count;
            pairs += 1;
        }
    }
    if pairs == 0 {
        return 0.0;
    }
    (total / pairs as f64).clamp(0.0, 1.0)
}

/// `1 - bestFitness / (10*M)`, clipped to `[0,1]` (spec.md §4.4
/// intensification `i`).
pub fn intensification(best_fitness: f64, penalty_m: f64) -> f64 {
    if !best_fitness.is_finite() || penalty_m <= 0.0 {
        return 1.0;
    }
    (1.0 - best_fitness / (10.0 * penalty_m)).clamp(0.0, 1.0)
}

/// Exploration rate `e` for the current generation (spec.md §4.4),
/// clamped to `[0.1, 0.8]` before the diversity/intensification
/// adjustment, then clamped again after.
pub fn exploration_rate(generation: usize, max_generations: usize, diversity: f64, intensification: f64) -> f64 {
    let base = if max_generations == 0 { 0.1 } else { 1.0 - generation as f64 / max_generations as f64 };
    let mut e = base.clamp(0.1, 0.8);

    if diversity < 0.3 && intensification > 0.7 {
        e += 0.3;
    } else if diversity > 0.7 && intensification < 0.3 {
        e -= 0.2;
    }
    e.clamp(0.1, 0.8)
}

/// Critical tasks (glossary): minimum possible execution time exceeds
/// 50% of the deadline, or more than two dependency parents. Capped at
/// 30% of task count (the most critical by ratio, first).
pub fn critical_tasks(workflow: &Workflow, nodes: &NodeSet, params: &Parameters) -> Vec<TaskId> {
    let mut ranked: Vec<(TaskId, f64)> = Vec::new();
    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };
        let min_exec = nodes.iter().map(|n| kernels::exec_time(task, n)).fold(UNSCHEDULABLE, f64::min);
        let ratio = if task.deadline > 0.0 && min_exec < UNSCHEDULABLE { min_exec / task.deadline } else { 1.0 };
        let is_critical = ratio > 0.5 || task.parents.len() > 2;
        if is_critical {
            ranked.push((task_id, ratio));
        }
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let cap = ((workflow.len() as f64) * params.crit_task_cap).round() as usize;
    ranked.truncate(cap);
    ranked.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, Task};

    fn workflow_with_parents() -> Workflow {
        let mut child = Task::new(4, 1000.0, 10.0, 0.0, 1, 100.0);
        child.parents = vec![1, 2, 3];
        Workflow::from_tasks(vec![
            Task::new(1, 10.0, 1.0, 0.0, 1, 1000.0),
            Task::new(2, 10.0, 1.0, 0.0, 1, 1000.0),
            Task::new(3, 10.0, 1.0, 0.0, 1, 1000.0),
            child,
        ])
        .unwrap()
    }

    #[test]
    fn exploration_rate_clamped_to_bounds() {
        assert!(exploration_rate(0, 200, 0.5, 0.5) <= 0.8);
        assert!(exploration_rate(200, 200, 0.5, 0.5) >= 0.1);
    }

    #[test]
    fn low_diversity_and_high_intensification_forces_exploration_up() {
        let low_d = exploration_rate(199, 200, 0.1, 0.9);
        assert!(low_d > 0.1);
    }

    #[test]
    fn task_with_many_parents_is_critical() {
        let wf = workflow_with_parents();
        let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01)]);
        let params = Parameters::default();
        let critical = critical_tasks(&wf, &nodes, &params);
        assert!(critical.contains(&4));
    }
}
