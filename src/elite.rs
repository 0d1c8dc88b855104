//! Elite local search (spec.md §4.6): five strategies run independently
//! from each elite candidate; whichever yields the best fitness (the
//! original included) replaces that elite slot.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::clamp::clamp;
use crate::config::Parameters;
use crate::domain::{Candidate, NodeSet, TaskId, Workflow};
use crate::evaluator;
use crate::kernels;
use crate::operators::critical_tasks;
use crate::repair;
use crate::scoring;

const TIME_OPTIMIZATION_OFFSETS: [f64; 8] = [-5.0, -2.0, -1.0, -0.5, 0.5, 1.0, 2.0, 5.0];

/// Runs all five strategies from `candidate` and returns whichever scores
/// best, including the unmodified original if nothing improved on it.
pub fn improve(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut best = candidate.clone();

    let attempts = [
        task_swap(candidate, workflow, nodes, params, rng),
        node_migration(candidate, workflow, nodes, params, rng),
        time_optimization(candidate, workflow, nodes, params, rng),
        critical_path(candidate, workflow, nodes, params, rng),
        hybrid(candidate, workflow, nodes, params, rng),
    ];

    for attempt in attempts {
        if attempt.fitness < best.fitness {
            best = attempt;
        }
    }
    best
}

fn reevaluate(mut candidate: Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    repair::repair(&mut candidate, workflow, nodes, params, rng);
    evaluator::evaluate(&mut candidate, workflow, nodes, params, rng);
    candidate
}

/// Strategy 1, Task Swap: up to 10 random task-pair swaps, each kept
/// only if it strictly improves fitness over the best found so far.
fn task_swap(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let task_ids: Vec<TaskId> = workflow.task_ids().collect();
    let mut current = candidate.clone();
    if task_ids.len() < 2 {
        return current;
    }

    for _ in 0..10 {
        let pair: Vec<TaskId> = task_ids.choose_multiple(rng, 2).copied().collect();
        let (i, j) = (pair[0], pair[1]);

        let mut attempt = current.clone();
        let node_i = attempt.node_of(i);
        let node_j = attempt.node_of(j);
        let start_i = attempt.start_of(i);
        let start_j = attempt.start_of(j);
        if let (Some(ni), Some(nj)) = (node_i, node_j) {
            attempt.assign(i, nj);
            attempt.assign(j, ni);
        }
        if let (Some(si), Some(sj)) = (start_i, start_j) {
            attempt.set_start(i, sj);
            attempt.set_start(j, si);
        }

        let attempt = reevaluate(attempt, workflow, nodes, params, rng);
        if attempt.fitness < current.fitness {
            current = attempt;
        }
    }
    current
}

/// Strategy 2, Node Migration: for each task, try every alternative
/// node with a re-optimized start time; keep the best.
fn node_migration(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut current = candidate.clone();

    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };
        for node in nodes.iter() {
            let mut attempt = current.clone();
            let earliest = workflow.ready_time_from_candidate(task_id, &attempt);
            let duration = kernels::duration(task, node);
            let start = reoptimized_start(earliest, task.deadline, duration);

            attempt.assign(task_id, node.id);
            attempt.set_start(task_id, start);

            let attempt = reevaluate(attempt, workflow, nodes, params, rng);
            if attempt.fitness < current.fitness {
                current = attempt;
            }
        }
    }
    current
}

/// Strategy 3, Time Optimization: for each task, try the eight
/// documented offsets and keep whichever is feasible and improves
/// fitness.
fn time_optimization(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut current = candidate.clone();

    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };
        let Some(node_id) = current.node_of(task_id) else { continue };
        let Some(node) = nodes.get(node_id) else { continue };
        let duration = kernels::duration(task, node);
        let ready = workflow.ready_time_from_candidate(task_id, &current);
        let base_start = current.start_of(task_id).unwrap_or(ready);

        for offset in TIME_OPTIMIZATION_OFFSETS {
            let candidate_start = base_start + offset;
            let dependency_feasible = candidate_start >= ready;
            let deadline_feasible = candidate_start + duration <= task.deadline;
            if !dependency_feasible || !deadline_feasible {
                continue;
            }

            let mut attempt = current.clone();
            attempt.set_start(task_id, candidate_start);
            let attempt = reevaluate(attempt, workflow, nodes, params, rng);
            if attempt.fitness < current.fitness {
                current = attempt;
            }
        }
    }
    current
}

/// Strategy 4, Critical-Path: snap every critical task to its
/// most-suitable node and feasibility-constrained start time.
fn critical_path(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut current = candidate.clone();

    for task_id in critical_tasks(workflow, nodes, params) {
        let Some(task) = workflow.get(task_id) else { continue };
        let earliest = workflow.ready_time_from_candidate(task_id, &current);
        let node_id = scoring::most_suitable_node(task, nodes, earliest, params.penalty_m);
        let node = nodes.get(node_id).expect("most_suitable_node returns a live node");
        let duration = kernels::duration(task, node);
        let start = reoptimized_start(earliest, task.deadline, duration);

        let mut attempt = current.clone();
        attempt.assign(task_id, node_id);
        attempt.set_start(task_id, start);

        let attempt = reevaluate(attempt, workflow, nodes, params, rng);
        if attempt.fitness < current.fitness {
            current = attempt;
        }
    }
    current
}

/// Strategy 5, Hybrid: up to 3 iterations of Task Swap then Time
/// Optimization, accepting only on strict improvement each iteration.
fn hybrid(candidate: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut current = candidate.clone();
    for _ in 0..3 {
        let swapped = task_swap(&current, workflow, nodes, params, rng);
        let tuned = time_optimization(&swapped, workflow, nodes, params, rng);
        if tuned.fitness < current.fitness {
            current = tuned;
        } else {
            break;
        }
    }
    current
}

/// `clamp(earliestFromParents, deadline-duration, earliestFromParents)`,
/// the earliest feasible slot (spec.md §4.6).
fn reoptimized_start(earliest: f64, deadline: f64, duration: f64) -> f64 {
    clamp(earliest, earliest, deadline - duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, Task};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn workflow() -> Workflow {
        Workflow::from_tasks(vec![Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0), Task::new(2, 1000.0, 10.0, 0.0, 1, 5.0)]).unwrap()
    }

    fn nodes() -> NodeSet {
        NodeSet::new(vec![
            Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 1.0, 0.0, 0.0, 0.0, 0.1),
            Node::new(2, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.1),
        ])
    }

    #[test]
    fn improve_never_makes_fitness_worse() {
        let wf = workflow();
        let nodes = nodes();
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut candidate = Candidate::new();
        candidate.assign(1, 1);
        candidate.set_start(1, 0.0);
        candidate.assign(2, 1);
        candidate.set_start(2, 1.0);
        evaluator::evaluate(&mut candidate, &wf, &nodes, &params, &mut rng);

        let improved = improve(&candidate, &wf, &nodes, &params, &mut rng);
        assert!(improved.fitness <= candidate.fitness + 1e-9);
    }
}
