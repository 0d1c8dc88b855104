//! Initialization ensemble (spec.md §4.3): four equal quartiles,
//! Random, Greedy, Opposition, Hybrid, each repaired before the whole
//! population is evaluated, sorted, and truncated to `PopulationSize`.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::Parameters;
use crate::domain::{Candidate, NodeId, NodeSet, Population, TaskId, Workflow};
use crate::evaluator;
use crate::repair;
use crate::rng::rng_for;
use crate::scoring;

pub fn initialize_population(workflow: &Workflow, nodes: &NodeSet, params: &Parameters) -> Population {
    let quartile = params.population_size.div_ceil(4);
    let mut population = Population::new(Vec::with_capacity(quartile * 4));
    let mut slot: u64 = 0;

    for _ in 0..quartile {
        let mut rng = rng_for(params.master_seed, 0, slot);
        slot += 1;
        let mut candidate = random_candidate(workflow, nodes, &mut rng);
        repair::repair(&mut candidate, workflow, nodes, params, &mut rng);
        population.push(candidate);
    }

    for _ in 0..quartile {
        let mut rng = rng_for(params.master_seed, 0, slot);
        slot += 1;
        let mut candidate = greedy_candidate(workflow, nodes, params);
        repair::repair(&mut candidate, workflow, nodes, params, &mut rng);
        population.push(candidate);
    }

    for _ in 0..quartile {
        let mut rng = rng_for(params.master_seed, 0, slot);
        slot += 1;
        if population.is_empty() {
            continue;
        }
        let base_index = rng.random_range(0..population.len());
        let base = population.as_slice()[base_index].clone();
        let mut candidate = opposition_candidate(&base, workflow, nodes, params);
        repair::repair(&mut candidate, workflow, nodes, params, &mut rng);
        population.push(candidate);
    }

    for _ in 0..quartile {
        let mut rng = rng_for(params.master_seed, 0, slot);
        slot += 1;
        let mut candidate = hybrid_candidate(workflow, nodes, params, &mut rng);
        repair::repair(&mut candidate, workflow, nodes, params, &mut rng);
        population.push(candidate);
    }

    let mut candidates = population.into_vec();
    for (i, candidate) in candidates.iter_mut().enumerate() {
        let mut rng = rng_for(params.master_seed, 0, slot + i as u64);
        evaluator::evaluate(candidate, workflow, nodes, params, &mut rng);
    }
    let mut population = Population::new(candidates);
    population.sort();
    population.truncate(params.population_size);
    population
}

/// Uniform random node choice and uniform start time in `[0, 100)`.
fn random_candidate(workflow: &Workflow, nodes: &NodeSet, rng: &mut impl Rng) -> Candidate {
    let mut candidate = Candidate::new();
    let all_ids: Vec<NodeId> = nodes.ids().collect();
    for task_id in workflow.task_ids() {
        let node_id = *all_ids.choose(rng).expect("NodeSet is non-empty");
        candidate.assign(task_id, node_id);
        candidate.set_start(task_id, rng.random_range(0.0..100.0));
    }
    candidate
}

/// Running `available[node]` greedily minimized per task in topological
/// order, picking the node minimizing [`scoring::node_score`].
fn greedy_candidate(workflow: &Workflow, nodes: &NodeSet, params: &Parameters) -> Candidate {
    let mut candidate = Candidate::new();
    let mut available: HashMap<NodeId, f64> = nodes.ids().map(|id| (id, 0.0)).collect();
    let mut finish_times: HashMap<TaskId, f64> = HashMap::new();

    for &task_id in workflow.topo_order() {
        let Some(task) = workflow.get(task_id) else { continue };
        let ready = workflow.ready_time(task_id, &finish_times);

        let node_id = nodes
            .iter()
            .min_by(|a, b| {
                let start_a = ready.max(available.get(&a.id).copied().unwrap_or(0.0));
                let start_b = ready.max(available.get(&b.id).copied().unwrap_or(0.0));
                scoring::node_score(task, a, start_a, params.penalty_m)
                    .total_cmp(&scoring::node_score(task, b, start_b, params.penalty_m))
            })
            .map(|n| n.id)
            .expect("NodeSet is non-empty");

        let start = ready.max(available.get(&node_id).copied().unwrap_or(0.0));
        let node = nodes.get(node_id).expect("node_id came from nodes.iter()");
        let dur = crate::kernels::duration(task, node);
        let finish = start + dur;

        candidate.assign(task_id, node_id);
        candidate.set_start(task_id, start);
        finish_times.insert(task_id, finish);
        available.insert(node_id, finish);
    }
    candidate
}

/// Reflects a previously generated candidate's node choice to the
/// opposite performance class and its start time across `deadline*0.8`.
fn opposition_candidate(base: &Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters) -> Candidate {
    let avg_mips = nodes.average_mips();
    let mut candidate = Candidate::new();

    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };
        let original_node_id = base.node_of(task_id);
        let original_above_average =
            original_node_id.and_then(|id| nodes.get(id)).map(|n| n.mips > avg_mips).unwrap_or(false);

        let opposite_pool: Vec<_> = if original_above_average {
            nodes.iter().filter(|n| n.mips <= avg_mips).collect()
        } else {
            nodes.iter().filter(|n| n.mips > avg_mips).collect()
        };

        let node_id = if opposite_pool.is_empty() {
            scoring::most_suitable_node(task, nodes, 0.0, params.penalty_m)
        } else {
            opposite_pool
                .iter()
                .min_by(|a, b| {
                    scoring::node_score(task, a, 0.0, params.penalty_m)
                        .total_cmp(&scoring::node_score(task, b, 0.0, params.penalty_m))
                })
                .map(|n| n.id)
                .expect("opposite_pool is non-empty")
        };

        let original_start = base.start_of(task_id).unwrap_or(0.0);
        let horizon = task.deadline * 0.8;
        let reflected_start = (horizon - original_start).clamp(0.0, horizon.max(0.0));

        candidate.assign(task_id, node_id);
        candidate.set_start(task_id, reflected_start);
    }
    candidate
}

/// 70% of tasks pick uniformly among the three best-scoring nodes; 30%
/// pick uniform random. Start time uniform in `[0, max(10, 0.6*deadline))`.
fn hybrid_candidate(workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let mut candidate = Candidate::new();
    let all_ids: Vec<NodeId> = nodes.ids().collect();

    for task_id in workflow.task_ids() {
        let Some(task) = workflow.get(task_id) else { continue };

        let node_id = if rng.random_bool(0.7) {
            let top3 = scoring::top_k_nodes(task, nodes, 0.0, params.penalty_m, 3);
            *top3.choose(rng).expect("top_k_nodes returns at least one node for a non-empty NodeSet")
        } else {
            *all_ids.choose(rng).expect("NodeSet is non-empty")
        };

        let horizon = (0.6 * task.deadline).max(10.0);
        candidate.assign(task_id, node_id);
        candidate.set_start(task_id, rng.random_range(0.0..horizon));
    }
    candidate
}
