//! The generation loop (spec.md §2, §4.4): initializer → { select,
//! mutate, repair, evaluate } → elitism → elite local search, repeated
//! for `MaxGenerations`, then the best candidate is finalized into a
//! [`crate::api::SchedulingResult`].

use rand::Rng;

use crate::api::{SchedulingResult, result};
use crate::config::{Parameters, UNSCHEDULABLE};
use crate::domain::{Candidate, NodeSet, Population, Workflow};
use crate::elite;
use crate::error::{Error, Result};
use crate::evaluator;
use crate::initializer;
use crate::operators::{self, Operator, OperatorContext, compute_centroid, diversity, intensification, tournament_select};
use crate::repair;
use crate::rng::rng_for;

/// Runs the full Enhanced EPO-CEIS search and returns the caller-facing
/// result. This is the pure function promised by spec.md §5: its only
/// input-dependent state is `params.master_seed`.
pub fn run(workflow: &Workflow, nodes: &NodeSet, params: &Parameters) -> Result<SchedulingResult> {
    if nodes.is_empty() {
        return Err(Error::EmptyNodeSet);
    }

    let mut sentinel_hits: u64 = 0;
    let mut operator_faults: u64 = 0;

    let mut population = initializer::initialize_population(workflow, nodes, params);
    count_sentinels(&population, &mut sentinel_hits);

    for generation in 1..=params.max_generations {
        let elite_slice = population.elite(params.elite_size);
        let centroid = compute_centroid(elite_slice, workflow.task_ids());
        let best = population.best().cloned().unwrap_or_default();
        let d = diversity(population.as_slice(), workflow);
        let i = intensification(best.fitness, params.penalty_m);
        let e = operators::exploration_rate(generation, params.max_generations, d, i);

        log::debug!("generation {generation}: best_fitness={:.3} diversity={d:.3} intensification={i:.3} exploration_rate={e:.3}", best.fitness);

        let ctx = OperatorContext { workflow, nodes, params, centroid: &centroid, best: &best };

        let child_count = params.population_size.saturating_sub(params.elite_size);
        let mut children = Vec::with_capacity(child_count);
        for slot in 0..child_count {
            let mut rng = rng_for(params.master_seed, generation as u64, slot as u64);
            let parent = tournament_select(population.as_slice(), &mut rng);
            let operator = pick_operator(&mut rng, e);

            let mut child = operators::apply(operator, parent, &ctx, &mut rng);
            repair::repair(&mut child, workflow, nodes, params, &mut rng);
            evaluator::evaluate(&mut child, workflow, nodes, params, &mut rng);

            if !child.fitness.is_finite() {
                operator_faults += 1;
                log::warn!("generation {generation} slot {slot}: operator {operator:?} produced non-finite fitness, falling back to a repaired random candidate");
                child = fallback_candidate(workflow, nodes, params, &mut rng);
            }
            if child.fitness >= UNSCHEDULABLE {
                sentinel_hits += 1;
            }
            children.push(child);
        }

        // Elitism: the previous generation's elite window survives
        // unconditionally, guaranteeing bestFitness(g+1) <= bestFitness(g).
        children.extend(elite_slice.iter().cloned());
        let mut next = Population::new(children);
        next.sort();
        next.truncate(params.population_size);

        let mut candidates = next.into_vec();
        let refine_count = params.elite_size.min(candidates.len());
        for slot in 0..refine_count {
            let mut rng = rng_for(params.master_seed, generation as u64, params.population_size as u64 + slot as u64);
            candidates[slot] = elite::improve(&candidates[slot], workflow, nodes, params, &mut rng);
        }

        let mut next = Population::new(candidates);
        next.sort();
        population = next;
    }

    let best = population.best().cloned().unwrap_or_default();
    Ok(result::finalize(&best, workflow, nodes, sentinel_hits, operator_faults))
}

/// Exploration branch picks Random-Jump or Social-Forage with equal
/// probability; exploitation picks Ambush or Sprint with equal
/// probability (spec.md §4.4 "each branch picks its two operators with
/// equal probability").
fn pick_operator(rng: &mut impl Rng, exploration_rate: f64) -> Operator {
    if rng.random_bool(exploration_rate) {
        if rng.random_bool(0.5) { Operator::RandomJump } else { Operator::SocialForage }
    } else if rng.random_bool(0.5) {
        Operator::Ambush
    } else {
        Operator::Sprint
    }
}

fn fallback_candidate(workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> Candidate {
    let node_ids: Vec<u64> = nodes.ids().collect();
    let mut candidate = Candidate::new();
    for task_id in workflow.task_ids() {
        use rand::seq::IndexedRandom;
        let node_id = *node_ids.choose(rng).expect("nodes is non-empty; checked at the top of run()");
        candidate.assign(task_id, node_id);
        candidate.set_start(task_id, rng.random_range(0.0..100.0));
    }
    repair::repair(&mut candidate, workflow, nodes, params, rng);
    evaluator::evaluate(&mut candidate, workflow, nodes, params, rng);
    candidate
}

fn count_sentinels(population: &Population, sentinel_hits: &mut u64) {
    *sentinel_hits += population.as_slice().iter().filter(|c| c.fitness >= UNSCHEDULABLE).count() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, Task};

    #[test]
    fn empty_node_set_is_rejected() {
        let wf = Workflow::from_tasks(vec![Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0)]).unwrap();
        let nodes = NodeSet::new(vec![]);
        let params = Parameters::default();
        assert!(matches!(run(&wf, &nodes, &params), Err(Error::EmptyNodeSet)));
    }

    #[test]
    fn linear_chain_schedules_all_tasks_on_cheapest_feasible_node() {
        let mut t1 = Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0);
        t1.children = vec![2];
        let mut t2 = Task::new(2, 1000.0, 10.0, 0.0, 1, 5.0);
        t2.parents = vec![1];
        t2.children = vec![3];
        let mut t3 = Task::new(3, 1000.0, 10.0, 0.0, 1, 5.0);
        t3.parents = vec![2];
        let wf = Workflow::from_tasks(vec![t1, t2, t3]).unwrap();

        let nodes = NodeSet::new(vec![
            Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
            Node::new(2, 500.0, 1024.0, 1000.0, 1024.0, false, 0.05, 0.0, 0.0, 0.0, 0.01),
        ]);

        let mut params = Parameters::default();
        params.population_size = 20;
        params.max_generations = 5;
        params.elite_size = 3;

        let result = run(&wf, &nodes, &params).unwrap();
        assert_eq!(result.assignment.len(), 3);
        assert_eq!(result.deadline_hit_rate, 1.0);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let wf = Workflow::from_tasks(vec![Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0)]).unwrap();
        let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01)]);
        let mut params = Parameters::default();
        params.population_size = 10;
        params.max_generations = 3;
        params.elite_size = 2;

        let a = run(&wf, &nodes, &params).unwrap();
        let b = run(&wf, &nodes, &params).unwrap();
        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.assignment, b.assignment);
    }
}
