//! Outer placement search (spec.md §4.7): an evolutionary search over
//! which fog nodes are active, reusing the same operator/elite shape as
//! the inner scheduler but over a [`PlacementVector`] genome. Cloud
//! nodes are always implicitly active and excluded from the bit vector.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::Parameters;
use crate::domain::{NodeSet, PlacementVector};
use crate::rng::rng_for;

/// Runs the outer search and returns the best [`PlacementVector`] found,
/// i.e. the set of fog nodes that should remain active for the inner
/// scheduler.
pub fn search(nodes: &NodeSet, params: &Parameters) -> PlacementVector {
    let fog_ids: Vec<u64> = nodes.fog_nodes().map(|n| n.id).collect();
    if fog_ids.is_empty() {
        return PlacementVector::new(Vec::new(), Vec::new());
    }

    let mut population: Vec<PlacementVector> = (0..params.outer_population)
        .map(|slot| {
            let mut rng = rng_for(params.master_seed, 0, slot as u64);
            random_vector(&fog_ids, &mut rng, nodes, params)
        })
        .collect();
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

    for generation in 1..=params.outer_generations {
        let mut next = Vec::with_capacity(population.len());
        next.push(population[0].clone());

        for slot in 1..population.len() {
            let mut rng = rng_for(params.master_seed, generation as u64, slot as u64);
            let parent = tournament_select(&population, &mut rng);
            let mut child = mutate(parent, &mut rng);
            child.repair_min_active();
            evaluate(&mut child, nodes, params);
            next.push(child);
        }
        next.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let mut rng = rng_for(params.master_seed, generation as u64, population.len() as u64);
        next[0] = hill_climb(&next[0], nodes, params, &mut rng);
        next.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        population = next;
    }

    population.into_iter().next().expect("outer_population > 0 validated by caller")
}

fn random_vector(fog_ids: &[u64], rng: &mut impl Rng, nodes: &NodeSet, params: &Parameters) -> PlacementVector {
    let active: Vec<bool> = fog_ids.iter().map(|_| rng.random_bool(0.5)).collect();
    let mut vector = PlacementVector::new(fog_ids.to_vec(), active);
    vector.repair_min_active();
    evaluate(&mut vector, nodes, params);
    vector
}

fn tournament_select<'a>(population: &'a [PlacementVector], rng: &mut impl Rng) -> &'a PlacementVector {
    let draw: Vec<&PlacementVector> = population.choose_multiple(rng, 3.min(population.len())).collect();
    draw.into_iter().min_by(|a, b| a.fitness.total_cmp(&b.fitness)).expect("population is non-empty")
}

/// Flips each bit independently with low probability, mirroring the
/// inner search's Random-Jump operator at genome scale.
fn mutate(parent: &PlacementVector, rng: &mut impl Rng) -> PlacementVector {
    let mut child = parent.clone();
    for i in 0..child.len() {
        if rng.random_bool(0.1) {
            child.flip(i);
        }
    }
    child
}

/// Single-bit hill-climb: flip each bit once, keep the flip only if it
/// strictly improves fitness, matching the elite local search's
/// accept-on-strict-improvement discipline (spec.md §4.6).
fn hill_climb(candidate: &PlacementVector, nodes: &NodeSet, params: &Parameters, _rng: &mut impl Rng) -> PlacementVector {
    let mut current = candidate.clone();
    for i in 0..current.len() {
        let mut attempt = current.clone();
        attempt.flip(i);
        attempt.repair_min_active();
        evaluate(&mut attempt, nodes, params);
        if attempt.fitness < current.fitness {
            current = attempt;
        }
    }
    current
}

fn evaluate(vector: &mut PlacementVector, nodes: &NodeSet, params: &Parameters) {
    vector.fitness = placement_fitness(vector, nodes, params);
}

/// `0.6*avgLatencyOfActiveFog + 0.4*deployCost`, where
/// `deployCost = sum(100 + 3600*costPerSec)` over active fog nodes
/// (spec.md §4.7). Exposed alongside [`search`] so callers can score a
/// `PlacementVector` without re-running the search.
pub fn placement_fitness(vector: &PlacementVector, nodes: &NodeSet, params: &Parameters) -> f64 {
    let active: Vec<_> = vector.active_ids().filter_map(|id| nodes.get(id)).collect();

    let avg_latency = if active.is_empty() { 0.0 } else { active.iter().map(|n| n.latency_ms).sum::<f64>() / active.len() as f64 };

    let deploy_cost: f64 = active.iter().map(|n| 100.0 + 3600.0 * n.cost_per_sec).sum();

    params.latency_weight * avg_latency + params.deploy_cost_weight * deploy_cost
}
