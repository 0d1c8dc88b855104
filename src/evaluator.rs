//! Deterministic fitness evaluation (spec.md §4.2). Mutates a
//! Candidate's cached cost/energy/makespan/missed-deadline/fitness
//! fields and returns the composite fitness.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{Parameters, UNSCHEDULABLE};
use crate::domain::{Candidate, NodeSet, Workflow};
use crate::kernels;

/// Evaluates `candidate` against `workflow`/`nodes`, mutating its cached
/// fields in place and returning the resulting composite fitness.
///
/// Also acts as a validator: any task missing an assignment or start
/// time is given a fallback (random fog node if one exists, otherwise
/// any node; start time 0), so a Candidate returned from this function
/// always satisfies the post-repair completeness invariant, even if it
/// was never run through the repair state machine.
pub fn evaluate(candidate: &mut Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) -> f64 {
    let mut available: HashMap<u64, f64> = nodes.ids().map(|id| (id, 0.0)).collect();
    let mut finish_times: HashMap<u64, f64> = HashMap::with_capacity(workflow.len());

    let mut total_cost = 0.0;
    let mut total_energy = 0.0;
    let mut missed = 0usize;
    let mut makespan = 0.0_f64;

    for &task_id in workflow.topo_order() {
        let task = match workflow.get(task_id) {
            Some(t) => t,
            None => continue,
        };

        let mut node_id = candidate.node_of(task_id);
        if node_id.is_none_or(|id| !nodes.contains(id)) {
            let fallback = fallback_node_id(nodes, rng);
            candidate.assign(task_id, fallback);
            if candidate.start_of(task_id).is_none() {
                candidate.set_start(task_id, 0.0);
            }
            node_id = Some(fallback);
        }
        let node_id = node_id.expect("fallback guarantees a node id");

        let requested_start = candidate.start_of(task_id).unwrap_or(0.0);
        let node = match nodes.get(node_id) {
            Some(n) => n,
            None => {
                // Should be unreachable after the fallback above, but the
                // evaluator never raises: record an unschedulable task
                // and move on rather than panic.
                log::warn!("task {task_id} assigned to unknown node {node_id}; marking unschedulable");
                candidate.set_finish(task_id, requested_start + UNSCHEDULABLE);
                finish_times.insert(task_id, requested_start + UNSCHEDULABLE);
                total_cost += UNSCHEDULABLE;
                missed += 1;
                continue;
            }
        };

        let ready = workflow.ready_time(task_id, &finish_times);
        let node_available = available.get(&node_id).copied().unwrap_or(0.0);
        let earliest = requested_start.max(node_available).max(ready);

        let dur = kernels::duration(task, node);
        let finish = if dur >= UNSCHEDULABLE { UNSCHEDULABLE } else { earliest + dur };

        candidate.set_start(task_id, earliest);
        candidate.set_finish(task_id, finish);
        finish_times.insert(task_id, finish);

        total_cost += kernels::cost(node, dur);
        total_energy += kernels::energy(task, node);

        if finish > task.deadline {
            missed += 1;
            total_cost += kernels::penalty(finish, task.deadline, params.penalty_m);
        }

        available.insert(node_id, finish);
        makespan = makespan.max(finish);
    }

    candidate.cost = total_cost;
    candidate.energy = total_energy;
    candidate.makespan = makespan;
    candidate.missed_deadlines = missed;
    candidate.fitness = total_cost;
    total_cost
}

fn fallback_node_id(nodes: &NodeSet, rng: &mut impl Rng) -> u64 {
    let fog: Vec<u64> = nodes.fog_nodes().map(|n| n.id).collect();
    if let Some(&id) = fog.choose(rng) {
        return id;
    }
    let all: Vec<u64> = nodes.ids().collect();
    *all.choose(rng).expect("NodeSet is non-empty; EmptyNodeSet is checked before scheduling")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, Task};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn chain_workflow() -> Workflow {
        let mut t1 = Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0);
        t1.children = vec![2];
        let mut t2 = Task::new(2, 1000.0, 10.0, 0.0, 1, 5.0);
        t2.parents = vec![1];
        t2.children = vec![3];
        let mut t3 = Task::new(3, 1000.0, 10.0, 0.0, 1, 5.0);
        t3.parents = vec![2];
        Workflow::from_tasks(vec![t1, t2, t3]).unwrap()
    }

    fn two_nodes() -> NodeSet {
        NodeSet::new(vec![
            Node::new(100, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
            Node::new(200, 500.0, 1024.0, 1000.0, 1024.0, false, 0.05, 0.0, 0.0, 0.0, 0.01),
        ])
    }

    #[test]
    fn serializes_chain_on_single_node_with_start_times_stacking() {
        let wf = chain_workflow();
        let nodes = two_nodes();
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut candidate = Candidate::new();
        for id in [1, 2, 3] {
            candidate.assign(id, 100);
            candidate.set_start(id, 0.0);
        }

        evaluate(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert_eq!(candidate.start_of(1), Some(0.0));
        assert_eq!(candidate.finish_of(1), Some(1.0));
        assert_eq!(candidate.start_of(2), Some(1.0));
        assert_eq!(candidate.finish_of(3), Some(3.0));
        assert_eq!(candidate.makespan, 3.0);
        assert_eq!(candidate.missed_deadlines, 0);
    }

    #[test]
    fn missing_assignment_gets_fallback() {
        let wf = chain_workflow();
        let nodes = two_nodes();
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut candidate = Candidate::new();
        evaluate(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert!(candidate.is_assigned(1));
        assert!(candidate.is_assigned(2));
        assert!(candidate.is_assigned(3));
    }

    #[test]
    fn deadline_miss_adds_penalty_into_cost() {
        let mut t = Task::new(1, 10000.0, 10.0, 0.0, 1, 0.5);
        let wf = Workflow::from_tasks(vec![{
            t.parents.clear();
            t.clone()
        }])
        .unwrap();
        let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01)]);
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut candidate = Candidate::new();
        candidate.assign(1, 1);
        candidate.set_start(1, 0.0);
        evaluate(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert_eq!(candidate.missed_deadlines, 1);
        assert!(candidate.fitness >= params.penalty_m * 9.5);
    }
}
