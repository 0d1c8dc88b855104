//! Property tests for the invariants of spec.md §8: repair completeness,
//! cost-recompute equality, elitism monotonicity, determinism under a
//! fixed seed, topological soundness, and fitness monotone under the
//! penalty constant `M`.

use fog_workflow_scheduler::config::Parameters;
use fog_workflow_scheduler::domain::{Candidate, Node, NodeSet, Task, Workflow};
use fog_workflow_scheduler::{EnhancedEpoCeis, SchedulingAlgorithm};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn diamond_workflow() -> Workflow {
    let mut t1 = Task::new(1, 2000.0, 10.0, 0.0, 1, 10.0);
    t1.children = vec![2, 3];
    let mut t2 = Task::new(2, 2000.0, 10.0, 0.0, 1, 10.0);
    t2.parents = vec![1];
    t2.children = vec![4];
    let mut t3 = Task::new(3, 2000.0, 10.0, 0.0, 1, 10.0);
    t3.parents = vec![1];
    t3.children = vec![4];
    let mut t4 = Task::new(4, 2000.0, 10.0, 0.0, 1, 10.0);
    t4.parents = vec![2, 3];
    Workflow::from_tasks(vec![t1, t2, t3, t4]).unwrap()
}

fn two_nodes() -> NodeSet {
    NodeSet::new(vec![
        Node::new(1, 2000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 2000.0, 1024.0, 1000.0, 1024.0, true, 0.05, 0.0, 0.0, 0.0, 0.01),
    ])
}

fn small_params(seed: u64) -> Parameters {
    let mut params = Parameters::default();
    params.population_size = 24;
    params.max_generations = 8;
    params.elite_size = 4;
    params.master_seed = seed;
    params
}

#[test]
fn repair_leaves_every_task_complete_and_dependency_sound() {
    let wf = diamond_workflow();
    let nodes = two_nodes();
    let params = small_params(11);

    let result = EnhancedEpoCeis.schedule(&wf, &nodes, &params, params.master_seed).unwrap();

    for task_id in wf.task_ids() {
        assert!(result.assignment.contains_key(&task_id), "task {task_id} missing an assignment");
        assert!(result.start_time.contains_key(&task_id), "task {task_id} missing a start time");
        let node_id = result.assignment[&task_id];
        assert!(nodes.contains(node_id), "task {task_id} assigned to dead node {node_id}");
        assert!(result.start_time[&task_id] >= 0.0);
    }
}

#[test]
fn topological_soundness_child_starts_no_earlier_than_parent_finishes() {
    let wf = diamond_workflow();
    let nodes = two_nodes();
    let params = small_params(5);

    let result = EnhancedEpoCeis.schedule(&wf, &nodes, &params, params.master_seed).unwrap();

    for task_id in wf.task_ids() {
        let node_id = result.assignment[&task_id];
        let node = nodes.get(node_id).unwrap();
        let task = wf.get(task_id).unwrap();
        let duration = fog_workflow_scheduler::kernels::duration(task, node);
        let finish = result.start_time[&task_id] + duration;

        for &child_id in wf.children(task_id) {
            assert!(result.start_time[&child_id] + 1e-9 >= finish, "child {child_id} starts before parent {task_id} finishes");
        }
    }
}

#[test]
fn recomputed_cost_matches_cached_fitness_within_tolerance() {
    let wf = diamond_workflow();
    let nodes = two_nodes();
    let params = small_params(3);

    let mut candidate = Candidate::new();
    for task_id in wf.task_ids() {
        candidate.assign(task_id, 1);
        candidate.set_start(task_id, 0.0);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.master_seed);
    let fitness = fog_workflow_scheduler::evaluator::evaluate(&mut candidate, &wf, &nodes, &params, &mut rng);

    let mut recomputed = Candidate::new();
    for task_id in wf.task_ids() {
        recomputed.assign(task_id, candidate.node_of(task_id).unwrap());
        recomputed.set_start(task_id, candidate.start_of(task_id).unwrap());
    }
    let mut rng2 = ChaCha8Rng::seed_from_u64(params.master_seed);
    let recomputed_fitness = fog_workflow_scheduler::evaluator::evaluate(&mut recomputed, &wf, &nodes, &params, &mut rng2);

    let relative_error = (fitness - recomputed_fitness).abs() / fitness.abs().max(1.0);
    assert!(relative_error < 1e-9, "fitness={fitness} recomputed={recomputed_fitness}");
}

#[test]
fn elitism_makes_best_fitness_non_increasing_as_generations_grow() {
    let wf = diamond_workflow();
    let nodes = two_nodes();

    let mut short = small_params(99);
    short.max_generations = 3;
    let mut long = small_params(99);
    long.max_generations = 9;

    let short_result = EnhancedEpoCeis.schedule(&wf, &nodes, &short, short.master_seed).unwrap();
    let long_result = EnhancedEpoCeis.schedule(&wf, &nodes, &long, long.master_seed).unwrap();

    assert!(long_result.total_cost <= short_result.total_cost + 1e-9);
}

#[test]
fn same_seed_produces_identical_results_across_runs() {
    let wf = diamond_workflow();
    let nodes = two_nodes();
    let params = small_params(2024);

    let a = EnhancedEpoCeis.schedule(&wf, &nodes, &params, params.master_seed).unwrap();
    let b = EnhancedEpoCeis.schedule(&wf, &nodes, &params, params.master_seed).unwrap();

    assert_eq!(a.assignment, b.assignment);
    assert_eq!(a.start_time, b.start_time);
    assert_eq!(a.total_cost, b.total_cost);
    assert_eq!(a.makespan, b.makespan);
}

#[test]
fn increasing_penalty_m_never_decreases_fitness() {
    let mut t = Task::new(1, 10000.0, 10.0, 0.0, 1, 0.5);
    t.parents.clear();
    let wf = Workflow::from_tasks(vec![t]).unwrap();
    let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01)]);

    let mut low = Candidate::new();
    low.assign(1, 1);
    low.set_start(1, 0.0);
    let mut high = low.clone();

    let mut params_low = Parameters::default();
    params_low.penalty_m = 100.0;
    let mut params_high = Parameters::default();
    params_high.penalty_m = 10_000.0;

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let fitness_low = fog_workflow_scheduler::evaluator::evaluate(&mut low, &wf, &nodes, &params_low, &mut rng);
    let mut rng2 = ChaCha8Rng::seed_from_u64(1);
    let fitness_high = fog_workflow_scheduler::evaluator::evaluate(&mut high, &wf, &nodes, &params_high, &mut rng2);

    assert!(fitness_high >= fitness_low);
}
