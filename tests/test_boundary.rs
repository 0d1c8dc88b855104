//! Boundary cases of spec.md §8: a single-task workflow, a workflow
//! whose every deadline is already in the past, and a node pool with
//! zero MIPS everywhere.

use fog_workflow_scheduler::config::Parameters;
use fog_workflow_scheduler::domain::{Node, NodeSet, Task, Workflow};
use fog_workflow_scheduler::{EnhancedEpoCeis, SchedulingAlgorithm};

fn params() -> Parameters {
    let mut p = Parameters::default();
    p.population_size = 20;
    p.max_generations = 5;
    p.elite_size = 3;
    p.master_seed = 7;
    p
}

#[test]
fn single_task_workflow_lands_on_the_fastest_feasible_node() {
    let wf = Workflow::from_tasks(vec![Task::new(1, 1000.0, 10.0, 0.0, 1, 50.0)]).unwrap();
    let nodes = NodeSet::new(vec![
        Node::new(1, 500.0, 1024.0, 1000.0, 1024.0, false, 0.2, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 2000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
    ]);

    let result = EnhancedEpoCeis.schedule(&wf, &nodes, &params(), params().master_seed).unwrap();

    assert_eq!(result.assignment.len(), 1);
    assert_eq!(result.start_time[&1], 0.0);
    assert_eq!(result.assignment[&1], 2);
    assert_eq!(result.deadline_hit_rate, 1.0);
}

#[test]
fn workflow_with_zero_deadlines_misses_every_task() {
    let mut t1 = Task::new(1, 1000.0, 10.0, 0.0, 1, 0.0);
    t1.children = vec![2];
    let mut t2 = Task::new(2, 1000.0, 10.0, 0.0, 1, 0.0);
    t2.parents = vec![1];
    let wf = Workflow::from_tasks(vec![t1, t2]).unwrap();

    let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01)]);

    let result = EnhancedEpoCeis.schedule(&wf, &nodes, &params(), params().master_seed).unwrap();

    assert_eq!(result.deadline_hit_rate, 0.0);
    assert_eq!(result.assignment.len(), 2);
}

#[test]
fn all_zero_mips_nodes_still_return_a_scored_schedule() {
    let wf = Workflow::from_tasks(vec![Task::new(1, 1000.0, 10.0, 0.0, 1, 5.0)]).unwrap();
    let nodes = NodeSet::new(vec![
        Node::new(1, 0.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 0.0, 1024.0, 1000.0, 1024.0, true, 0.2, 0.0, 0.0, 0.0, 0.02),
    ]);

    let result = EnhancedEpoCeis.schedule(&wf, &nodes, &params(), params().master_seed).unwrap();

    assert_eq!(result.assignment.len(), 1);
    assert!(nodes.contains(result.assignment[&1]));
    assert!(result.total_cost.is_finite());
    assert!(result.makespan.is_finite());
}
