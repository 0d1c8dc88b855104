//! Four-stage deadline-aware repair state machine (spec.md §4.5), run
//! after every operator application and as the final step of
//! initialization. States execute in order with an early exit once no
//! violations remain.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::Parameters;
use crate::domain::{Candidate, NodeId, NodeSet, TaskId, Workflow};
use crate::kernels;
use crate::scoring;

/// Runs every repair state over `candidate`, mutating it in place.
pub fn repair(candidate: &mut Candidate, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, rng: &mut impl Rng) {
    let repairer = Repairer { workflow, nodes, params };
    repairer.completeness(candidate);
    repairer.deadline_repair(candidate, rng);
    repairer.optimization(candidate);
}

struct Repairer<'a> {
    workflow: &'a Workflow,
    nodes: &'a NodeSet,
    params: &'a Parameters,
}

impl Repairer<'_> {
    /// State 1, Completeness: every workflow task gets a node and a
    /// start time. Missing assignments and invalid start times
    /// (missing/negative/NaN) are both filled the same way: the
    /// most-suitable node for the task and `max(0, min(earliestFromParents, 0.6*deadline))`.
    fn completeness(&self, candidate: &mut Candidate) {
        let mut finish_times: HashMap<TaskId, f64> = HashMap::new();
        for &task_id in self.workflow.topo_order() {
            let Some(task) = self.workflow.get(task_id) else { continue };
            let ready = self.workflow.ready_time(task_id, &finish_times);

            let needs_node = candidate.node_of(task_id).is_none_or(|id| !self.nodes.contains(id));
            let needs_start = !candidate.has_start(task_id);

            if needs_node {
                let node_id = scoring::most_suitable_node(task, self.nodes, ready, self.params.penalty_m);
                candidate.assign(task_id, node_id);
            }
            if needs_start || needs_node {
                let start = (ready.min(0.6 * task.deadline)).max(0.0);
                candidate.set_start(task_id, start);
            }

            let node = self.nodes.get(candidate.node_of(task_id).expect("assigned above")).expect("live node");
            let start = candidate.start_of(task_id).unwrap_or(ready);
            let finish = start + kernels::duration(task, node);
            finish_times.insert(task_id, finish);
        }
    }

    /// State 2, Deadline Repair Pass: TimeShift, then escalate
    /// violating tasks through NodeMigration, Aggressive, and (in the
    /// unreachable case a node still could not be found) Emergency.
    fn deadline_repair(&self, candidate: &mut Candidate, rng: &mut impl Rng) {
        let (mut finish_times, mut violations) = self.time_shift_pass(candidate);
        if violations.is_empty() {
            return;
        }

        violations = self.node_migration_pass(candidate, &mut finish_times, &violations);
        if violations.is_empty() {
            return;
        }

        violations = self.aggressive_pass(candidate, &mut finish_times, &violations);
        if violations.is_empty() {
            return;
        }

        self.emergency_pass(candidate, &mut finish_times, &violations, rng);
    }

    /// Pass 0, TimeShift. Keeps the current node; commits a new start
    /// time only when doing so is already deadline-feasible.
    fn time_shift_pass(&self, candidate: &mut Candidate) -> (HashMap<TaskId, f64>, Vec<TaskId>) {
        let mut finish_times = HashMap::new();
        let mut violations = Vec::new();

        for &task_id in self.workflow.topo_order() {
            let Some(task) = self.workflow.get(task_id) else { continue };
            let node_id = candidate.node_of(task_id).expect("completeness ran first");
            let node = self.nodes.get(node_id).expect("completeness ran first");
            let ready = self.workflow.ready_time(task_id, &finish_times);

            let stored_start = candidate.start_of(task_id).unwrap_or(0.0);
            let effective_start = stored_start.max(ready);
            let duration = kernels::duration(task, node);
            let finish = effective_start + duration;

            candidate.set_start(task_id, effective_start);
            finish_times.insert(task_id, finish);

            if finish > task.deadline {
                violations.push(task_id);
            }
        }
        (finish_times, violations)
    }

    /// Pass 1, NodeMigration. For each violating task, try every node
    /// and keep the one minimizing finish time subject to feasibility;
    /// if none are feasible, snap to the fastest node for the task.
    fn node_migration_pass(
        &self,
        candidate: &mut Candidate,
        finish_times: &mut HashMap<TaskId, f64>,
        violations: &[TaskId],
    ) -> Vec<TaskId> {
        let mut available = self.rebuild_available(candidate, finish_times);
        let mut still_violating = Vec::new();

        for &task_id in violations {
            let Some(task) = self.workflow.get(task_id) else { continue };
            let ready = self.workflow.ready_time(task_id, finish_times);

            let mut best: Option<(NodeId, f64)> = None;
            for node in self.nodes.iter() {
                let node_available = available.get(&node.id).copied().unwrap_or(0.0);
                let start = ready.max(node_available);
                let finish = start + kernels::duration(task, node);
                if finish <= task.deadline && (best.is_none() || finish < best.unwrap().1) {
                    best = Some((node.id, finish));
                }
            }

            if let Some((node_id, finish)) = best {
                let node_available = available.get(&node_id).copied().unwrap_or(0.0);
                let start = ready.max(node_available);
                candidate.assign(task_id, node_id);
                candidate.set_start(task_id, start);
                finish_times.insert(task_id, finish);
                available.insert(node_id, finish);
            } else {
                let node_id = scoring::fastest_node(task, self.nodes);
                let node = self.nodes.get(node_id).expect("fastest_node returns a live node");
                let node_available = available.get(&node_id).copied().unwrap_or(0.0);
                let start = ready.max(node_available);
                let finish = start + kernels::duration(task, node);
                candidate.assign(task_id, node_id);
                candidate.set_start(task_id, start);
                finish_times.insert(task_id, finish);
                available.insert(node_id, finish);
                still_violating.push(task_id);
            }
        }
        still_violating
    }

    /// Pass 2, Aggressive. Ignore cost entirely: fastest node,
    /// earliest-from-parents start. Persistent violations are recorded
    /// but the candidate is kept either way.
    fn aggressive_pass(&self, candidate: &mut Candidate, finish_times: &mut HashMap<TaskId, f64>, violations: &[TaskId]) -> Vec<TaskId> {
        let mut still_violating = Vec::new();
        for &task_id in violations {
            let Some(task) = self.workflow.get(task_id) else { continue };
            let ready = self.workflow.ready_time(task_id, finish_times);
            let node_id = scoring::fastest_node(task, self.nodes);
            let node = self.nodes.get(node_id).expect("fastest_node returns a live node");
            let finish = ready + kernels::duration(task, node);

            candidate.assign(task_id, node_id);
            candidate.set_start(task_id, ready);
            finish_times.insert(task_id, finish);

            if finish > task.deadline {
                still_violating.push(task_id);
            }
        }
        still_violating
    }

    /// Pass 3, Emergency. Spec.md calls this unreachable for a
    /// non-empty NodeSet (Aggressive always places a task); kept for
    /// the case a pathological NodeSet makes `fastest_node` impossible.
    fn emergency_pass(&self, candidate: &mut Candidate, finish_times: &mut HashMap<TaskId, f64>, violations: &[TaskId], rng: &mut impl Rng) {
        let all_ids: Vec<NodeId> = self.nodes.ids().collect();
        for &task_id in violations {
            let Some(task) = self.workflow.get(task_id) else { continue };
            if candidate.is_assigned(task_id) && candidate.has_start(task_id) {
                continue;
            }
            let ready = self.workflow.ready_time(task_id, finish_times);
            let node_id = *all_ids.choose(rng).expect("NodeSet is non-empty");
            let node = self.nodes.get(node_id).expect("live node");
            let finish = ready + kernels::duration(task, node);
            candidate.assign(task_id, node_id);
            candidate.set_start(task_id, ready);
            finish_times.insert(task_id, finish);
        }
    }

    /// State 3, Optimization pass. No-op by contract (spec.md §4.5,
    /// §9 Open Questions): reserved for cost-reducing adjustments that
    /// never introduce new violations. Left empty.
    fn optimization(&self, _candidate: &mut Candidate) {}

    fn rebuild_available(&self, candidate: &Candidate, finish_times: &HashMap<TaskId, f64>) -> HashMap<NodeId, f64> {
        let mut available: HashMap<NodeId, f64> = self.nodes.ids().map(|id| (id, 0.0)).collect();
        for &task_id in self.workflow.topo_order() {
            if let (Some(node_id), Some(&finish)) = (candidate.node_of(task_id), finish_times.get(&task_id)) {
                let slot = available.entry(node_id).or_insert(0.0);
                if finish > *slot {
                    *slot = finish;
                }
            }
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, Task};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn one_task_workflow(deadline: f64) -> Workflow {
        Workflow::from_tasks(vec![Task::new(1, 10000.0, 10.0, 0.0, 1, deadline)]).unwrap()
    }

    fn slow_and_fast_nodes() -> NodeSet {
        NodeSet::new(vec![
            Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01),
            Node::new(2, 10000.0, 1024.0, 1000.0, 1024.0, true, 1.0, 0.0, 0.0, 0.0, 0.01),
        ])
    }

    #[test]
    fn completeness_assigns_every_task() {
        let wf = one_task_workflow(5.0);
        let nodes = slow_and_fast_nodes();
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut candidate = Candidate::new();

        repair(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert!(candidate.is_complete(wf.task_ids()));
    }

    #[test]
    fn tight_deadline_migrates_to_faster_node() {
        let wf = one_task_workflow(2.0);
        let nodes = slow_and_fast_nodes();
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut candidate = Candidate::new();
        candidate.assign(1, 1);
        candidate.set_start(1, 0.0);

        repair(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert_eq!(candidate.node_of(1), Some(2));
    }

    #[test]
    fn infeasible_deadline_keeps_candidate_with_recorded_violation() {
        let wf = one_task_workflow(0.5);
        let nodes = NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01)]);
        let params = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut candidate = Candidate::new();
        candidate.assign(1, 1);
        candidate.set_start(1, 0.0);

        repair(&mut candidate, &wf, &nodes, &params, &mut rng);

        assert!(candidate.is_complete(wf.task_ids()));
        assert_eq!(candidate.node_of(1), Some(1));
    }
}
