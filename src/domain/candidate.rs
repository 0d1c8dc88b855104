use std::collections::HashMap;

use crate::domain::{NodeId, TaskId};

/// A single schedule: task→node assignment and task→start-time, plus the
/// fitness metadata the Evaluator caches on it (spec.md §3 "Candidate").
#[derive(Debug, Clone)]
pub struct Candidate {
    assignment: HashMap<TaskId, NodeId>,
    start_time: HashMap<TaskId, f64>,
    /// Finish time computed by the Evaluator's forward sweep. Kept here
    /// rather than on the shared `Task` so evaluating many candidates
    /// stays embarrassingly parallel (spec.md §5).
    finish_time: HashMap<TaskId, f64>,

    pub cost: f64,
    pub energy: f64,
    pub makespan: f64,
    pub missed_deadlines: usize,
    pub fitness: f64,
}

impl Default for Candidate {
    fn default() -> Self {
        Candidate {
            assignment: HashMap::new(),
            start_time: HashMap::new(),
            finish_time: HashMap::new(),
            cost: 0.0,
            energy: 0.0,
            makespan: 0.0,
            missed_deadlines: 0,
            fitness: f64::INFINITY,
        }
    }
}

impl Candidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_of(&self, task: TaskId) -> Option<NodeId> {
        self.assignment.get(&task).copied()
    }

    pub fn start_of(&self, task: TaskId) -> Option<f64> {
        self.start_time.get(&task).copied()
    }

    pub fn finish_of(&self, task: TaskId) -> Option<f64> {
        self.finish_time.get(&task).copied()
    }

    pub fn assign(&mut self, task: TaskId, node: NodeId) {
        self.assignment.insert(task, node);
    }

    pub fn set_start(&mut self, task: TaskId, start: f64) {
        self.start_time.insert(task, start);
    }

    pub fn set_finish(&mut self, task: TaskId, finish: f64) {
        self.finish_time.insert(task, finish);
    }

    pub fn unassign(&mut self, task: TaskId) {
        self.assignment.remove(&task);
        self.start_time.remove(&task);
        self.finish_time.remove(&task);
    }

    pub fn assigned_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.assignment.keys().copied()
    }

    pub fn is_assigned(&self, task: TaskId) -> bool {
        self.assignment.contains_key(&task)
    }

    pub fn has_start(&self, task: TaskId) -> bool {
        self.start_time.get(&task).is_some_and(|s| s.is_finite() && *s >= 0.0)
    }

    /// Every task id present in both mappings, matching the post-repair
    /// invariant of spec.md §3.
    pub fn is_complete(&self, task_ids: impl Iterator<Item = TaskId>) -> bool {
        task_ids.into_iter().all(|id| self.is_assigned(id) && self.has_start(id))
    }

    /// Node-mismatch count + clamped start-time delta, used by the
    /// diversity metric of spec.md §4.4.
    pub fn distance_to(&self, other: &Candidate, task_ids: impl Iterator<Item = TaskId>) -> f64 {
        let mut distance = 0.0;
        for id in task_ids {
            if self.node_of(id) != other.node_of(id) {
                distance += 1.0;
            }
            let a = self.start_of(id).unwrap_or(0.0);
            let b = other.start_of(id).unwrap_or(0.0);
            distance += ((a - b).abs() / 100.0).min(1.0);
        }
        distance
    }
}

/// Ordered sequence of candidates, sorted ascending by composite fitness;
/// ties broken by lower missed-deadline count then lower makespan
/// (spec.md §3 "Population").
#[derive(Debug, Clone, Default)]
pub struct Population {
    candidates: Vec<Candidate>,
}

impl Population {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Population { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.candidates
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn sort(&mut self) {
        self.candidates.sort_by(cmp_candidates);
    }

    pub fn truncate(&mut self, size: usize) {
        self.candidates.truncate(size);
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn elite(&self, size: usize) -> &[Candidate] {
        &self.candidates[..size.min(self.candidates.len())]
    }
}

fn cmp_candidates(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.fitness
        .total_cmp(&b.fitness)
        .then(a.missed_deadlines.cmp(&b.missed_deadlines))
        .then(a.makespan.total_cmp(&b.makespan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_orders_by_fitness_then_missed_then_makespan() {
        let mut a = Candidate::new();
        a.fitness = 10.0;
        a.missed_deadlines = 1;
        a.makespan = 5.0;

        let mut b = Candidate::new();
        b.fitness = 10.0;
        b.missed_deadlines = 0;
        b.makespan = 9.0;

        let mut pop = Population::new(vec![a, b]);
        pop.sort();
        assert_eq!(pop.as_slice()[0].missed_deadlines, 0);
    }

    #[test]
    fn distance_counts_node_mismatch_and_clamped_time_delta() {
        let mut a = Candidate::new();
        a.assign(1, 10);
        a.set_start(1, 0.0);

        let mut b = Candidate::new();
        b.assign(1, 11);
        b.set_start(1, 500.0);

        // 1 (node mismatch) + 1.0 (clamped time delta)
        assert_eq!(a.distance_to(&b, std::iter::once(1)), 2.0);
    }
}
