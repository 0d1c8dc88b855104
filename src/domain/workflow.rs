use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::domain::task::{Task, TaskId};
use crate::error::{Error, Result};

/// Owns the task table and the forward dependency relation (spec.md §3
/// "Workflow"). Built once from input and immutable afterwards: nothing
/// here is mutated by a scheduling run; per-candidate schedules live on
/// the [`crate::domain::Candidate`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    tasks: HashMap<TaskId, Task>,
    /// Topological order, ties broken by ascending task id.
    topo_order: Vec<TaskId>,
}

impl Workflow {
    /// Builds a Workflow from a flat task list whose `parents`/`children`
    /// fields are already populated, validating that the dependency
    /// relation is acyclic.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let map: HashMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();
        let topo_order = topological_order(&map)?;
        Ok(Workflow { tasks: map, topo_order })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn parents(&self, id: TaskId) -> &[TaskId] {
        self.tasks.get(&id).map(|t| t.parents.as_slice()).unwrap_or(&[])
    }

    pub fn children(&self, id: TaskId) -> &[TaskId] {
        self.tasks.get(&id).map(|t| t.children.as_slice()).unwrap_or(&[])
    }

    /// Topological order of task ids, stable by id for ties.
    pub fn topo_order(&self) -> &[TaskId] {
        &self.topo_order
    }

    /// Earliest a task may start given the finish times of its parents
    /// recorded so far. Missing parent entries (not yet scheduled) are
    /// treated as zero, matching the evaluator's forward sweep.
    pub fn ready_time(&self, id: TaskId, finish_times: &HashMap<TaskId, f64>) -> f64 {
        self.parents(id).iter().map(|p| finish_times.get(p).copied().unwrap_or(0.0)).fold(0.0, f64::max)
    }

    /// Same as [`Workflow::ready_time`] but reads parent finish times
    /// directly off a [`crate::domain::Candidate`]'s own cache, for
    /// operators and elite strategies that mutate a clone in place
    /// without rebuilding a finish-time map first.
    pub fn ready_time_from_candidate(&self, id: TaskId, candidate: &crate::domain::Candidate) -> f64 {
        self.parents(id).iter().map(|p| candidate.finish_of(*p).unwrap_or(0.0)).fold(0.0, f64::max)
    }
}

/// Kahn's algorithm over the parent/child relation. Ties are broken by
/// ascending task id via a min-heap, matching the "stable by id" contract.
/// Returns `CycleDetected` naming the lowest-id task that could not be
/// placed once every reachable task with satisfied dependencies has been
/// drained (i.e. a task that still has unvisited parents).
fn topological_order(tasks: &HashMap<TaskId, Task>) -> Result<Vec<TaskId>> {
    let mut indegree: HashMap<TaskId, usize> = tasks.keys().map(|&id| (id, 0usize)).collect();
    for task in tasks.values() {
        for &child in &task.children {
            if let Some(d) = indegree.get_mut(&child) {
                *d += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<TaskId>> =
        indegree.iter().filter(|&(_, &d)| d == 0).map(|(&id, _)| Reverse(id)).collect();

    let mut order = Vec::with_capacity(tasks.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        if let Some(task) = tasks.get(&id) {
            for &child in &task.children {
                if let Some(d) = indegree.get_mut(&child) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(Reverse(child));
                    }
                }
            }
        }
    }

    if order.len() != tasks.len() {
        let stuck = indegree
            .iter()
            .filter(|&(id, _)| !order.contains(id))
            .map(|(&id, _)| id)
            .min()
            .unwrap_or(0);
        return Err(Error::CycleDetected { task_id: stuck });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: TaskId, parents: &[TaskId], children: &[TaskId]) -> Task {
        let mut t = Task::new(id, 1000.0, 10.0, 10.0, 1, 5.0);
        t.parents = parents.to_vec();
        t.children = children.to_vec();
        t
    }

    #[test]
    fn linear_chain_orders_by_dependency() {
        let wf = Workflow::from_tasks(vec![task(1, &[], &[2]), task(2, &[1], &[3]), task(3, &[2], &[])]).unwrap();
        assert_eq!(wf.topo_order(), &[1, 2, 3]);
    }

    #[test]
    fn diamond_orders_siblings_by_id() {
        let wf =
            Workflow::from_tasks(vec![task(1, &[], &[2, 3]), task(2, &[1], &[4]), task(3, &[1], &[4]), task(4, &[2, 3], &[])])
                .unwrap();
        assert_eq!(wf.topo_order(), &[1, 2, 3, 4]);
    }

    #[test]
    fn cycle_is_detected() {
        let err = Workflow::from_tasks(vec![task(1, &[2], &[2]), task(2, &[1], &[1])]).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[test]
    fn ready_time_is_zero_for_root_tasks() {
        let wf = Workflow::from_tasks(vec![task(1, &[], &[])]).unwrap();
        assert_eq!(wf.ready_time(1, &HashMap::new()), 0.0);
    }
}
