pub type TaskId = u64;

/// A unit of work in the workflow DAG (spec.md §3 "Task").
///
/// `start_time`/`finish_time` are the two mutable runtime fields the spec
/// calls out. They are only ever written once, when a chosen
/// [`crate::domain::Candidate`] is finalized into a
/// [`crate::api::result::SchedulingResult`]. During the generation loop
/// the Evaluator keeps per-candidate start/finish times in the Candidate
/// itself so that evaluating many candidates stays embarrassingly
/// parallel (see DESIGN.md, "Open Question: where do finish times live").
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    /// Length of the task in million instructions.
    pub length: f64,
    /// Size of the task's input payload.
    pub file_size: f64,
    /// Size of the task's output payload.
    pub output_size: f64,
    /// Number of processing elements the task requires.
    pub pes: u32,
    /// The `cost` field of the TASK record (spec.md §6). The Evaluator
    /// derives monetary cost from node `costPerSec` and duration, not
    /// from this value; it is carried only so the text loader's
    /// round-trip property holds.
    pub raw_cost: f64,
    /// Absolute deadline, in seconds from epoch 0.
    pub deadline: f64,
    pub parents: Vec<TaskId>,
    pub children: Vec<TaskId>,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
}

impl Task {
    pub fn new(id: TaskId, length: f64, file_size: f64, output_size: f64, pes: u32, deadline: f64) -> Self {
        Task {
            id,
            length,
            file_size,
            output_size,
            pes,
            raw_cost: 0.0,
            deadline,
            parents: Vec::new(),
            children: Vec::new(),
            start_time: None,
            finish_time: None,
        }
    }

    /// Default deadline used by the loader when a TASK record omits it.
    pub fn default_deadline(length: f64) -> f64 {
        length / 1000.0 + 3.0
    }

    /// Finalizes the runtime fields once a winning schedule has been chosen.
    pub fn set_schedule(&mut self, start: f64, finish: f64) {
        self.start_time = Some(start);
        self.finish_time = Some(finish);
    }
}
