use thiserror::Error;

/// Fatal errors stop the engine before a generation loop ever starts; the
/// caller gets a single diagnostic and nothing else runs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed record at line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    #[error("workflow contains a dependency cycle (first detected at task {task_id})")]
    CycleDetected { task_id: u64 },

    #[error("scheduling requires at least one node, but the node set is empty")]
    EmptyNodeSet,
}

pub type Result<T> = std::result::Result<T, Error>;
