//! Line-oriented text loader for the TASK/DEP workflow format and the
//! NODE format (spec.md §6), plus their round-trip-capable writers.

pub mod parser;

pub use parser::{parse_nodes, parse_workflow, write_nodes, write_workflow};
