//! Parses and writes the TASK/DEP workflow format and the NODE format
//! (spec.md §6). Every non-empty, non-`#`-prefixed line is one record;
//! blank lines and comments are ignored on read and never emitted on
//! write, so `parse(write(x))` is equality-preserving only up to that
//! normalization (and, for DEP ordering, only when lines were already
//! sorted, see DESIGN.md).

use crate::domain::{Node, NodeSet, Task, TaskId, Workflow};
use crate::error::{Error, Result};

pub fn parse_workflow(input: &str) -> Result<Workflow> {
    let mut tasks: std::collections::HashMap<TaskId, Task> = std::collections::HashMap::new();
    let mut deps: Vec<(TaskId, TaskId)> = Vec::new();

    for (lineno, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let line_no = lineno + 1;
        match fields.first().copied() {
            Some("TASK") => {
                let task = parse_task_record(&fields, line_no)?;
                if tasks.contains_key(&task.id) {
                    return Err(Error::ParseError { line: line_no, reason: format!("duplicate task id {}", task.id) });
                }
                tasks.insert(task.id, task);
            }
            Some("DEP") => {
                deps.push(parse_dep_record(&fields, line_no)?);
            }
            _ => {
                return Err(Error::ParseError { line: line_no, reason: format!("unrecognized record kind in {line:?}") });
            }
        }
    }

    for &(from, to) in &deps {
        let to_task = tasks.get(&to).cloned();
        let from_task = tasks.get(&from).cloned();
        if to_task.is_none() || from_task.is_none() {
            return Err(Error::ParseError { line: 0, reason: format!("DEP references unknown task id ({from} -> {to})") });
        }
        tasks.get_mut(&from).expect("checked above").children.push(to);
        tasks.get_mut(&to).expect("checked above").parents.push(from);
    }

    let mut ordered: Vec<Task> = tasks.into_values().collect();
    ordered.sort_by_key(|t| t.id);
    Workflow::from_tasks(ordered)
}

fn parse_task_record(fields: &[&str], line: usize) -> Result<Task> {
    if fields.len() < 7 || fields.len() > 8 {
        return Err(Error::ParseError { line, reason: format!("TASK expects 6 or 7 fields after the tag, got {}", fields.len() - 1) });
    }
    let id = parse_u64(fields[1], line, "id")?;
    let length = parse_f64(fields[2], line, "length")?;
    let file_size = parse_f64(fields[3], line, "fileSize")?;
    let output_size = parse_f64(fields[4], line, "outputSize")?;
    let pes = parse_u64(fields[5], line, "pes")? as u32;
    let raw_cost = parse_f64(fields[6], line, "cost")?;
    let deadline = match fields.get(7) {
        Some(s) => parse_f64(s, line, "deadline")?,
        None => Task::default_deadline(length),
    };

    let mut task = Task::new(id, length, file_size, output_size, pes, deadline);
    task.raw_cost = raw_cost;
    Ok(task)
}

fn parse_dep_record(fields: &[&str], line: usize) -> Result<(TaskId, TaskId)> {
    if fields.len() != 3 {
        return Err(Error::ParseError { line, reason: format!("DEP expects 2 fields after the tag, got {}", fields.len() - 1) });
    }
    let from = parse_u64(fields[1], line, "fromId")?;
    let to = parse_u64(fields[2], line, "toId")?;
    Ok((from, to))
}

pub fn parse_nodes(input: &str) -> Result<NodeSet> {
    let mut nodes = Vec::new();
    for (lineno, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let line_no = lineno + 1;
        match fields.first().copied() {
            Some("NODE") => nodes.push(parse_node_record(&fields, line_no)?),
            _ => return Err(Error::ParseError { line: line_no, reason: format!("unrecognized record kind in {line:?}") }),
        }
    }
    if nodes.is_empty() {
        return Err(Error::EmptyNodeSet);
    }
    Ok(NodeSet::new(nodes))
}

fn parse_node_record(fields: &[&str], line: usize) -> Result<Node> {
    if fields.len() < 8 || fields.len() > 12 {
        return Err(Error::ParseError { line, reason: format!("NODE expects 7 to 11 fields after the tag, got {}", fields.len() - 1) });
    }
    let id = parse_u64(fields[1], line, "id")?;
    let mips = parse_f64(fields[2], line, "mips")?;
    let memory = parse_f64(fields[3], line, "ram")?;
    let bandwidth = parse_f64(fields[4], line, "bw")?;
    let storage = parse_f64(fields[5], line, "storage")?;
    let is_cloud = parse_bool(fields[6], line, "isCloud")?;
    let cost_per_sec = parse_f64(fields[7], line, "costPerSec")?;
    let latency_ms = field_or_zero(fields, 8, line, "latencyMs")?;
    let x = field_or_zero(fields, 9, line, "x")?;
    let y = field_or_zero(fields, 10, line, "y")?;
    let energy_per_sec = field_or_zero(fields, 11, line, "energyPerSec")?;

    Ok(Node::new(id, mips, memory, bandwidth, storage, is_cloud, cost_per_sec, latency_ms, x, y, energy_per_sec))
}

fn field_or_zero(fields: &[&str], index: usize, line: usize, name: &str) -> Result<f64> {
    match fields.get(index) {
        Some(s) => parse_f64(s, line, name),
        None => Ok(0.0),
    }
}

fn parse_u64(s: &str, line: usize, field: &str) -> Result<u64> {
    s.parse::<u64>().map_err(|_| Error::ParseError { line, reason: format!("invalid {field} {s:?}") })
}

fn parse_f64(s: &str, line: usize, field: &str) -> Result<f64> {
    s.parse::<f64>().map_err(|_| Error::ParseError { line, reason: format!("invalid {field} {s:?}") })
}

fn parse_bool(s: &str, line: usize, field: &str) -> Result<bool> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::ParseError { line, reason: format!("invalid {field} {s:?}, expected true/false") }),
    }
}

/// Writes a Workflow back to the TASK/DEP text format, TASK records
/// first (ascending id), then DEP records (ascending `(from, to)`).
pub fn write_workflow(workflow: &Workflow) -> String {
    let mut lines = Vec::new();
    let mut ids: Vec<TaskId> = workflow.task_ids().collect();
    ids.sort_unstable();

    for id in &ids {
        let task = workflow.get(*id).expect("id came from task_ids()");
        lines.push(format!(
            "TASK,{},{},{},{},{},{},{}",
            task.id, task.length, task.file_size, task.output_size, task.pes, task.raw_cost, task.deadline
        ));
    }
    let mut deps: Vec<(TaskId, TaskId)> = Vec::new();
    for id in &ids {
        for &child in workflow.children(*id) {
            deps.push((*id, child));
        }
    }
    deps.sort_unstable();
    for (from, to) in deps {
        lines.push(format!("DEP,{from},{to}"));
    }
    lines.join("\n")
}

/// Writes a NodeSet back to the NODE text format, ascending by id.
pub fn write_nodes(nodes: &NodeSet) -> String {
    let mut ids: Vec<u64> = nodes.ids().collect();
    ids.sort_unstable();

    ids.into_iter()
        .map(|id| {
            let n = nodes.get(id).expect("id came from ids()");
            format!(
                "NODE,{},{},{},{},{},{},{},{},{},{},{}",
                n.id, n.mips, n.memory, n.bandwidth, n.storage, n.is_cloud, n.cost_per_sec, n.latency_ms, n.x, n.y, n.energy_per_sec
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
