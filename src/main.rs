//! `evaluate` CLI (spec.md §6): runs the configured scenarios against
//! Enhanced EPO-CEIS (and its two-layer variant for the outer-placement
//! scenario) and writes one CSV report per invocation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::Parser;

use fog_workflow_scheduler::algorithm::{EnhancedEpoCeis, SchedulingAlgorithm, TwoLayerEnhancedEpoCeis};
use fog_workflow_scheduler::api::{CsvRow, write_csv};
use fog_workflow_scheduler::config::Parameters;
use fog_workflow_scheduler::domain::{Node, NodeSet, Task, Workflow};
use fog_workflow_scheduler::error::Result;
use fog_workflow_scheduler::loader;
use fog_workflow_scheduler::logger;

/// Runs every configured scenario against Enhanced EPO-CEIS and writes a
/// CSV comparison report.
#[derive(Parser)]
#[command(name = "evaluate")]
#[command(about = "Runs the configured scenarios against Enhanced EPO-CEIS and writes a CSV report")]
struct Cli {
    /// Directory the CSV report is written into.
    #[arg(default_value = "results")]
    output_dir: PathBuf,

    /// Directory scanned for additional `*.workflow`/`*.nodes` scenario
    /// pairs (spec.md §6 TASK/DEP and NODE line formats).
    #[arg(long, default_value = "scenarios")]
    scenarios_dir: PathBuf,
}

fn main() {
    logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        eprintln!("evaluate: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let params = Parameters::default();
    let mut rows = Vec::new();

    for (name, workflow, nodes) in builtin_scenarios() {
        let row = if name == "S5" {
            run_scenario(&TwoLayerEnhancedEpoCeis, "TwoLayerEnhancedEpoCeis", &name, &workflow, &nodes, &params)?
        } else {
            run_scenario(&EnhancedEpoCeis, "EnhancedEpoCeis", &name, &workflow, &nodes, &params)?
        };
        rows.push(row);
    }

    for (name, workflow, nodes) in discover_scenarios(&cli.scenarios_dir)? {
        rows.push(run_scenario(&EnhancedEpoCeis, "EnhancedEpoCeis", &name, &workflow, &nodes, &params)?);
    }

    std::fs::create_dir_all(&cli.output_dir)?;
    let out_path = cli.output_dir.join("results.csv");
    write_csv(&out_path, &rows)?;
    log::info!("wrote {} rows to {}", rows.len(), out_path.display());
    Ok(())
}

fn run_scenario(
    algorithm: &dyn SchedulingAlgorithm,
    algorithm_name: &str,
    scenario_name: &str,
    workflow: &Workflow,
    nodes: &NodeSet,
    params: &Parameters,
) -> Result<CsvRow> {
    log::info!("scenario {scenario_name}: scheduling {} tasks over {} nodes", workflow.len(), nodes.len());
    let start = Instant::now();
    let result = algorithm.schedule(workflow, nodes, params, params.master_seed)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok(CsvRow::from_result(algorithm_name, scenario_name, workflow.len(), nodes.len(), &result, elapsed_ms, Utc::now()))
}

/// Scans `dir` for `name.workflow` / `name.nodes` pairs, skipping any
/// `.workflow` file missing its matching `.nodes` sibling. Returns an
/// empty list (not an error) when the directory does not exist, so a
/// fresh checkout without a `scenarios/` directory still runs the
/// built-in scenarios.
fn discover_scenarios(dir: &Path) -> Result<Vec<(String, Workflow, NodeSet)>> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(found);
    };

    let mut workflow_paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "workflow"))
        .collect();
    workflow_paths.sort();

    for workflow_path in workflow_paths {
        let name = workflow_path.file_stem().and_then(|s| s.to_str()).unwrap_or("scenario").to_string();
        let nodes_path = workflow_path.with_extension("nodes");
        if !nodes_path.exists() {
            log::warn!("scenario {name}: no matching .nodes file at {}, skipping", nodes_path.display());
            continue;
        }

        let workflow = loader::parse_workflow(&std::fs::read_to_string(&workflow_path)?)?;
        let nodes = loader::parse_nodes(&std::fs::read_to_string(&nodes_path)?)?;
        found.push((name, workflow, nodes));
    }
    Ok(found)
}

/// The five end-to-end scenarios of spec.md §8, built in so `evaluate`
/// always reports something even with an empty `scenarios/` directory.
fn builtin_scenarios() -> Vec<(String, Workflow, NodeSet)> {
    vec![
        ("S1".to_string(), s1_workflow(), s1_nodes()),
        ("S2".to_string(), s2_workflow(), s2_nodes()),
        ("S3".to_string(), s3_workflow(), s3_nodes()),
        ("S4".to_string(), s4_workflow(), s4_nodes()),
        ("S5".to_string(), s5_workflow(), s5_nodes()),
    ]
}

fn chain_task(id: u64, length: f64, file_size: f64, deadline: f64, parent: Option<u64>, child: Option<u64>) -> Task {
    let mut task = Task::new(id, length, file_size, 0.0, 1, deadline);
    task.parents = parent.into_iter().collect();
    task.children = child.into_iter().collect();
    task
}

/// S1, Linear chain, 3 tasks, 2 nodes.
fn s1_workflow() -> Workflow {
    Workflow::from_tasks(vec![
        chain_task(1, 1000.0, 10.0, 5.0, None, Some(2)),
        chain_task(2, 1000.0, 10.0, 5.0, Some(1), Some(3)),
        chain_task(3, 1000.0, 10.0, 5.0, Some(2), None),
    ])
    .expect("S1 is acyclic by construction")
}

fn s1_nodes() -> NodeSet {
    NodeSet::new(vec![
        Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 500.0, 1024.0, 1000.0, 1024.0, false, 0.05, 0.0, 0.0, 0.0, 0.01),
    ])
}

/// S2, Diamond, 4 tasks: 1 -> {2, 3} -> 4.
fn s2_workflow() -> Workflow {
    let mut t1 = chain_task(1, 2000.0, 10.0, 10.0, None, None);
    t1.children = vec![2, 3];
    let t2 = chain_task(2, 2000.0, 10.0, 10.0, Some(1), Some(4));
    let t3 = chain_task(3, 2000.0, 10.0, 10.0, Some(1), Some(4));
    let mut t4 = chain_task(4, 2000.0, 10.0, 10.0, None, None);
    t4.parents = vec![2, 3];
    Workflow::from_tasks(vec![t1, t2, t3, t4]).expect("S2 is acyclic by construction")
}

fn s2_nodes() -> NodeSet {
    NodeSet::new(vec![
        Node::new(1, 2000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 2000.0, 1024.0, 1000.0, 1024.0, false, 0.1, 0.0, 0.0, 0.0, 0.01),
    ])
}

/// S3, Tight deadline forces migration from a slow node to a fast one.
fn s3_workflow() -> Workflow {
    Workflow::from_tasks(vec![chain_task(1, 10000.0, 10.0, 2.0, None, None)]).expect("single task is acyclic")
}

fn s3_nodes() -> NodeSet {
    NodeSet::new(vec![
        Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01),
        Node::new(2, 10000.0, 1024.0, 1000.0, 1024.0, true, 1.0, 0.0, 0.0, 0.0, 0.02),
    ])
}

/// S4, Infeasible: the only node is too slow for the deadline no matter
/// what the search does.
fn s4_workflow() -> Workflow {
    Workflow::from_tasks(vec![chain_task(1, 10000.0, 10.0, 0.5, None, None)]).expect("single task is acyclic")
}

fn s4_nodes() -> NodeSet {
    NodeSet::new(vec![Node::new(1, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.01, 0.0, 0.0, 0.0, 0.01)])
}

/// S5, Outer placement: 10 fog candidates with pairwise different
/// latencies plus a cloud fallback, scheduled through the two-layer
/// variant so the outer search actually prunes the fog pool.
fn s5_workflow() -> Workflow {
    Workflow::from_tasks(vec![
        chain_task(1, 1000.0, 10.0, 20.0, None, Some(2)),
        chain_task(2, 1000.0, 10.0, 20.0, Some(1), None),
    ])
    .expect("S5 is acyclic by construction")
}

fn s5_nodes() -> NodeSet {
    let mut nodes: Vec<Node> = (1..=10)
        .map(|i| {
            let latency_ms = (i * 5) as f64;
            Node::new(i, 1000.0, 1024.0, 1000.0, 1024.0, false, 0.05, latency_ms, 0.0, 0.0, 0.01)
        })
        .collect();
    nodes.push(Node::new(100, 2000.0, 2048.0, 2000.0, 2048.0, true, 0.2, 1.0, 0.0, 0.0, 0.02));
    NodeSet::new(nodes)
}
