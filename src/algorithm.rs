//! Pluggable algorithm seam (SPEC_FULL.md §10.4). `GA`/`PSO`/`Min-Min`/
//! `First-Fit` baselines are explicitly out of scope (spec.md §1) but
//! could be added later as sibling `SchedulingAlgorithm` implementations
//! without touching the engine.

use crate::api::SchedulingResult;
use crate::config::Parameters;
use crate::domain::{NodeSet, Workflow};
use crate::error::Result;
use crate::outer;
use crate::scheduler;

pub trait SchedulingAlgorithm {
    fn schedule(&self, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, seed: u64) -> Result<SchedulingResult>;
}

/// The evolutionary engine specified in spec.md §4: four movement
/// operators, a four-pass repair state machine, and a five-strategy
/// elite local search.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancedEpoCeis;

impl SchedulingAlgorithm for EnhancedEpoCeis {
    fn schedule(&self, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, seed: u64) -> Result<SchedulingResult> {
        let mut params = params.clone();
        params.master_seed = seed;
        scheduler::run(workflow, nodes, &params)
    }
}

/// The two-layer variant of spec.md §4.7: an outer bit-vector search
/// picks which fog nodes stay active, then [`EnhancedEpoCeis`] schedules
/// the workflow onto the surviving fog nodes plus every cloud node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoLayerEnhancedEpoCeis;

impl SchedulingAlgorithm for TwoLayerEnhancedEpoCeis {
    fn schedule(&self, workflow: &Workflow, nodes: &NodeSet, params: &Parameters, seed: u64) -> Result<SchedulingResult> {
        let mut params = params.clone();
        params.master_seed = seed;

        let placement = outer::search(nodes, &params);
        let active_fog: std::collections::HashSet<u64> = placement.active_ids().collect();
        let inner_nodes = nodes.filtered(|n| n.is_cloud || active_fog.contains(&n.id));

        scheduler::run(workflow, &inner_nodes, &params)
    }
}
