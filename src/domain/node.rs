use std::collections::HashMap;

use crate::domain::NodeId;

/// A fog or cloud compute resource (spec.md §3 "Node").
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Processing rate, million instructions per second.
    pub mips: f64,
    pub memory: f64,
    pub bandwidth: f64,
    pub storage: f64,
    pub is_cloud: bool,
    pub cost_per_sec: f64,
    pub energy_per_sec: f64,
    /// Network latency, milliseconds.
    pub latency_ms: f64,
    pub x: f64,
    pub y: f64,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: NodeId,
        mips: f64,
        memory: f64,
        bandwidth: f64,
        storage: f64,
        is_cloud: bool,
        cost_per_sec: f64,
        latency_ms: f64,
        x: f64,
        y: f64,
        energy_per_sec: f64,
    ) -> Self {
        Node {
            id,
            mips,
            memory,
            bandwidth,
            storage,
            is_cloud,
            cost_per_sec,
            energy_per_sec,
            latency_ms,
            x,
            y,
        }
    }

    pub fn is_fog(&self) -> bool {
        !self.is_cloud
    }
}

/// An owned, id-indexed collection of nodes. IDs are unique within a
/// NodeSet (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSet {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>) -> Self {
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        NodeSet { nodes, index }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn fog_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_fog())
    }

    pub fn cloud_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_cloud)
    }

    /// Average million-instructions-per-second across all nodes, used to
    /// classify a node's "performance class" for Opposition initialization.
    pub fn average_mips(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.nodes.iter().map(|n| n.mips).sum::<f64>() / self.nodes.len() as f64
    }

    /// Builds a derived NodeSet containing only the nodes whose ids pass
    /// `keep`. Used by the outer placement search (spec.md §4.7) to
    /// restrict the inner scheduler to an active fog subset plus all
    /// cloud nodes.
    pub fn filtered(&self, keep: impl Fn(&Node) -> bool) -> NodeSet {
        NodeSet::new(self.nodes.iter().filter(|n| keep(n)).cloned().collect())
    }
}
