use indexmap::IndexMap;
use petgraph::{graph::Graph, prelude::NodeIndex};
use serde::{Deserialize, Serialize};

/// Zero-based node id, global across every graph of a dataset.
pub type NodeId = usize;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeAttributes {
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub attributes: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EdgeAttributes {
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub attributes: Vec<f64>,
}

/// Serializable form of a single graph, used by the processed cache and pattern output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub label: Option<usize>,
    #[serde(default)]
    pub attributes: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub attributes: NodeAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub attributes: EdgeAttributes,
}

pub type LabeledGraph = Graph<NodeAttributes, EdgeAttributes>;

#[derive(Debug, Clone)]
pub struct GraphInstance {
    pub graph: LabeledGraph,
    pub node_lookup: IndexMap<NodeId, NodeIndex>,
    pub reverse_lookup: IndexMap<NodeIndex, NodeId>,
    /// Dense class index of the graph, absent for regression-only datasets.
    pub label: Option<usize>,
    pub attributes: Vec<f64>,
}

impl GraphInstance {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_id(&self, idx: NodeIndex) -> Option<NodeId> {
        self.reverse_lookup.get(&idx).copied()
    }
}
