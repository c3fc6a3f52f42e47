use anyhow::{anyhow, Result};
use indexmap::{IndexMap, IndexSet};
use petgraph::prelude::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::graph::model::{GraphInstance, LabeledGraph, NodeId, RawGraph};

/// Turns serialized graphs into in-memory petgraph instances.
#[derive(Debug, Default)]
pub struct GraphLoader;

impl GraphLoader {
    /// Parse a JSON string holding one [`RawGraph`].
    #[cfg(test)]
    pub fn from_json_str(json: &str) -> Result<GraphInstance> {
        let raw: RawGraph = serde_json::from_str(json)?;
        Self::from_raw_graph(raw)
    }

    /// Build a graph instance, rejecting edges that reference unknown nodes.
    pub fn from_raw_graph(raw: RawGraph) -> Result<GraphInstance> {
        let mut graph = LabeledGraph::with_capacity(raw.nodes.len(), raw.edges.len());
        let mut node_lookup = IndexMap::with_capacity(raw.nodes.len());
        let mut reverse_lookup = IndexMap::with_capacity(raw.nodes.len());

        for raw_node in raw.nodes {
            if node_lookup.contains_key(&raw_node.id) {
                return Err(anyhow!("Duplicate node id: {}", raw_node.id));
            }
            let idx = graph.add_node(raw_node.attributes);
            node_lookup.insert(raw_node.id, idx);
            reverse_lookup.insert(idx, raw_node.id);
        }

        for raw_edge in raw.edges {
            let source_idx = *node_lookup
                .get(&raw_edge.source)
                .ok_or_else(|| anyhow!("Unknown source node id: {}", raw_edge.source))?;
            let target_idx = *node_lookup
                .get(&raw_edge.target)
                .ok_or_else(|| anyhow!("Unknown target node id: {}", raw_edge.target))?;
            graph.add_edge(source_idx, target_idx, raw_edge.attributes);
        }

        Ok(GraphInstance {
            graph,
            node_lookup,
            reverse_lookup,
            label: raw.label,
            attributes: raw.attributes,
        })
    }

    /// Extract the subgraph induced by `node_ids`, keeping their order.
    pub fn induced_subgraph(
        graph: &GraphInstance,
        node_ids: &IndexSet<NodeId>,
    ) -> Result<GraphInstance> {
        let mut new_graph = LabeledGraph::with_capacity(node_ids.len(), node_ids.len());
        let mut node_lookup = IndexMap::new();
        let mut reverse_lookup = IndexMap::new();
        let mut index_mapping: IndexMap<NodeIndex, NodeIndex> = IndexMap::new();

        for node_id in node_ids {
            let idx = Self::resolve_node_id(graph, *node_id)
                .ok_or_else(|| anyhow!("Node id '{}' not found in graph", node_id))?;
            if let Some(weight) = graph.graph.node_weight(idx) {
                let new_idx = new_graph.add_node(weight.clone());
                node_lookup.insert(*node_id, new_idx);
                reverse_lookup.insert(new_idx, *node_id);
                index_mapping.insert(idx, new_idx);
            }
        }

        for edge in graph.graph.edge_references() {
            if let (Some(&new_source), Some(&new_target)) = (
                index_mapping.get(&edge.source()),
                index_mapping.get(&edge.target()),
            ) {
                new_graph.add_edge(new_source, new_target, edge.weight().clone());
            }
        }

        Ok(GraphInstance {
            graph: new_graph,
            node_lookup,
            reverse_lookup,
            label: graph.label,
            attributes: graph.attributes.clone(),
        })
    }

    pub fn resolve_node_id(graph: &GraphInstance, node_id: NodeId) -> Option<NodeIndex> {
        graph.node_lookup.get(&node_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph_json() -> String {
        r#"{
            "label": 1,
            "nodes": [
                {"id": 0, "labels": [0]},
                {"id": 1, "labels": [1]},
                {"id": 2, "labels": [2], "attributes": [0.5]}
            ],
            "edges": [
                {"source": 0, "target": 1},
                {"source": 1, "target": 0},
                {"source": 1, "target": 2, "labels": [3]},
                {"source": 2, "target": 1, "labels": [3]}
            ]
        }"#
        .to_string()
    }

    #[test]
    fn load_json_graph_counts_match() {
        let graph = GraphLoader::from_json_str(&sample_graph_json()).expect("load graph");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.label, Some(1));
        let idx = GraphLoader::resolve_node_id(&graph, 2).expect("node 2");
        assert_eq!(graph.graph[idx].attributes, vec![0.5]);
    }

    #[test]
    fn unknown_edge_endpoint_is_rejected() {
        let json = r#"{"nodes": [{"id": 0}], "edges": [{"source": 0, "target": 7}]}"#;
        let err = GraphLoader::from_json_str(json).expect_err("dangling edge");
        assert!(err.to_string().contains("Unknown target node id: 7"));
    }

    #[test]
    fn induced_subgraph_preserves_structure() {
        let graph = GraphLoader::from_json_str(&sample_graph_json()).expect("load graph");
        let nodes: IndexSet<NodeId> = [0, 1].into_iter().collect();
        let subgraph = GraphLoader::induced_subgraph(&graph, &nodes).expect("subgraph");
        assert_eq!(subgraph.node_count(), 2);
        assert_eq!(subgraph.edge_count(), 2);
        assert!(subgraph.node_lookup.contains_key(&1));
        assert_eq!(subgraph.label, Some(1));
    }
}
