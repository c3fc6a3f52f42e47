use petgraph::visit::EdgeRef;

use crate::graph::model::{GraphInstance, RawEdge, RawGraph, RawNode};

/// Exports graphs back to the JSON form [`GraphLoader`](crate::graph::GraphLoader) reads.
pub struct GraphWriter;

impl GraphWriter {
    pub fn to_raw_graph(graph: &GraphInstance) -> RawGraph {
        let nodes = graph
            .node_lookup
            .iter()
            .filter_map(|(id, idx)| {
                graph.graph.node_weight(*idx).map(|weight| RawNode {
                    id: *id,
                    attributes: weight.clone(),
                })
            })
            .collect();

        let edges = graph
            .graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = graph.node_id(edge_ref.source())?;
                let target = graph.node_id(edge_ref.target())?;
                Some(RawEdge {
                    source,
                    target,
                    attributes: edge_ref.weight().clone(),
                })
            })
            .collect();

        RawGraph {
            nodes,
            edges,
            label: graph.label,
            attributes: graph.attributes.clone(),
        }
    }
}
