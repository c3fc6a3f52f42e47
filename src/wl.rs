use petgraph::visit::NodeIndexable;

use crate::graph::GraphInstance;

/// Weisfeiler-Lehman hash of a graph's node labels and structure.
///
/// Colours are content hashes rather than per-graph palette indices, so signatures
/// are comparable across graphs. Equal signatures are necessary, not sufficient, for
/// isomorphism.
pub fn weisfeiler_lehman_signature(graph: &GraphInstance, iterations: usize) -> String {
    let mut colors = initial_colors(graph);
    for _ in 0..iterations {
        colors = refine_colors(graph, &colors);
    }

    let mut histogram = colors;
    histogram.sort_unstable();
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(graph.node_count() as u64).to_le_bytes());
    hasher.update(&(graph.edge_count() as u64).to_le_bytes());
    for color in histogram {
        hasher.update(&color.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn initial_colors(graph: &GraphInstance) -> Vec<u64> {
    graph
        .graph
        .node_indices()
        .map(|node| {
            let mut hasher = blake3::Hasher::new();
            if let Some(attrs) = graph.graph.node_weight(node) {
                for label in &attrs.labels {
                    hasher.update(&label.to_le_bytes());
                }
            }
            hasher.update(b"|");
            hasher.update(&(graph.graph.neighbors(node).count() as u64).to_le_bytes());
            truncate(hasher.finalize())
        })
        .collect()
}

fn refine_colors(graph: &GraphInstance, colors: &[u64]) -> Vec<u64> {
    graph
        .graph
        .node_indices()
        .map(|node| {
            let mut neighbor_colors: Vec<u64> = graph
                .graph
                .neighbors(node)
                .map(|neighbor| colors[graph.graph.to_index(neighbor)])
                .collect();
            neighbor_colors.sort_unstable();

            let mut hasher = blake3::Hasher::new();
            hasher.update(&colors[graph.graph.to_index(node)].to_le_bytes());
            for color in neighbor_colors {
                hasher.update(&color.to_le_bytes());
            }
            truncate(hasher.finalize())
        })
        .collect()
}

fn truncate(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
