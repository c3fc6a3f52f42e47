#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const EDGES: &str = "1, 2\n2, 1\n2, 3\n3, 2\n4, 5\n5, 4\n";
pub const GRAPH_INDICATOR: &str = "1\n1\n1\n2\n2\n";
pub const GRAPH_LABELS: &str = "1\n-1\n";
pub const NODE_LABELS: &str = "2\n3\n2\n3\n3\n";
pub const NODE_ATTRIBUTES: &str = "0.5, 1.0\n0.0, 0.0\n1.5, 2.0\n3.0, 1.0\n2.0, 2.0\n";
pub const EDGE_LABELS: &str = "1\n1\n2\n2\n1\n1\n";

/// Two graphs: a 3-node path labelled class 1 and a single edge labelled class -1.
pub fn write_required(dir: &Path) {
    fs::write(dir.join("A.txt"), EDGES).expect("write A.txt");
    fs::write(dir.join("graph_indicator.txt"), GRAPH_INDICATOR).expect("write indicator");
    fs::write(dir.join("graph_labels.txt"), GRAPH_LABELS).expect("write graph labels");
    fs::write(dir.join("node_labels.txt"), NODE_LABELS).expect("write node labels");
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap_or_else(|err| panic!("write {name}: {err}"));
}

pub fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("list directory")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
