use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::cache::{raw_fingerprint, ProcessedCache};
use crate::errors::StageError;
use crate::graph::{AttributeSelection, GraphInstance, GraphLoader, RawGraph, TuRawData};
use crate::staging::{raw_dir, staged_name, FileSet};

const DEFAULT_ROOT: &str = "datasets";

/// Controls which optional attribute tables are kept when loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOptions {
    pub use_node_attr: bool,
    pub use_edge_attr: bool,
}

impl From<DatasetOptions> for AttributeSelection {
    fn from(options: DatasetOptions) -> Self {
        AttributeSelection {
            node_attributes: options.use_node_attr,
            edge_attributes: options.use_edge_attr,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DatasetStats {
    pub graphs: usize,
    pub nodes: usize,
    pub edges: usize,
    pub avg_nodes: f64,
    pub avg_edges: f64,
}

/// A TU dataset staged under `<root>/<name>/raw`, parsed into one graph per graph id.
#[derive(Debug, Clone)]
pub struct TuDataset {
    root: PathBuf,
    name: String,
    options: DatasetOptions,
    graphs: Vec<GraphInstance>,
    from_cache: bool,
}

impl TuDataset {
    /// Open the dataset, reusing `<root>/<name>/processed` when it matches the raw files.
    pub fn open(root: impl AsRef<Path>, name: &str, options: DatasetOptions) -> Result<Self> {
        Self::open_with(root, name, &FileSet::default(), options)
    }

    /// Like [`TuDataset::open`], requiring and fingerprinting the files named by `files`.
    pub fn open_with(
        root: impl AsRef<Path>,
        name: &str,
        files: &FileSet,
        options: DatasetOptions,
    ) -> Result<Self> {
        let root = root.as_ref();
        let raw = raw_dir(root, name);
        let complete = files
            .required()
            .iter()
            .all(|file| raw.join(staged_name(name, file)).is_file());
        if !complete {
            return Err(StageError::raw_files_missing(raw).into());
        }

        let fingerprint = raw_fingerprint(&raw, name, files)
            .with_context(|| format!("fingerprint raw files in {:?}", raw))?;
        let cache = ProcessedCache::new(root.join(name));

        let (raw_graphs, from_cache) = match cache.load(&fingerprint, &options)? {
            Some(graphs) => (graphs, true),
            None => {
                let graphs = TuRawData::read(&raw, name)
                    .and_then(|data| data.into_raw_graphs(options.into()))
                    .with_context(|| format!("process raw dataset {:?} in {:?}", name, raw))?;
                cache.store(&fingerprint, &options, &graphs)?;
                (graphs, false)
            }
        };

        let graphs = raw_graphs
            .into_iter()
            .enumerate()
            .map(|(idx, raw_graph)| {
                GraphLoader::from_raw_graph(raw_graph)
                    .with_context(|| format!("build graph {} of dataset {:?}", idx + 1, name))
            })
            .collect::<Result<Vec<_>>>()?;

        let dataset = Self {
            root: root.to_path_buf(),
            name: name.to_string(),
            options,
            graphs,
            from_cache,
        };
        let stats = dataset.stats();
        info!(
            "Dataset {}: {} graphs, {} nodes, {} edges ({})",
            dataset.name,
            stats.graphs,
            stats.nodes,
            stats.edges,
            if from_cache { "processed cache" } else { "raw files" }
        );
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> DatasetOptions {
        self.options
    }

    pub fn raw_dir(&self) -> PathBuf {
        raw_dir(&self.root, &self.name)
    }

    pub fn processed_dir(&self) -> PathBuf {
        ProcessedCache::new(self.root.join(&self.name))
            .dir()
            .to_path_buf()
    }

    pub fn loaded_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GraphInstance> {
        self.graphs.get(index)
    }

    pub fn graphs(&self) -> &[GraphInstance] {
        &self.graphs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphInstance> {
        self.graphs.iter()
    }

    /// Number of distinct graph classes.
    pub fn num_classes(&self) -> usize {
        self.graphs
            .iter()
            .filter_map(|graph| graph.label)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Width of the one-hot encoding of all node label columns.
    pub fn num_node_labels(&self) -> usize {
        label_width(
            self.graphs
                .iter()
                .flat_map(|graph| graph.graph.node_weights())
                .map(|node| node.labels.as_slice()),
        )
    }

    pub fn num_edge_labels(&self) -> usize {
        label_width(
            self.graphs
                .iter()
                .flat_map(|graph| graph.graph.edge_weights())
                .map(|edge| edge.labels.as_slice()),
        )
    }

    pub fn num_node_attributes(&self) -> usize {
        self.graphs
            .iter()
            .flat_map(|graph| graph.graph.node_weights())
            .map(|node| node.attributes.len())
            .max()
            .unwrap_or(0)
    }

    pub fn num_edge_attributes(&self) -> usize {
        self.graphs
            .iter()
            .flat_map(|graph| graph.graph.edge_weights())
            .map(|edge| edge.attributes.len())
            .max()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> DatasetStats {
        let graphs = self.graphs.len();
        let nodes: usize = self.graphs.iter().map(GraphInstance::node_count).sum();
        let edges: usize = self.graphs.iter().map(GraphInstance::edge_count).sum();
        let (avg_nodes, avg_edges) = if graphs > 0 {
            (nodes as f64 / graphs as f64, edges as f64 / graphs as f64)
        } else {
            (0.0, 0.0)
        };
        DatasetStats {
            graphs,
            nodes,
            edges,
            avg_nodes,
            avg_edges,
        }
    }

    /// Serialized copies of every graph, in dataset order.
    pub fn to_raw_graphs(&self) -> Vec<RawGraph> {
        self.graphs
            .iter()
            .map(crate::graph::GraphWriter::to_raw_graph)
            .collect()
    }
}

impl<'a> IntoIterator for &'a TuDataset {
    type Item = &'a GraphInstance;
    type IntoIter = std::slice::Iter<'a, GraphInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.graphs.iter()
    }
}

/// Opens already staged datasets below a fixed root.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    root: PathBuf,
    options: DatasetOptions,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl DatasetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: DatasetOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DatasetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn load(&self, name: &str) -> Result<TuDataset> {
        TuDataset::open(&self.root, name, self.options)
            .with_context(|| format!("load dataset {:?} from {:?}", name, self.root))
    }
}

fn label_width<'a>(rows: impl Iterator<Item = &'a [i64]>) -> usize {
    let mut column_max: Vec<i64> = Vec::new();
    for row in rows {
        for (column, value) in row.iter().enumerate() {
            match column_max.get_mut(column) {
                Some(max) => *max = (*max).max(*value),
                None => column_max.push(*value),
            }
        }
    }
    column_max.iter().map(|max| (*max + 1).max(0) as usize).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_width_sums_columns() {
        let rows: Vec<Vec<i64>> = vec![vec![0, 2], vec![3, 0], vec![1]];
        assert_eq!(label_width(rows.iter().map(Vec::as_slice)), 4 + 3);
        assert_eq!(label_width(std::iter::empty()), 0);
    }

    #[test]
    fn unstaged_root_reports_raw_files_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = TuDataset::open(dir.path(), "DS", DatasetOptions::default())
            .expect_err("nothing staged");
        match err.downcast_ref::<StageError>() {
            Some(StageError::RawFilesMissing { raw_dir }) => {
                assert_eq!(raw_dir, &dir.path().join("DS").join("raw"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
