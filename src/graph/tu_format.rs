//! Reader for the TU text format staged under a dataset's raw directory.
//!
//! Files hold one record per line with comma separated values. Node and graph
//! ids are 1-based on disk and 0-based in memory.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use crate::graph::model::{EdgeAttributes, NodeAttributes, RawEdge, RawGraph, RawNode};
use crate::staging::staged_name;

pub const EDGES_FILE: &str = "A.txt";
pub const GRAPH_INDICATOR_FILE: &str = "graph_indicator.txt";
pub const GRAPH_LABELS_FILE: &str = "graph_labels.txt";
pub const NODE_LABELS_FILE: &str = "node_labels.txt";
pub const EDGE_LABELS_FILE: &str = "edge_labels.txt";
pub const EDGE_ATTRIBUTES_FILE: &str = "edge_attributes.txt";
pub const NODE_ATTRIBUTES_FILE: &str = "node_attributes.txt";
pub const GRAPH_ATTRIBUTES_FILE: &str = "graph_attributes.txt";

/// Contents of a staged raw directory, one entry per non-blank record.
#[derive(Debug, Clone, Default)]
pub struct TuRawData {
    pub edges: Vec<(usize, usize)>,
    pub graph_indicator: Vec<usize>,
    pub graph_labels: Vec<i64>,
    pub node_labels: Vec<Vec<i64>>,
    pub edge_labels: Option<Vec<Vec<i64>>>,
    pub edge_attributes: Option<Vec<Vec<f64>>>,
    pub node_attributes: Option<Vec<Vec<f64>>>,
    pub graph_attributes: Option<Vec<Vec<f64>>>,
}

/// Which optional per-node / per-edge attributes survive conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeSelection {
    pub node_attributes: bool,
    pub edge_attributes: bool,
}

impl TuRawData {
    pub fn read(raw_dir: &Path, name: &str) -> Result<Self> {
        let path = |file: &str| raw_dir.join(staged_name(name, file));

        let edges = read_rows::<i64>(&path(EDGES_FILE))?
            .into_iter()
            .enumerate()
            .map(|(line, row)| -> Result<(usize, usize)> {
                match row.as_slice() {
                    [source, target] => Ok((to_index(*source)?, to_index(*target)?)),
                    _ => Err(anyhow!(
                        "edge record {} must hold exactly two node ids, found {}",
                        line + 1,
                        row.len()
                    )),
                }
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("parse edge list {:?}", path(EDGES_FILE)))?;

        let graph_indicator = single_column(read_rows::<i64>(&path(GRAPH_INDICATOR_FILE))?)
            .and_then(|ids| ids.into_iter().map(to_index).collect())
            .with_context(|| format!("parse {:?}", path(GRAPH_INDICATOR_FILE)))?;

        let graph_labels = single_column(read_rows::<i64>(&path(GRAPH_LABELS_FILE))?)
            .with_context(|| format!("parse {:?}", path(GRAPH_LABELS_FILE)))?;

        let mut node_labels = read_rows::<i64>(&path(NODE_LABELS_FILE))?;
        shift_columns(&mut node_labels)
            .with_context(|| format!("parse {:?}", path(NODE_LABELS_FILE)))?;

        let mut edge_labels = read_optional_rows::<i64>(&path(EDGE_LABELS_FILE))?;
        if let Some(rows) = edge_labels.as_mut() {
            shift_columns(rows).with_context(|| format!("parse {:?}", path(EDGE_LABELS_FILE)))?;
        }

        let data = Self {
            edges,
            graph_indicator,
            graph_labels,
            node_labels,
            edge_labels,
            edge_attributes: read_optional_rows(&path(EDGE_ATTRIBUTES_FILE))?,
            node_attributes: read_optional_rows(&path(NODE_ATTRIBUTES_FILE))?,
            graph_attributes: read_optional_rows(&path(GRAPH_ATTRIBUTES_FILE))?,
        };
        debug!(
            "Read raw dataset {}: {} nodes, {} edges, {} graphs",
            name,
            data.node_count(),
            data.edges.len(),
            data.graph_count()
        );
        Ok(data)
    }

    pub fn node_count(&self) -> usize {
        self.graph_indicator.len()
    }

    pub fn graph_count(&self) -> usize {
        self.graph_indicator
            .iter()
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
            .max(self.graph_labels.len())
    }

    fn validate(&self) -> Result<()> {
        let nodes = self.node_count();
        let edges = self.edges.len();
        let graphs = self.graph_count();

        expect_len(NODE_LABELS_FILE, self.node_labels.len(), nodes)?;
        expect_len(GRAPH_LABELS_FILE, self.graph_labels.len(), graphs)?;
        if let Some(rows) = &self.node_attributes {
            expect_len(NODE_ATTRIBUTES_FILE, rows.len(), nodes)?;
        }
        if let Some(rows) = &self.edge_labels {
            expect_len(EDGE_LABELS_FILE, rows.len(), edges)?;
        }
        if let Some(rows) = &self.edge_attributes {
            expect_len(EDGE_ATTRIBUTES_FILE, rows.len(), edges)?;
        }
        if let Some(rows) = &self.graph_attributes {
            expect_len(GRAPH_ATTRIBUTES_FILE, rows.len(), graphs)?;
        }

        for (line, (source, target)) in self.edges.iter().enumerate() {
            let (Some(source_graph), Some(target_graph)) = (
                self.graph_indicator.get(*source),
                self.graph_indicator.get(*target),
            ) else {
                bail!(
                    "edge {} references node beyond the {} indexed nodes",
                    line + 1,
                    nodes
                );
            };
            if source_graph != target_graph {
                bail!(
                    "edge {} connects graph {} to graph {}",
                    line + 1,
                    source_graph + 1,
                    target_graph + 1
                );
            }
        }
        Ok(())
    }

    /// Split the flat tables into one serialized graph per graph id.
    ///
    /// Fails when record counts disagree or an edge leaves its graph. Self loops
    /// are dropped and repeated `(source, target)` pairs keep their first record.
    pub fn into_raw_graphs(self, selection: AttributeSelection) -> Result<Vec<RawGraph>> {
        self.validate()?;
        let classes = dense_classes(&self.graph_labels);
        let mut graphs: Vec<RawGraph> = (0..self.graph_count())
            .map(|graph| RawGraph {
                nodes: Vec::new(),
                edges: Vec::new(),
                label: classes.get(graph).copied(),
                attributes: self
                    .graph_attributes
                    .as_ref()
                    .and_then(|rows| rows.get(graph).cloned())
                    .unwrap_or_default(),
            })
            .collect();

        for (node, graph) in self.graph_indicator.iter().enumerate() {
            let attributes = NodeAttributes {
                labels: self.node_labels.get(node).cloned().unwrap_or_default(),
                attributes: if selection.node_attributes {
                    row_or_empty(&self.node_attributes, node)
                } else {
                    Vec::new()
                },
            };
            graphs[*graph].nodes.push(RawNode {
                id: node,
                attributes,
            });
        }

        let mut seen = HashSet::with_capacity(self.edges.len());
        for (edge, (source, target)) in self.edges.iter().enumerate() {
            if source == target || !seen.insert((*source, *target)) {
                continue;
            }
            let attributes = EdgeAttributes {
                labels: row_or_empty(&self.edge_labels, edge),
                attributes: if selection.edge_attributes {
                    row_or_empty(&self.edge_attributes, edge)
                } else {
                    Vec::new()
                },
            };
            graphs[self.graph_indicator[*source]].edges.push(RawEdge {
                source: *source,
                target: *target,
                attributes,
            });
        }

        Ok(graphs)
    }
}

fn read_rows<T>(path: &Path) -> Result<Vec<Vec<T>>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let content = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token.parse::<T>().with_context(|| {
                        format!("parse value {:?} on line {} of {:?}", token, line_no + 1, path)
                    })
                })
                .collect()
        })
        .collect()
}

fn read_optional_rows<T>(path: &Path) -> Result<Option<Vec<Vec<T>>>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if path.is_file() {
        read_rows(path).map(Some)
    } else {
        Ok(None)
    }
}

fn single_column(rows: Vec<Vec<i64>>) -> Result<Vec<i64>> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| match row.as_slice() {
            [value] => Ok(*value),
            _ => Err(anyhow!(
                "record {} must hold a single value, found {}",
                line + 1,
                row.len()
            )),
        })
        .collect()
}

fn to_index(id: i64) -> Result<usize> {
    if id < 1 {
        bail!("ids are 1-based, found {}", id);
    }
    Ok((id - 1) as usize)
}

fn expect_len(file: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        bail!("{} has {} records, expected {}", file, actual, expected);
    }
    Ok(())
}

/// Shift every column so its smallest value becomes zero.
fn shift_columns(rows: &mut [Vec<i64>]) -> Result<()> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for column in 0..width {
        let min = rows
            .iter()
            .filter_map(|row| row.get(column))
            .min()
            .copied()
            .unwrap_or(0);
        for (line, row) in rows.iter_mut().enumerate() {
            if let Some(value) = row.get_mut(column) {
                let original = *value;
                *value = original.checked_sub(min).ok_or_else(|| {
                    anyhow!(
                        "label {} in column {} of record {} overflows when shifted by {}",
                        original,
                        column + 1,
                        line + 1,
                        min
                    )
                })?;
            }
        }
    }
    Ok(())
}

fn dense_classes(labels: &[i64]) -> Vec<usize> {
    let ordered: Vec<i64> = labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    labels
        .iter()
        .filter_map(|label| ordered.binary_search(label).ok())
        .collect()
}

fn row_or_empty<T: Clone>(rows: &Option<Vec<Vec<T>>>, index: usize) -> Vec<T> {
    rows.as_ref()
        .and_then(|rows| rows.get(index).cloned())
        .unwrap_or_default()
}
