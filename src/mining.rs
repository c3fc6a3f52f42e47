//! Seam between a staged dataset and the pattern growth routine that consumes it.
//!
//! [`SampledGrowth`] is a baseline that grows BFS neighbourhoods from random seed
//! nodes and ranks them by how often the same shape recurs.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use indexmap::{IndexMap, IndexSet};
use log::info;
use petgraph::prelude::NodeIndex;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DecoderArgs;
use crate::datasets::TuDataset;
use crate::graph::{GraphInstance, GraphLoader, GraphWriter, NodeId, RawGraph};
use crate::wl::weisfeiler_lehman_signature;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Task {
    #[default]
    Graph,
    Node,
}

impl FromStr for Task {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "graph" => Ok(Task::Graph),
            "node" => Ok(Task::Node),
            other => Err(anyhow!("unknown task {other:?}, expected \"graph\" or \"node\"")),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Graph => f.write_str("graph"),
            Task::Node => f.write_str("node"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MinedPattern {
    pub graph: GraphInstance,
    /// Trials that produced this shape.
    pub support: usize,
    /// Seed node the pattern was grown from, kept for anchored runs.
    pub anchor: Option<NodeId>,
}

impl MinedPattern {
    pub fn size(&self) -> usize {
        self.graph.node_count()
    }
}

pub trait PatternGrowth {
    fn grow(&self, dataset: &TuDataset, task: Task, args: &DecoderArgs)
        -> Result<Vec<MinedPattern>>;
}

#[derive(Debug, Clone)]
pub struct SampledGrowth {
    pub wl_iterations: usize,
}

impl Default for SampledGrowth {
    fn default() -> Self {
        Self { wl_iterations: 3 }
    }
}

struct Sample {
    key: String,
    pattern: GraphInstance,
    anchor: Option<NodeId>,
}

impl PatternGrowth for SampledGrowth {
    fn grow(
        &self,
        dataset: &TuDataset,
        task: Task,
        args: &DecoderArgs,
    ) -> Result<Vec<MinedPattern>> {
        if args.n_trials == 0 {
            bail!("Trial count must be greater than zero");
        }
        if args.min_pattern_size == 0 {
            bail!("Minimum pattern size must be greater than zero");
        }
        if args.min_pattern_size > args.max_pattern_size {
            bail!(
                "Minimum pattern size {} exceeds maximum {}",
                args.min_pattern_size,
                args.max_pattern_size
            );
        }
        let graphs = dataset.graphs();
        if graphs.is_empty() {
            bail!("Dataset {} has no graphs", dataset.name());
        }

        let largest = graphs
            .iter()
            .enumerate()
            .max_by_key(|(idx, graph)| (graph.node_count(), std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let base_seed = args.seed.unwrap_or_else(random_seed);

        let samples: Vec<Sample> = (0..args.n_trials)
            .into_par_iter()
            .filter_map(|trial| {
                let mut rng =
                    Xoshiro256PlusPlus::seed_from_u64(base_seed.wrapping_add(trial as u64));
                let graph = match task {
                    Task::Graph => &graphs[rng.gen_range(0..graphs.len())],
                    Task::Node => &graphs[largest],
                };
                if graph.node_count() == 0 {
                    return None;
                }
                let start = NodeIndex::new(rng.gen_range(0..graph.node_count()));
                let size = rng.gen_range(args.min_pattern_size..=args.max_pattern_size);
                let visited = bfs_collect(graph, start, size);
                if visited.len() < args.min_pattern_size {
                    return None;
                }

                let node_ids: IndexSet<NodeId> = visited
                    .iter()
                    .filter_map(|idx| graph.node_id(*idx))
                    .collect();
                let pattern = GraphLoader::induced_subgraph(graph, &node_ids).ok()?;
                let mut key = weisfeiler_lehman_signature(&pattern, self.wl_iterations);
                let anchor = if args.node_anchored {
                    let labels = &graph.graph.node_weight(start)?.labels;
                    key.push_str(&format!(":{labels:?}"));
                    graph.node_id(start)
                } else {
                    None
                };
                Some(Sample {
                    key,
                    pattern,
                    anchor,
                })
            })
            .collect();

        let accepted = samples.len();
        let mut groups: IndexMap<String, (Sample, usize)> = IndexMap::new();
        for sample in samples {
            match groups.get_mut(&sample.key) {
                Some((_, support)) => *support += 1,
                None => {
                    groups.insert(sample.key.clone(), (sample, 1));
                }
            }
        }
        let distinct = groups.len();

        let mut by_size: BTreeMap<usize, Vec<(Sample, usize)>> = BTreeMap::new();
        for (_, group) in groups {
            by_size
                .entry(group.0.pattern.node_count())
                .or_default()
                .push(group);
        }

        let mut patterns = Vec::new();
        for (_, mut bucket) in by_size {
            bucket.sort_by(|(left, left_support), (right, right_support)| {
                right_support
                    .cmp(left_support)
                    .then_with(|| left.key.cmp(&right.key))
            });
            patterns.extend(bucket.into_iter().take(args.out_batch_size).map(
                |(sample, support)| MinedPattern {
                    graph: sample.pattern,
                    support,
                    anchor: sample.anchor,
                },
            ));
        }

        info!(
            "Pattern growth on {} ({} task): {} trials, {} accepted, {} distinct, {} kept",
            dataset.name(),
            task,
            args.n_trials,
            accepted,
            distinct,
            patterns.len()
        );
        Ok(patterns)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    pub support: usize,
    #[serde(default)]
    pub anchor: Option<NodeId>,
    pub graph: RawGraph,
}

/// Write patterns as a JSON array of [`PatternRecord`], creating parent directories.
pub fn write_patterns(path: &Path, patterns: &[MinedPattern]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create pattern output directory {:?}", parent))?;
    }
    let records: Vec<PatternRecord> = patterns
        .iter()
        .map(|pattern| PatternRecord {
            support: pattern.support,
            anchor: pattern.anchor,
            graph: GraphWriter::to_raw_graph(&pattern.graph),
        })
        .collect();

    let file = File::create(path).with_context(|| format!("create pattern file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records)
        .with_context(|| format!("serialize patterns to {:?}", path))?;
    writer.flush()?;
    Ok(())
}

fn bfs_collect(graph: &GraphInstance, start: NodeIndex, limit: usize) -> IndexSet<NodeIndex> {
    let mut visited: IndexSet<NodeIndex> = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        if visited.len() >= limit {
            break;
        }
        for neighbor in graph.graph.neighbors(node) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
                if visited.len() >= limit {
                    break;
                }
            }
        }
    }

    visited
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
