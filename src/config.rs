use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use crate::datasets::DatasetOptions;
use crate::mining::Task;

/// Stage a local TU dataset and hand it to pattern growth.
#[derive(Debug, Clone, Parser)]
#[command(name = "tustage", version)]
#[command(about = "Stage a local TU dataset and run pattern growth", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub encoder: EncoderArgs,

    #[command(flatten)]
    pub decoder: DecoderArgs,
}

/// Settings of the subgraph encoder. Carried through to the decoder untouched.
#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Encoder")]
pub struct EncoderArgs {
    /// Path of the trained encoder checkpoint
    #[arg(long, alias = "model_path", default_value = "ckpt/model.pt")]
    pub model_path: PathBuf,

    #[arg(long, alias = "conv_type", default_value = "SAGE")]
    pub conv_type: String,

    #[arg(long, alias = "n_layers", default_value_t = 8)]
    pub n_layers: usize,

    #[arg(long, alias = "hidden_dim", default_value_t = 64)]
    pub hidden_dim: usize,

    #[arg(long, alias = "batch_size", default_value_t = 64)]
    pub batch_size: usize,
}

impl Default for EncoderArgs {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("ckpt/model.pt"),
            conv_type: "SAGE".to_string(),
            n_layers: 8,
            hidden_dim: 64,
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchStrategy {
    #[default]
    Greedy,
    Mcts,
}

#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Decoder")]
pub struct DecoderArgs {
    /// Directory holding the TU text files (A.txt, graph_indicator.txt, ...)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Where mined patterns are written as JSON
    #[arg(long, alias = "out_path", default_value = "results/out-patterns.json")]
    pub out_path: PathBuf,

    #[arg(long, alias = "n_trials", default_value_t = 1000)]
    pub n_trials: usize,

    #[arg(long, alias = "min_pattern_size", default_value_t = 5)]
    pub min_pattern_size: usize,

    #[arg(long, alias = "max_pattern_size", default_value_t = 20)]
    pub max_pattern_size: usize,

    /// Patterns kept per pattern size
    #[arg(long, alias = "out_batch_size", default_value_t = 10)]
    pub out_batch_size: usize,

    #[arg(long, alias = "search_strategy", value_enum, default_value_t = SearchStrategy::Greedy)]
    pub search_strategy: SearchStrategy,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Distinguish patterns by the node they were grown from
    #[arg(long, alias = "node_anchored")]
    pub node_anchored: bool,

    #[arg(long, value_enum, default_value_t = Task::Graph)]
    pub task: Task,

    #[arg(long, alias = "use_node_attr")]
    pub use_node_attr: bool,

    #[arg(long, alias = "use_edge_attr")]
    pub use_edge_attr: bool,
}

impl Default for DecoderArgs {
    fn default() -> Self {
        Self {
            dataset: PathBuf::new(),
            out_path: PathBuf::from("results/out-patterns.json"),
            n_trials: 1000,
            min_pattern_size: 5,
            max_pattern_size: 20,
            out_batch_size: 10,
            search_strategy: SearchStrategy::Greedy,
            seed: None,
            node_anchored: false,
            task: Task::Graph,
            use_node_attr: false,
            use_edge_attr: false,
        }
    }
}

impl DecoderArgs {
    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            use_node_attr: self.use_node_attr,
            use_edge_attr: self.use_edge_attr,
        }
    }

    /// Requested settings the sampled growth does not honour.
    pub fn unsupported_settings(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.search_strategy != SearchStrategy::default() {
            notes.push(format!(
                "search strategy {:?} is not implemented, falling back to sampled growth",
                self.search_strategy
            ));
        }
        notes
    }
}
