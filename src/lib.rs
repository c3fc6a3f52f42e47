pub mod cache;
pub mod config;
pub mod datasets;
pub mod errors;
pub mod graph;
pub mod mining;
pub mod staging;
pub mod wl;

pub use cache::{CacheMetadata, ProcessedCache};
pub use config::{Cli, DecoderArgs, EncoderArgs, SearchStrategy};
pub use datasets::{DatasetLoader, DatasetOptions, DatasetStats, TuDataset};
pub use errors::StageError;
pub use graph::{GraphInstance, GraphLoader, GraphWriter};
pub use mining::{write_patterns, MinedPattern, PatternGrowth, SampledGrowth, Task};
pub use staging::{
    load_dataset, load_dataset_with, locate, locate_with, stage, stage_with, DatasetStager, FileSet,
    OPTIONAL_FILES, REQUIRED_FILES,
};
