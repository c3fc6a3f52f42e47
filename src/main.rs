use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use tustage::{
    load_dataset_with, write_patterns, Cli, FileSet, PatternGrowth, SampledGrowth,
};

const PLOT_DIR: &str = "plots/cluster";
const OUTPUT_ROOT: &str = "./";
const DATASET_NAME: &str = "DS";

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    fs::create_dir_all(PLOT_DIR).with_context(|| format!("ensure plot directory {PLOT_DIR}"))?;

    let args = &cli.decoder;
    info!("Using dataset in {}", args.dataset.display());
    debug!("Encoder settings: {:?}", cli.encoder);
    debug!(
        "Decoder settings: search {:?}, trials {}, sizes {}..={}, batch {}",
        args.search_strategy,
        args.n_trials,
        args.min_pattern_size,
        args.max_pattern_size,
        args.out_batch_size
    );
    for note in args.unsupported_settings() {
        warn!("{}", note);
    }

    let dataset = load_dataset_with(
        &args.dataset,
        Path::new(OUTPUT_ROOT),
        DATASET_NAME,
        &FileSet::default(),
        args.dataset_options(),
    )
    .with_context(|| format!("load dataset from {:?}", args.dataset))?;

    let stats = dataset.stats();
    info!(
        "Dataset {}: {} graphs, avg nodes {:.2}, avg edges {:.2}, classes {}, node labels {}",
        dataset.name(),
        stats.graphs,
        stats.avg_nodes,
        stats.avg_edges,
        dataset.num_classes(),
        dataset.num_node_labels()
    );

    let patterns = SampledGrowth::default().grow(&dataset, args.task, args)?;
    write_patterns(&args.out_path, &patterns)
        .with_context(|| format!("write patterns to {:?}", args.out_path))?;
    info!(
        "Wrote {} patterns to {}",
        patterns.len(),
        args.out_path.display()
    );

    Ok(())
}
