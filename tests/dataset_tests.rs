mod common;

use std::fs;
use std::thread;
use std::time::Duration;

use tustage::staging::raw_dir;
use tustage::{
    load_dataset, load_dataset_with, DatasetLoader, DatasetOptions, DatasetStager, FileSet,
    StageError, TuDataset, OPTIONAL_FILES, REQUIRED_FILES,
};

use common::{write_file, write_required, EDGE_LABELS, NODE_ATTRIBUTES};

#[test]
fn staged_dataset_splits_into_graphs() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());

    let dataset = load_dataset(input.path(), output.path(), "DS").expect("load dataset");
    assert_eq!(dataset.len(), 2);
    assert!(!dataset.loaded_from_cache());

    let first = dataset.get(0).expect("first graph");
    let second = dataset.get(1).expect("second graph");
    assert_eq!((first.node_count(), first.edge_count()), (3, 4));
    assert_eq!((second.node_count(), second.edge_count()), (2, 2));

    assert_eq!(first.label, Some(1));
    assert_eq!(second.label, Some(0));
    assert_eq!(dataset.num_classes(), 2);

    let labels: Vec<i64> = first
        .graph
        .node_weights()
        .flat_map(|node| node.labels.clone())
        .collect();
    assert_eq!(labels, vec![0, 1, 0]);
    assert_eq!(dataset.num_node_labels(), 2);
    assert!(second.node_lookup.contains_key(&3));

    let stats = dataset.stats();
    assert_eq!(stats.nodes, 5);
    assert_eq!(stats.edges, 6);
    assert!((stats.avg_nodes - 2.5).abs() < 1e-9);
}

#[test]
fn attributes_follow_dataset_options() {
    let input = tempfile::tempdir().expect("input dir");
    write_required(input.path());
    write_file(input.path(), "node_attributes.txt", NODE_ATTRIBUTES);
    write_file(input.path(), "edge_labels.txt", EDGE_LABELS);

    let plain_out = tempfile::tempdir().expect("output dir");
    let plain = load_dataset(input.path(), plain_out.path(), "DS").expect("load plain");
    assert_eq!(plain.num_node_attributes(), 0);
    assert_eq!(plain.num_edge_labels(), 2);

    let attr_out = tempfile::tempdir().expect("output dir");
    let options = DatasetOptions {
        use_node_attr: true,
        use_edge_attr: false,
    };
    let with_attrs = load_dataset_with(
        input.path(),
        attr_out.path(),
        "DS",
        &FileSet::default(),
        options,
    )
    .expect("load with attributes");
    assert_eq!(with_attrs.num_node_attributes(), 2);
    let node = with_attrs
        .get(0)
        .and_then(|graph| graph.graph.node_weights().next())
        .expect("first node");
    assert_eq!(node.attributes, vec![0.5, 1.0]);
}

#[test]
fn reopening_uses_processed_cache_until_raw_files_change() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());

    let first = load_dataset(input.path(), output.path(), "DS").expect("first load");
    assert!(!first.loaded_from_cache());
    assert!(first.processed_dir().join("data.json").is_file());

    let second = TuDataset::open(output.path(), "DS", DatasetOptions::default()).expect("reopen");
    assert!(second.loaded_from_cache());
    assert_eq!(second.to_raw_graphs(), first.to_raw_graphs());

    thread::sleep(Duration::from_millis(20));
    let labels = raw_dir(output.path(), "DS").join("DS_graph_labels.txt");
    fs::write(&labels, "10\n10\n").expect("rewrite labels");

    let third = TuDataset::open(output.path(), "DS", DatasetOptions::default()).expect("reload");
    assert!(!third.loaded_from_cache());
    assert_eq!(third.num_classes(), 1);
}

#[test]
fn repeated_staging_of_same_input_hits_processed_cache() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());

    let first = load_dataset(input.path(), output.path(), "DS").expect("first load");
    assert!(!first.loaded_from_cache());

    thread::sleep(Duration::from_millis(20));
    let second = load_dataset(input.path(), output.path(), "DS").expect("second load");
    assert!(second.loaded_from_cache());
    assert_eq!(second.to_raw_graphs(), first.to_raw_graphs());
}

#[test]
fn custom_required_files_are_checked_when_opening() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());
    write_file(input.path(), "node_attributes.txt", NODE_ATTRIBUTES);

    let files = FileSet::new(
        REQUIRED_FILES.into_iter().chain(["node_attributes.txt"]),
        OPTIONAL_FILES
            .into_iter()
            .filter(|name| *name != "node_attributes.txt"),
    );
    let dataset = DatasetStager::new(output.path(), "DS")
        .with_files(files.clone())
        .with_options(DatasetOptions {
            use_node_attr: true,
            use_edge_attr: false,
        })
        .load(input.path())
        .expect("load with custom set");
    assert_eq!(dataset.num_node_attributes(), 2);

    let raw = raw_dir(output.path(), "DS");
    fs::remove_file(raw.join("DS_node_attributes.txt")).expect("remove staged attributes");
    let err = TuDataset::open_with(output.path(), "DS", &files, DatasetOptions::default())
        .expect_err("custom required file missing");
    assert!(matches!(
        err.downcast_ref::<StageError>(),
        Some(StageError::RawFilesMissing { .. })
    ));
    TuDataset::open(output.path(), "DS", DatasetOptions::default())
        .expect("default set does not require attributes");
}

#[test]
fn inconsistent_raw_files_fail_to_load() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());
    write_file(input.path(), "A.txt", "1, 4\n4, 1\n");

    let err = load_dataset(input.path(), output.path(), "DS").expect_err("cross graph edge");
    let message = format!("{err:#}");
    assert!(message.contains("connects graph 1 to graph 2"), "{message}");
}

#[test]
fn short_label_file_is_rejected() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());
    write_file(input.path(), "node_labels.txt", "1\n2\n");

    let err = load_dataset(input.path(), output.path(), "DS").expect_err("short labels");
    assert!(format!("{err:#}").contains("node_labels.txt has 2 records, expected 5"));
}

#[test]
fn loader_opens_previously_staged_dataset() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_required(input.path());
    load_dataset(input.path(), output.path(), "DS").expect("stage and load");

    let loader = DatasetLoader::new(output.path());
    let dataset = loader.load("DS").expect("loader load");
    assert_eq!(dataset.len(), 2);
    assert!(loader.load("MISSING").is_err());
}
