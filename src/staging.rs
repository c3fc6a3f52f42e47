use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use crate::datasets::{DatasetOptions, TuDataset};
use crate::errors::StageError;

/// Files every TU dataset must provide.
pub const REQUIRED_FILES: [&str; 4] = [
    "A.txt",
    "graph_indicator.txt",
    "graph_labels.txt",
    "node_labels.txt",
];

/// Files picked up when present.
pub const OPTIONAL_FILES: [&str; 4] = [
    "edge_labels.txt",
    "edge_attributes.txt",
    "node_attributes.txt",
    "graph_attributes.txt",
];

const RAW_SUBDIR: &str = "raw";
const SOURCE_EXTENSION: &str = "txt";

/// Canonical filenames the stager looks for in an input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    required: Vec<String>,
    optional: Vec<String>,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new(REQUIRED_FILES, OPTIONAL_FILES)
    }
}

impl FileSet {
    pub fn new<R, O>(required: R, optional: O) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Every name a staged raw directory may hold for this set.
    ///
    /// Includes the TU layout names the reader opens even when the set omits them.
    pub fn tracked_names(&self) -> IndexSet<&str> {
        self.required
            .iter()
            .chain(&self.optional)
            .map(String::as_str)
            .chain(REQUIRED_FILES)
            .chain(OPTIONAL_FILES)
            .collect()
    }
}

/// `<output_root>/<name>/raw`
pub fn raw_dir(output_root: impl AsRef<Path>, name: &str) -> PathBuf {
    output_root.as_ref().join(name).join(RAW_SUBDIR)
}

/// Name a source file receives once staged: `<name>_<file>`.
pub fn staged_name(name: &str, file: &str) -> String {
    format!("{name}_{file}")
}

/// Find the canonical TU files in `input_dir`.
///
/// Required files come first in [`REQUIRED_FILES`] order, followed by whichever
/// [`OPTIONAL_FILES`] exist. Anything else in the directory is ignored.
pub fn locate(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    locate_with(input_dir, &FileSet::default())
}

pub fn locate_with(input_dir: impl AsRef<Path>, files: &FileSet) -> Result<Vec<PathBuf>> {
    let input_dir = input_dir.as_ref();
    let present = list_source_files(input_dir)?;

    let missing: Vec<&str> = files
        .required()
        .iter()
        .filter(|name| !present.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(StageError::missing_required(input_dir, missing).into());
    }

    let found: Vec<PathBuf> = files
        .required()
        .iter()
        .chain(files.optional())
        .filter_map(|name| present.get(name.as_str()).cloned())
        .collect();
    debug!(
        "Located {} dataset files in {:?} ({} optional)",
        found.len(),
        input_dir,
        found.len() - files.required().len()
    );
    Ok(found)
}

/// Copy `found` into `<output_root>/<name>/raw`, prefixing each file with `name`.
///
/// The raw directory is created when absent. Staged copies of TU files that
/// `found` does not provide are removed, and copies whose content already
/// matches the source are left untouched.
pub fn stage(found: &[PathBuf], output_root: impl AsRef<Path>, name: &str) -> Result<()> {
    stage_with(found, output_root, name, &FileSet::default())
}

pub fn stage_with(
    found: &[PathBuf],
    output_root: impl AsRef<Path>,
    name: &str,
    files: &FileSet,
) -> Result<()> {
    let raw = raw_dir(output_root, name);
    fs::create_dir_all(&raw).with_context(|| format!("create raw directory {:?}", raw))?;

    let sources = found
        .iter()
        .map(|source| {
            source
                .file_name()
                .and_then(OsStr::to_str)
                .map(|file_name| (source, file_name))
                .ok_or_else(|| anyhow!("staged file {:?} has no usable file name", source))
        })
        .collect::<Result<Vec<_>>>()?;

    let incoming: IndexSet<&str> = sources.iter().map(|(_, file_name)| *file_name).collect();
    for file in files.tracked_names() {
        if incoming.contains(file) {
            continue;
        }
        let stale = raw.join(staged_name(name, file));
        if stale.is_file() {
            fs::remove_file(&stale)
                .with_context(|| format!("remove stale staged file {:?}", stale))?;
            debug!("Removed stale {:?}", stale);
        }
    }

    let mut copied = 0;
    for (source, file_name) in sources {
        let destination = raw.join(staged_name(name, file_name));
        if same_content(source, &destination)? {
            debug!("{:?} is already staged as {:?}", source, destination);
            continue;
        }
        fs::copy(source, &destination)
            .with_context(|| format!("copy {:?} to {:?}", source, destination))?;
        debug!("Staged {:?} as {:?}", source, destination);
        copied += 1;
    }

    info!(
        "Staged {} files into {:?} ({} unchanged)",
        found.len(),
        raw,
        found.len() - copied
    );
    Ok(())
}

/// Locate, stage, and open the dataset under `output_root/name`.
pub fn load_dataset(
    input_dir: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    name: &str,
) -> Result<TuDataset> {
    load_dataset_with(
        input_dir,
        output_root,
        name,
        &FileSet::default(),
        DatasetOptions::default(),
    )
}

pub fn load_dataset_with(
    input_dir: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    name: &str,
    files: &FileSet,
    options: DatasetOptions,
) -> Result<TuDataset> {
    let found = locate_with(input_dir, files)?;
    stage_with(&found, output_root.as_ref(), name, files)?;
    TuDataset::open_with(output_root.as_ref(), name, files, options)
}

/// Object-style entry point bundling the destination and load options.
#[derive(Debug, Clone)]
pub struct DatasetStager {
    files: FileSet,
    output_root: PathBuf,
    name: String,
    options: DatasetOptions,
}

impl DatasetStager {
    pub fn new(output_root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            files: FileSet::default(),
            output_root: output_root.into(),
            name: name.into(),
            options: DatasetOptions::default(),
        }
    }

    pub fn with_files(mut self, files: FileSet) -> Self {
        self.files = files;
        self
    }

    pub fn with_options(mut self, options: DatasetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_dir(&self) -> PathBuf {
        raw_dir(&self.output_root, &self.name)
    }

    pub fn locate(&self, input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        locate_with(input_dir, &self.files)
    }

    pub fn stage(&self, found: &[PathBuf]) -> Result<()> {
        stage_with(found, &self.output_root, &self.name, &self.files)
    }

    pub fn load(&self, input_dir: impl AsRef<Path>) -> Result<TuDataset> {
        load_dataset_with(
            input_dir,
            &self.output_root,
            &self.name,
            &self.files,
            self.options,
        )
    }
}

fn same_content(source: &Path, destination: &Path) -> Result<bool> {
    if !destination.is_file() {
        return Ok(false);
    }
    let source_len = fs::metadata(source)
        .with_context(|| format!("read metadata for {:?}", source))?
        .len();
    let destination_len = fs::metadata(destination)
        .with_context(|| format!("read metadata for {:?}", destination))?
        .len();
    if source_len != destination_len {
        return Ok(false);
    }
    let source_bytes = fs::read(source).with_context(|| format!("read {:?}", source))?;
    let destination_bytes =
        fs::read(destination).with_context(|| format!("read {:?}", destination))?;
    Ok(source_bytes == destination_bytes)
}

fn list_source_files(input_dir: &Path) -> Result<IndexMap<String, PathBuf>> {
    let entries =
        fs::read_dir(input_dir).with_context(|| format!("list input directory {:?}", input_dir))?;
    let mut present = IndexMap::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {:?}", input_dir))?;
        let path = entry.path();
        let is_source = path.is_file()
            && path
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext == SOURCE_EXTENSION)
                .unwrap_or(false);
        if !is_source {
            continue;
        }
        if let Some(name) = path.file_name().and_then(OsStr::to_str) {
            present.insert(name.to_string(), path.to_path_buf());
        }
    }
    Ok(present)
}
