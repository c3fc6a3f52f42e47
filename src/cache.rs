use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::datasets::DatasetOptions;
use crate::graph::RawGraph;
use crate::staging::{staged_name, FileSet};

const PROCESSED_SUBDIR: &str = "processed";
const METADATA_FILE: &str = "meta.json";
const DATA_FILE: &str = "data.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub len: u64,
    pub modified: u64,
}

impl CacheMetadata {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata =
            fs::metadata(path).with_context(|| format!("read metadata for {:?}", path))?;
        let len = metadata.len();
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Ok(Self { len, modified })
    }
}

/// Hex digest over the size and mtime of every staged file `files` tracks in `raw_dir`.
pub fn raw_fingerprint(raw_dir: &Path, name: &str, files: &FileSet) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for file in files.tracked_names() {
        let path = raw_dir.join(staged_name(name, file));
        hasher.update(file.as_bytes());
        if path.is_file() {
            let meta = CacheMetadata::from_path(&path)?;
            hasher.update(&meta.len.to_le_bytes());
            hasher.update(&meta.modified.to_le_bytes());
        } else {
            hasher.update(b"-");
        }
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Parsed graphs persisted under `<root>/<name>/processed`.
#[derive(Debug, Clone)]
pub struct ProcessedCache {
    dir: PathBuf,
}

impl ProcessedCache {
    pub fn new(dataset_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dataset_dir.as_ref().join(PROCESSED_SUBDIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(
        &self,
        fingerprint: &str,
        options: &DatasetOptions,
    ) -> Result<Option<Vec<RawGraph>>> {
        let meta_path = self.dir.join(METADATA_FILE);
        let data_path = self.dir.join(DATA_FILE);
        if !meta_path.exists() || !data_path.exists() {
            return Ok(None);
        }

        let meta: CachedMeta = read_json(&meta_path)
            .with_context(|| format!("deserialize processed metadata from {:?}", meta_path))?;
        if meta.version != CACHE_VERSION
            || meta.fingerprint != fingerprint
            || &meta.options != options
        {
            debug!("Processed cache at {:?} is stale", self.dir);
            return Ok(None);
        }

        let graphs = read_json(&data_path)
            .with_context(|| format!("read processed graphs from {:?}", data_path))?;
        Ok(Some(graphs))
    }

    pub fn store(
        &self,
        fingerprint: &str,
        options: &DatasetOptions,
        graphs: &[RawGraph],
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create processed directory {:?}", self.dir))?;

        let meta = CachedMeta {
            version: CACHE_VERSION,
            fingerprint: fingerprint.to_string(),
            options: *options,
        };

        write_json(&self.dir.join(DATA_FILE), &graphs)
            .with_context(|| format!("write processed graphs to {:?}", self.dir))?;
        write_json(&self.dir.join(METADATA_FILE), &meta)
            .with_context(|| format!("write processed metadata to {:?}", self.dir))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMeta {
    version: u32,
    fingerprint: String,
    options: DatasetOptions,
}

fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).with_context(|| format!("open cached json file {:?}", path))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("deserialize cached json file {:?}", path))
}

fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let file = File::create(path).with_context(|| format!("create cache json file {:?}", path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, value)
        .with_context(|| format!("serialize cache json file {:?}", path))
}
