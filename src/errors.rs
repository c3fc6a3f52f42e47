use std::path::PathBuf;

use thiserror::Error;

/// Failures a caller may want to tell apart from plain I/O or parse errors.
///
/// These travel inside `anyhow::Error`; recover them with `downcast_ref::<StageError>()`.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("missing required files in {input_dir:?}: {}", .missing.join(", "))]
    MissingRequiredFiles {
        input_dir: PathBuf,
        missing: Vec<String>,
    },
    #[error("raw dataset files not found, please put your raw data files into {raw_dir:?}")]
    RawFilesMissing { raw_dir: PathBuf },
}

impl StageError {
    pub fn missing_required<T: Into<String>>(
        input_dir: impl Into<PathBuf>,
        missing: impl IntoIterator<Item = T>,
    ) -> Self {
        StageError::MissingRequiredFiles {
            input_dir: input_dir.into(),
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw_files_missing(raw_dir: impl Into<PathBuf>) -> Self {
        StageError::RawFilesMissing {
            raw_dir: raw_dir.into(),
        }
    }
}
