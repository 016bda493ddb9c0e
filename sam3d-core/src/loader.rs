//! Hand-off from discovery to a model loader.
//!
//! Loading itself lives outside this crate. The contract here is that a loader only
//! ever receives a fully resolved set of paths for a layout that passed
//! verification.

use crate::discovery::DiscoveryResult;
use crate::error::{LoadError, ResolveError};
use crate::layout::LayoutFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolved files for one checkpoint, ready for a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum LoadRequest {
    Structured {
        pipeline_file: PathBuf,
        config_file: Option<PathBuf>,
        weight_file: PathBuf,
    },
    Flat {
        /// Primary weights, the first `.pth` by name.
        weight_file: PathBuf,
        /// Every `.pth` found at the root, primary included.
        weight_files: Vec<PathBuf>,
    },
}

impl TryFrom<&DiscoveryResult> for LoadRequest {
    type Error = ResolveError;

    fn try_from(result: &DiscoveryResult) -> Result<Self, Self::Error> {
        let not_loadable = || ResolveError::NotLoadable {
            root: result.root().to_path_buf(),
            verdict: result.verdict(),
        };
        if !result.pass() {
            return Err(not_loadable());
        }

        match result.format() {
            LayoutFormat::Structured {
                pipeline_file,
                config_file,
                weight_file,
            } => Ok(Self::Structured {
                pipeline_file: pipeline_file.clone(),
                config_file: config_file.clone(),
                weight_file: weight_file.clone(),
            }),
            LayoutFormat::Flat { weight_file } => Ok(Self::Flat {
                weight_file: weight_file.clone(),
                weight_files: result.present().iter().map(|e| e.path.clone()).collect(),
            }),
            LayoutFormat::NotFound => Err(not_loadable()),
        }
    }
}

/// A format-specific model loading routine.
pub trait CheckpointLoader {
    type Model;
    type Error: std::error::Error + 'static;

    fn load_structured(
        &self,
        pipeline_file: &Path,
        config_file: Option<&Path>,
        weight_file: &Path,
    ) -> Result<Self::Model, Self::Error>;

    fn load_flat(
        &self,
        weight_file: &Path,
        weight_files: &[PathBuf],
    ) -> Result<Self::Model, Self::Error>;
}

/// Verify `result` passed and dispatch to the matching loader routine.
pub fn load<L: CheckpointLoader>(
    loader: &L,
    result: &DiscoveryResult,
) -> Result<L::Model, LoadError<L::Error>> {
    let request = LoadRequest::try_from(result).map_err(LoadError::NotLoadable)?;
    tracing::debug!(
        root = %result.root().display(),
        format = %result.format(),
        "dispatching to loader"
    );
    let loaded = match &request {
        LoadRequest::Structured {
            pipeline_file,
            config_file,
            weight_file,
        } => loader.load_structured(pipeline_file, config_file.as_deref(), weight_file),
        LoadRequest::Flat {
            weight_file,
            weight_files,
        } => loader.load_flat(weight_file, weight_files),
    };
    loaded.map_err(LoadError::Loader)
}
