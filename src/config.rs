use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::transform::DateErrorPolicy;

/// Explicit pipeline configuration. Everything the run needs travels in this
/// struct; there is no ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding staged monthly CSV uploads.
    pub stage_dir: PathBuf,
    /// Directory the enriched parquet tables are written to.
    pub output_dir: PathBuf,
    /// Directory holding the processed-file ledger.
    pub history_dir: PathBuf,
    pub on_date_error: DateErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_dir: PathBuf::from("stage"),
            output_dir: PathBuf::from("parquet"),
            history_dir: PathBuf::from("history"),
            on_date_error: DateErrorPolicy::Skip,
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file; a missing file falls back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
