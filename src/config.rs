//! Run configuration: where the inputs live, where outputs go, and the few
//! tunables of the pipeline.
//!
//! Configuration is loaded from YAML, every field has a default matching the
//! conventional `data/raw` → `data/processed` layout, and command-line flags
//! are layered on top before the value is handed to [`crate::pipeline`].

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_YEAR_CUTOFF;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputPaths {
    pub mortality: PathBuf,
    pub population: PathBuf,
    pub meta: Option<PathBuf>,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            mortality: PathBuf::from("data/raw/who_suicide_statistics.csv"),
            population: PathBuf::from("data/raw/total_pop_1960_2018.csv"),
            meta: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputPaths {
    pub enriched: PathBuf,
    pub summary: PathBuf,
    pub wide: PathBuf,
    pub meta: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("data/processed"))
    }
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            enriched: dir.join("enriched_df.csv"),
            summary: dir.join("choropleth_df.csv"),
            wide: dir.join("year_country_data.csv"),
            meta: dir.join("cleaned_meta.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    pub outputs: OutputPaths,
    /// Preamble lines above the population table header.
    pub population_skip_rows: usize,
    pub year_cutoff: i32,
    /// Extra `name: code` entries consulted after the built-in lookups.
    pub country_overrides: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            outputs: OutputPaths::default(),
            population_skip_rows: 4,
            year_cutoff: DEFAULT_YEAR_CUTOFF,
            country_overrides: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Parsing pipeline configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Opening configuration file {path:?}"))?;
        Self::from_yaml(&text).with_context(|| format!("Loading configuration from {path:?}"))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing pipeline configuration")
    }
}
