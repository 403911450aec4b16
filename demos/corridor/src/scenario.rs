//! Scenario file: controller, run, simulator and network in one JSON document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use sc_core::{ControllerConfig, RunConfig};
use sc_network::{Corridor, NetworkFile};
use sc_sim::PointQueueConfig;

fn default_output_dir() -> PathBuf {
    PathBuf::from("output/corridor")
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub run:        RunConfig,
    #[serde(default)]
    pub simulator:  PointQueueConfig,
    pub network:    NetworkFile,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve the network section, filling omitted phase timings from the
    /// controller defaults.
    pub fn corridor(&self) -> Result<Corridor> {
        self.network
            .clone()
            .into_corridor((&self.controller).into())
            .context("network section")
    }
}
