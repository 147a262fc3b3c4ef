//! Simulation settings for `taskgraph run`, loaded from YAML.

use std::path::{Path, PathBuf};

use ai_core::BlackboardSnapshot;
use ai_graph::EngineConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of agents bound to the graph
    #[serde(default = "default_agents")]
    pub agents: u64,

    /// Ticks to simulate
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Fixed time step in seconds
    #[serde(default = "default_dt")]
    pub dt_seconds: f32,

    /// Engine behaviour (what terminate edges do)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Values seeded into every agent's blackboard
    #[serde(default)]
    pub blackboard: BlackboardSnapshot,

    /// Where to write the JSON trace log, if anywhere
    #[serde(default)]
    pub trace_out: Option<PathBuf>,
}

fn default_agents() -> u64 {
    1
}
fn default_ticks() -> u64 {
    20
}
fn default_dt() -> f32 {
    0.1
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            ticks: default_ticks(),
            dt_seconds: default_dt(),
            engine: EngineConfig::default(),
            blackboard: BlackboardSnapshot::default(),
            trace_out: None,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sim config from {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse sim config from {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, overrides: &SimOverrides) -> Self {
        if let Some(agents) = overrides.agents {
            self.agents = agents;
        }
        if let Some(ticks) = overrides.ticks {
            self.ticks = ticks;
        }
        if let Some(dt) = overrides.dt_seconds {
            self.dt_seconds = dt;
        }
        if let Some(path) = &overrides.trace_out {
            self.trace_out = Some(path.clone());
        }
        self
    }
}

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct SimOverrides {
    pub agents: Option<u64>,
    pub ticks: Option<u64>,
    pub dt_seconds: Option<f32>,
    pub trace_out: Option<PathBuf>,
}
