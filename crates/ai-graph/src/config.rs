use serde::{Deserialize, Serialize};

/// What a cursor does after following an edge that is the terminate sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateBehavior {
    /// Stay parked on the finishing node; later steps are no-ops until the
    /// cursor is restarted or rebound.
    #[default]
    Idle,
    /// Jump back to the template root; the root runs on the next step.
    RestartFromRoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub on_terminate: TerminateBehavior,
}

impl EngineConfig {
    pub fn restart_on_terminate() -> Self {
        Self {
            on_terminate: TerminateBehavior::RestartFromRoot,
        }
    }
}
