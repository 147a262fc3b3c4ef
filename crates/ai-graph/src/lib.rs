//! Resumable per-agent task-graph runtime built on `ai-core`.
//!
//! A [`GraphTemplate`] is loaded once and shared by many agents. Each agent
//! owns an [`ExecutionCursor`] and a [`Blackboard`](ai_core::Blackboard); every
//! simulation tick the caller hands both to [`GraphEngine::step`], which
//! advances the agent by exactly one node. Multi-tick leaves are resumed from
//! the cursor rather than from a suspended call stack.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod leaf;
pub mod loader;
pub mod registry;
pub mod template;

pub use config::{EngineConfig, TerminateBehavior};
pub use cursor::ExecutionCursor;
pub use engine::{GraphEngine, StepReport, Transition};
pub use error::{ConfigurationError, LoadError, RegistryError};
pub use leaf::{Leaf, LeafContext, ParamView, DELTA_TIME_PARAM};
pub use loader::{
    load_json_str, load_path, load_yaml_str, GraphDefinition, GraphFormat, NodeDefinition, TERMINATE,
};
pub use registry::{LeafFactory, LeafRegistry};
pub use template::{Edge, GraphTemplate, NodeDef, NodeId, NodeKind};
