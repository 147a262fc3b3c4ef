use std::path::PathBuf;

use thiserror::Error;

use crate::template::NodeId;

/// A graph definition could not be turned into a template.
///
/// Only the graph being loaded is affected; nothing here ever reaches the
/// ticking loop.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read graph definition {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON graph definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML graph definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported graph definition format `{0}` (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("graph `{graph}` has no nodes")]
    EmptyGraph { graph: String },

    #[error("node {id} (`{name}`): id must be a non-negative 32-bit integer")]
    InvalidNodeId { id: i64, name: String },

    #[error("node {id} (`{name}`): id already used by `{first}`")]
    DuplicateNodeId {
        id: NodeId,
        name: String,
        first: String,
    },

    #[error("graph `{graph}`: root {root} does not name a node")]
    MissingRoot { graph: String, root: i64 },

    #[error("node {id} (`{name}`): {edge} edge {value} is neither a node id nor the terminate sentinel")]
    InvalidEdge {
        id: NodeId,
        name: String,
        edge: &'static str,
        value: i64,
    },

    #[error("node {id} (`{name}`): {edge} edge points at missing node {target}")]
    DanglingEdge {
        id: NodeId,
        name: String,
        edge: &'static str,
        target: NodeId,
    },

    #[error("node {id} (`{name}`): unknown node kind `{kind}`")]
    UnknownKind {
        id: NodeId,
        name: String,
        kind: String,
    },

    #[error("node {id} (`{name}`): leaf node without a leaf id")]
    MissingLeafId { id: NodeId, name: String },

    #[error("node {id} (`{name}`): parameter `{key}` {reason}")]
    InvalidParameter {
        id: NodeId,
        name: String,
        key: String,
        reason: String,
    },
}

impl LoadError {
    /// The node the error is about, when it is about a single node.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            LoadError::DuplicateNodeId { id, .. }
            | LoadError::InvalidEdge { id, .. }
            | LoadError::DanglingEdge { id, .. }
            | LoadError::UnknownKind { id, .. }
            | LoadError::MissingLeafId { id, .. }
            | LoadError::InvalidParameter { id, .. } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("leaf id must not be empty")]
    EmptyLeafId,

    #[error("the global leaf registry is already installed")]
    GlobalAlreadyInstalled,
}

/// A template/registry mismatch discovered while stepping.
///
/// Never returned as an error: the engine logs it once per cursor and node,
/// degrades the step to `Failure` and reports it in the `StepReport`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("graph `{graph}` has no node {node}")]
    MissingNode { graph: String, node: NodeId },

    #[error("graph `{graph}` was stepped before its lookup cache was built")]
    CacheNotBuilt { graph: String },

    #[error("node {node} (`{name}`) references unregistered leaf `{leaf_id}`")]
    UnregisteredLeaf {
        node: NodeId,
        name: String,
        leaf_id: String,
    },
}
