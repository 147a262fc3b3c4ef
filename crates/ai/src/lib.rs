//! Umbrella crate that re-exports the `ai-*` building blocks.
//!
//! `core` holds the shared vocabulary (status, blackboard, agent ids), `graph`
//! the task-graph runtime and `tools` the debugger bridge and trace log.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use ai_tools as tools;

#[cfg(feature = "graph")]
#[cfg_attr(docsrs, doc(cfg(feature = "graph")))]
pub use ai_graph as graph;

/// The names most callers need, from every enabled crate.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use ai_core::{AgentId, BbKey, BbValue, Blackboard, TaskStatus, TickContext};

    #[cfg(feature = "graph")]
    pub use ai_graph::{
        ExecutionCursor, GraphEngine, GraphTemplate, Leaf, LeafContext, LeafRegistry, NodeDef,
        StepReport,
    };

    #[cfg(feature = "tools")]
    pub use ai_tools::{ExecutionBridge, TraceLog};
}
