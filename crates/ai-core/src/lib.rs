//! Deterministic, engine-agnostic primitives for per-agent task graphs.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod blackboard;
pub mod math;
pub mod status;
pub mod tick;

pub use agent::{AgentId, EntityRef};
pub use blackboard::{
    BbKey, BbKind, BbType, BbValue, Blackboard, BlackboardEntry, BlackboardError,
    BlackboardSnapshot,
};
pub use math::Vec3;
pub use status::{TaskOutcome, TaskStatus};
pub use tick::TickContext;
