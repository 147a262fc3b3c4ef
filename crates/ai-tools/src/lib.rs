//! Tooling primitives for task-graph agents.
//!
//! This crate is intentionally lightweight and engine-agnostic. Inspectors and
//! editors plug in through [`ExecutionBridge`] without the runtime knowing
//! their types.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod trace;

pub use bridge::{BlackboardHook, ExecutionBridge, NodeHook};
pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink};
