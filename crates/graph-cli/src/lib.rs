//! Support code for the `taskgraph` binary: simulation config, demo leaves and
//! the fixed-step simulation loop.

#![forbid(unsafe_code)]

pub mod config;
pub mod leaves;
pub mod sim;

pub use config::{SimConfig, SimOverrides};
pub use leaves::{demo_registry, register_demo_leaves};
pub use sim::{SimAgent, SimStats, Simulation};
