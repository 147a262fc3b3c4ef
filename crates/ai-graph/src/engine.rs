use std::sync::Arc;

use ai_core::{AgentId, Blackboard, TaskOutcome, TaskStatus, TickContext};
use ai_tools::{ExecutionBridge, TraceEvent};
use tracing::{debug, trace, warn};

use crate::config::{EngineConfig, TerminateBehavior};
use crate::cursor::ExecutionCursor;
use crate::error::ConfigurationError;
use crate::leaf::LeafContext;
use crate::registry::LeafRegistry;
use crate::template::{Edge, GraphTemplate, NodeDef, NodeId};

pub const TAG_RUNNING: &str = "graph.running";
pub const TAG_TRANSITION: &str = "graph.transition";
pub const TAG_TERMINATED: &str = "graph.terminated";
pub const TAG_RESTARTED: &str = "graph.restarted";
pub const TAG_IDLE: &str = "graph.idle";

/// What a single step did to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The leaf returned `Running`; the cursor stays inside the node.
    Stay,
    /// Followed an edge; the target runs on the next step.
    Moved(NodeId),
    /// Followed a terminate edge and went idle.
    Terminated,
    /// Followed a terminate edge and jumped back to the root.
    Restarted(NodeId),
    /// The cursor was already idle; nothing ran.
    Idle,
}

/// Outcome of [`GraphEngine::step`] for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub agent: AgentId,
    /// The node that was active at the start of the step.
    pub node: NodeId,
    /// `None` only when nothing executed because the cursor was idle.
    pub status: Option<TaskStatus>,
    pub transition: Transition,
    pub config_error: Option<ConfigurationError>,
}

impl StepReport {
    fn new(agent: AgentId, node: NodeId, status: Option<TaskStatus>, transition: Transition) -> Self {
        Self {
            agent,
            node,
            status,
            transition,
            config_error: None,
        }
    }

    /// Node the cursor points at after the step.
    pub fn next_node(&self) -> NodeId {
        match self.transition {
            Transition::Moved(next) | Transition::Restarted(next) => next,
            Transition::Stay | Transition::Terminated | Transition::Idle => self.node,
        }
    }

    pub fn trace_event(&self, tick: u64) -> TraceEvent {
        let tag = match self.transition {
            Transition::Stay => TAG_RUNNING,
            Transition::Moved(_) => TAG_TRANSITION,
            Transition::Terminated => TAG_TERMINATED,
            Transition::Restarted(_) => TAG_RESTARTED,
            Transition::Idle => TAG_IDLE,
        };
        TraceEvent::new(tick, self.agent.stable_id(), tag)
            .with_a(self.node.raw() as u64)
            .with_b(self.next_node().raw() as u64)
    }
}

/// Advances agents through their templates, one node per call.
///
/// The engine holds no per-agent or timing state, so a single instance can
/// step many agents, from several threads if each agent's cursor and
/// blackboard stay with one thread.
#[derive(Debug)]
pub struct GraphEngine<'r> {
    registry: &'r LeafRegistry,
    config: EngineConfig,
    bridge: ExecutionBridge,
}

impl<'r> GraphEngine<'r> {
    pub fn new(registry: &'r LeafRegistry) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
            bridge: ExecutionBridge::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r LeafRegistry {
        self.registry
    }

    pub fn bridge(&self) -> &ExecutionBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut ExecutionBridge {
        &mut self.bridge
    }

    /// Step an agent against the template its cursor is bound to.
    pub fn tick(
        &self,
        ctx: &TickContext,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        blackboard: &mut Blackboard,
    ) -> StepReport {
        let template = Arc::clone(cursor.template());
        self.step(agent, cursor, &template, blackboard, ctx.dt_seconds)
    }

    /// Advance `agent` by exactly one node-step.
    ///
    /// A node reached by a transition is not evaluated until the next call.
    /// Misconfiguration never panics: it degrades to `Failure`, is logged once
    /// per cursor and node, and is reported in [`StepReport::config_error`].
    pub fn step(
        &self,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        template: &GraphTemplate,
        blackboard: &mut Blackboard,
        delta_time: f32,
    ) -> StepReport {
        cursor.count_step();
        let node_id = cursor.current_node();

        if cursor.is_idle() {
            return StepReport::new(agent, node_id, None, Transition::Idle);
        }

        if !template.is_cache_built() {
            let error = ConfigurationError::CacheNotBuilt {
                graph: template.name().to_string(),
            };
            return self.fail_without_node(agent, cursor, template, node_id, error);
        }

        let Some(node) = template.node(node_id) else {
            let error = ConfigurationError::MissingNode {
                graph: template.name().to_string(),
                node: node_id,
            };
            return self.fail_without_node(agent, cursor, template, node_id, error);
        };

        let (leaf_id, mut leaf) = match cursor.take_running(node_id) {
            Some(cached) => cached,
            None => {
                let leaf_id = node.leaf_id().unwrap_or_default();
                match self.registry.create(leaf_id) {
                    Some(leaf) => (leaf_id.to_string(), leaf),
                    None => {
                        let error = ConfigurationError::UnregisteredLeaf {
                            node: node_id,
                            name: node.name.clone(),
                            leaf_id: leaf_id.to_string(),
                        };
                        self.diagnose(agent, cursor, node_id, &error);
                        let mut report = self.finish_node(agent, cursor, template, node, TaskOutcome::Failure);
                        report.config_error = Some(error);
                        return report;
                    }
                }
            }
        };

        let status = {
            let mut ctx = LeafContext::new(agent, node, blackboard, delta_time);
            leaf.execute(&mut ctx)
        };

        match status.outcome() {
            None => {
                trace!(%agent, node = %node_id, leaf_id = %leaf_id, "Leaf running");
                cursor.park(node_id, leaf_id, leaf);
                self.bridge.publish(node_id.raw(), blackboard);
                StepReport::new(agent, node_id, Some(TaskStatus::Running), Transition::Stay)
            }
            Some(outcome) => {
                drop(leaf);
                self.finish_node(agent, cursor, template, node, outcome)
            }
        }
    }

    /// Follow the edge selected by `outcome`.
    fn finish_node(
        &self,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        template: &GraphTemplate,
        node: &NodeDef,
        outcome: TaskOutcome,
    ) -> StepReport {
        let transition = match node.edge(outcome) {
            Edge::Node(next) => {
                debug!(%agent, from = %node.id, to = %next, ?outcome, "Node transition");
                cursor.advance(next);
                Transition::Moved(next)
            }
            Edge::Terminate => self.terminate(agent, cursor, template, node.id),
        };
        StepReport::new(agent, node.id, Some(outcome.into()), transition)
    }

    /// Failure with no node to take an edge from: treat it as a terminate edge.
    fn fail_without_node(
        &self,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        template: &GraphTemplate,
        node_id: NodeId,
        error: ConfigurationError,
    ) -> StepReport {
        self.diagnose(agent, cursor, node_id, &error);
        let transition = self.terminate(agent, cursor, template, node_id);
        let mut report = StepReport::new(agent, node_id, Some(TaskStatus::Failure), transition);
        report.config_error = Some(error);
        report
    }

    fn terminate(
        &self,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        template: &GraphTemplate,
        node_id: NodeId,
    ) -> Transition {
        match self.config.on_terminate {
            TerminateBehavior::Idle => {
                debug!(%agent, node = %node_id, "Walk terminated; cursor idle");
                cursor.finish();
                Transition::Terminated
            }
            TerminateBehavior::RestartFromRoot => {
                let root = template.root();
                debug!(%agent, node = %node_id, %root, "Walk terminated; restarting from root");
                cursor.restart_at(root);
                Transition::Restarted(root)
            }
        }
    }

    fn diagnose(
        &self,
        agent: AgentId,
        cursor: &mut ExecutionCursor,
        node_id: NodeId,
        error: &ConfigurationError,
    ) {
        if cursor.first_diagnosis(node_id) {
            warn!(%agent, node = %node_id, %error, "Configuration error; treating node as failed");
        }
    }
}
