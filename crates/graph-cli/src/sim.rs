//! Fixed-step simulation of many agents walking one template.

use std::path::Path;
use std::sync::Arc;

use ai_core::{AgentId, Blackboard, BlackboardSnapshot, TickContext};
use ai_graph::{ExecutionCursor, GraphEngine, GraphTemplate, NodeId, Transition};
use ai_tools::TraceLog;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// One simulated agent.
#[derive(Debug)]
pub struct SimAgent {
    pub id: AgentId,
    pub cursor: ExecutionCursor,
    pub blackboard: Blackboard,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimStats {
    pub ticks: u64,
    pub steps: u64,
    pub transitions: u64,
    pub terminations: u64,
    pub config_errors: u64,
}

#[derive(Debug)]
pub struct Simulation {
    template: Arc<GraphTemplate>,
    agents: Vec<SimAgent>,
    trace: TraceLog,
    stats: SimStats,
    next_tick: u64,
}

impl Simulation {
    /// `agents` agents, ids starting at 1, each seeded from `seed`.
    pub fn new(template: Arc<GraphTemplate>, agents: u64, seed: &BlackboardSnapshot) -> Self {
        let agents = (1..=agents)
            .map(|id| SimAgent {
                id: AgentId::new(id),
                cursor: ExecutionCursor::bind(Arc::clone(&template)),
                blackboard: Blackboard::load(seed),
            })
            .collect();
        Self {
            template,
            agents,
            trace: TraceLog::default(),
            stats: SimStats::default(),
            next_tick: 0,
        }
    }

    pub fn template(&self) -> &GraphTemplate {
        &self.template
    }

    pub fn agents(&self) -> &[SimAgent] {
        &self.agents
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// True once every agent's cursor has gone idle.
    pub fn all_idle(&self) -> bool {
        self.agents.iter().all(|a| a.cursor.is_idle())
    }

    /// Step every agent once, in id order.
    pub fn tick(&mut self, engine: &GraphEngine<'_>, dt_seconds: f32) {
        let ctx = TickContext::new(self.next_tick, dt_seconds);
        for agent in &mut self.agents {
            let report = engine.tick(&ctx, agent.id, &mut agent.cursor, &mut agent.blackboard);
            self.stats.steps += 1;
            match report.transition {
                Transition::Moved(_) | Transition::Restarted(_) => self.stats.transitions += 1,
                Transition::Terminated => self.stats.terminations += 1,
                Transition::Stay | Transition::Idle => {}
            }
            if report.config_error.is_some() {
                self.stats.config_errors += 1;
            }
            if report.transition != Transition::Idle {
                self.trace.push(report.trace_event(ctx.tick));
            }
        }
        self.stats.ticks += 1;
        self.next_tick = ctx.next().tick;
    }

    /// Run up to `ticks` ticks, stopping early once every agent is idle.
    pub fn run(&mut self, engine: &GraphEngine<'_>, ticks: u64, dt_seconds: f32) -> SimStats {
        for _ in 0..ticks {
            if self.all_idle() {
                debug!(tick = self.next_tick, "All agents idle; stopping early");
                break;
            }
            self.tick(engine, dt_seconds);
        }
        info!(
            graph = self.template.name(),
            agents = self.agents.len(),
            ticks = self.stats.ticks,
            transitions = self.stats.transitions,
            "Simulation finished"
        );
        self.stats
    }

    /// Final node of every agent, in id order.
    pub fn final_nodes(&self) -> Vec<(AgentId, NodeId, bool)> {
        self.agents
            .iter()
            .map(|a| (a.id, a.cursor.current_node(), a.cursor.is_idle()))
            .collect()
    }

    pub fn write_trace(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.trace).context("Failed to encode trace log")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write trace log to {}", path.display()))?;
        info!(path = %path.display(), events = self.trace.len(), "Trace log written");
        Ok(())
    }
}
