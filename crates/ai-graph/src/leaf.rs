use std::collections::{BTreeMap, BTreeSet};

use ai_core::{AgentId, BbValue, Blackboard, EntityRef, TaskStatus, Vec3};

use crate::template::{NodeDef, NodeId};

/// Reserved parameter name under which the step's delta time (seconds) is visible.
pub const DELTA_TIME_PARAM: &str = "delta_time";

/// A pluggable unit of behavior bound to a node through the registry.
///
/// `execute` must not block: one call is at most one frame of work. A leaf
/// that needs several frames returns `Running` and is called again on the
/// *same* instance next tick, so it can keep its progress in `self`. Elapsed
/// time and timeouts are the leaf's own business (see [`LeafContext::delta_time`]).
pub trait Leaf: Send + 'static {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus;

    /// Called when a running leaf is pre-empted (cursor dropped, rebound or
    /// restarted). Release anything task-local here.
    fn abort(&mut self) {}
}

/// Everything a leaf sees during one `execute` call.
pub struct LeafContext<'a> {
    agent: AgentId,
    node: &'a NodeDef,
    blackboard: &'a mut Blackboard,
    delta_time: f32,
}

impl<'a> LeafContext<'a> {
    pub fn new(
        agent: AgentId,
        node: &'a NodeDef,
        blackboard: &'a mut Blackboard,
        delta_time: f32,
    ) -> Self {
        Self {
            agent,
            node,
            blackboard,
            delta_time,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn node_name(&self) -> &str {
        &self.node.name
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Merged parameter view: blackboard entries shadow node-static parameters.
    pub fn params(&self) -> ParamView<'_> {
        ParamView {
            statics: &self.node.params,
            blackboard: &*self.blackboard,
            delta_time: BbValue::Number(self.delta_time as f64),
        }
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params().get(key).and_then(BbValue::as_f64)
    }

    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.params().get(key).and_then(BbValue::as_i64)
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.params().get(key).and_then(BbValue::as_bool)
    }

    pub fn param_vec3(&self, key: &str) -> Option<Vec3> {
        self.params().get(key).and_then(BbValue::as_vec3)
    }

    pub fn param_entity(&self, key: &str) -> Option<EntityRef> {
        self.params().get(key).and_then(BbValue::as_entity)
    }

    pub fn param_string(&self, key: &str) -> Option<String> {
        self.params()
            .get(key)
            .and_then(BbValue::as_str)
            .map(str::to_string)
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.blackboard
    }
}

/// Read-only parameter lookup for one node execution.
///
/// Resolution order: [`DELTA_TIME_PARAM`], then the agent's blackboard, then
/// the node's static parameters. This is how a single node definition serves
/// many agents with per-agent values.
#[derive(Debug, Clone)]
pub struct ParamView<'a> {
    statics: &'a BTreeMap<String, BbValue>,
    blackboard: &'a Blackboard,
    delta_time: BbValue,
}

impl<'a> ParamView<'a> {
    pub fn get(&self, key: &str) -> Option<&BbValue> {
        if key == DELTA_TIME_PARAM {
            return Some(&self.delta_time);
        }
        self.blackboard
            .get_value(key)
            .or_else(|| self.statics.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True when the blackboard supplies `key` even though the node defines it.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.statics.contains_key(key) && self.blackboard.contains_key(key)
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time.as_f64().unwrap_or_default() as f32
    }

    /// Static parameter names, in order. Blackboard-only keys are not listed.
    pub fn static_keys(&self) -> impl Iterator<Item = &'a str> {
        self.statics.keys().map(String::as_str)
    }

    /// Every name `get` can resolve, deduplicated and sorted.
    pub fn keys(&self) -> BTreeSet<&str> {
        let mut keys: BTreeSet<&str> = self.statics.keys().map(String::as_str).collect();
        keys.extend(self.blackboard.keys());
        keys.insert(DELTA_TIME_PARAM);
        keys
    }
}
