use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::leaf::Leaf;
use crate::template::{GraphTemplate, NodeId};

struct RunningLeaf {
    node: NodeId,
    leaf_id: String,
    leaf: Box<dyn Leaf>,
}

/// Per-agent execution state that survives between ticks.
///
/// "Running" is plain data here: the node the agent is inside plus the live
/// leaf instance. Resuming means calling `execute` on that instance again.
/// The cursor is exclusively owned by its agent; dropping it while a leaf is
/// running aborts that leaf.
pub struct ExecutionCursor {
    template: Arc<GraphTemplate>,
    current: NodeId,
    running: Option<RunningLeaf>,
    idle: bool,
    steps: u64,
    diagnosed: BTreeSet<NodeId>,
}

impl ExecutionCursor {
    /// Bind to `template`, positioned at its root.
    pub fn bind(template: Arc<GraphTemplate>) -> Self {
        let current = template.root();
        Self {
            template,
            current,
            running: None,
            idle: false,
            steps: 0,
            diagnosed: BTreeSet::new(),
        }
    }

    /// Switch to another template, aborting any running leaf and resetting to its root.
    pub fn rebind(&mut self, template: Arc<GraphTemplate>) {
        self.abort_running("rebind");
        self.current = template.root();
        self.template = template;
        self.idle = false;
        self.diagnosed.clear();
    }

    /// Detach from the walk: abort a running leaf and go idle on the current node.
    pub fn unbind(&mut self) {
        self.abort_running("unbind");
        self.idle = true;
    }

    /// Abort a running leaf and start over from the root.
    pub fn restart(&mut self) {
        self.abort_running("restart");
        self.current = self.template.root();
        self.idle = false;
    }

    pub fn template(&self) -> &Arc<GraphTemplate> {
        &self.template
    }

    pub fn current_node(&self) -> NodeId {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// True once a terminate edge was followed (or after `unbind`).
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn running_leaf_id(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.leaf_id.as_str())
    }

    /// Number of `step` calls made with this cursor, idle ones included.
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    pub(crate) fn count_step(&mut self) {
        self.steps += 1;
    }

    /// Take the cached leaf if it belongs to `node`. A leaf cached for any
    /// other node is stale and gets aborted.
    pub(crate) fn take_running(&mut self, node: NodeId) -> Option<(String, Box<dyn Leaf>)> {
        match self.running.take() {
            Some(r) if r.node == node => Some((r.leaf_id, r.leaf)),
            Some(mut stale) => {
                debug!(node = %stale.node, leaf_id = %stale.leaf_id, "Aborting stale running leaf");
                stale.leaf.abort();
                None
            }
            None => None,
        }
    }

    pub(crate) fn park(&mut self, node: NodeId, leaf_id: String, leaf: Box<dyn Leaf>) {
        self.current = node;
        self.running = Some(RunningLeaf { node, leaf_id, leaf });
    }

    pub(crate) fn advance(&mut self, next: NodeId) {
        self.current = next;
        self.idle = false;
    }

    /// Abort a running leaf and jump to `root` of the template being stepped.
    pub(crate) fn restart_at(&mut self, root: NodeId) {
        self.abort_running("restart");
        self.advance(root);
    }

    pub(crate) fn finish(&mut self) {
        self.abort_running("finish");
        self.idle = true;
    }

    /// True the first time a configuration problem is seen at `node`.
    pub(crate) fn first_diagnosis(&mut self, node: NodeId) -> bool {
        self.diagnosed.insert(node)
    }

    fn abort_running(&mut self, reason: &'static str) {
        if let Some(mut running) = self.running.take() {
            debug!(
                node = %running.node,
                leaf_id = %running.leaf_id,
                reason,
                "Aborting running leaf"
            );
            running.leaf.abort();
        }
    }
}

impl Drop for ExecutionCursor {
    fn drop(&mut self) {
        self.abort_running("drop");
    }
}

impl fmt::Debug for ExecutionCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionCursor")
            .field("template", &self.template.name())
            .field("current", &self.current)
            .field("running", &self.running_leaf_id())
            .field("idle", &self.idle)
            .field("steps", &self.steps)
            .finish()
    }
}
