use std::fmt;

use ai_core::Blackboard;

/// Observer for the id of the node an agent is running in.
pub type NodeHook = Box<dyn Fn(u32) + Send + Sync>;
/// Observer for the live blackboard of that agent.
pub type BlackboardHook = Box<dyn Fn(&Blackboard) + Send + Sync>;

/// Optional observation hooks for an external debugger.
///
/// The bridge is "installed" independently of whether either hook is present:
/// `install(None, None)` is valid and reports `is_installed() == true` while
/// never calling anything. Hooks run synchronously on the stepping thread and
/// only ever see shared references.
#[derive(Default)]
pub struct ExecutionBridge {
    installed: bool,
    node_hook: Option<NodeHook>,
    blackboard_hook: Option<BlackboardHook>,
}

impl ExecutionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store both hooks, replacing anything installed before.
    pub fn install(&mut self, node_hook: Option<NodeHook>, blackboard_hook: Option<BlackboardHook>) {
        self.node_hook = node_hook;
        self.blackboard_hook = blackboard_hook;
        self.installed = true;
    }

    /// Convenience for the common case where both hooks exist.
    pub fn install_with<N, B>(&mut self, node_hook: N, blackboard_hook: B)
    where
        N: Fn(u32) + Send + Sync + 'static,
        B: Fn(&Blackboard) + Send + Sync + 'static,
    {
        self.install(Some(Box::new(node_hook)), Some(Box::new(blackboard_hook)));
    }

    /// Drop both hooks. Safe to call repeatedly.
    pub fn uninstall(&mut self) {
        self.node_hook = None;
        self.blackboard_hook = None;
        self.installed = false;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Hand the running node and its blackboard to whichever hooks are present.
    pub fn publish(&self, node_id: u32, blackboard: &Blackboard) {
        if !self.installed {
            return;
        }
        if let Some(hook) = &self.node_hook {
            hook(node_id);
        }
        if let Some(hook) = &self.blackboard_hook {
            hook(blackboard);
        }
    }
}

impl fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("installed", &self.installed)
            .field("node_hook", &self.node_hook.is_some())
            .field("blackboard_hook", &self.blackboard_hook.is_some())
            .finish()
    }
}
