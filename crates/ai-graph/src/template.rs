use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use ai_core::{BbValue, TaskOutcome};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Identifier of a node inside one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a finished node sends the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Node(NodeId),
    Terminate,
}

impl Edge {
    pub fn target(self) -> Option<NodeId> {
        match self {
            Edge::Node(id) => Some(id),
            Edge::Terminate => None,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Node(id) => write!(f, "{id}"),
            Edge::Terminate => f.write_str("terminate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Runs the leaf registered under `leaf_id`.
    Leaf { leaf_id: String },
}

impl NodeKind {
    pub fn leaf_id(&self) -> Option<&str> {
        match self {
            NodeKind::Leaf { leaf_id } => Some(leaf_id.as_str()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Leaf { .. } => "leaf",
        }
    }
}

/// One node of a template. Parameters are baked at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDef {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub on_success: Edge,
    pub on_failure: Edge,
    pub params: BTreeMap<String, BbValue>,
}

impl NodeDef {
    /// A leaf node whose edges both terminate until set otherwise.
    pub fn leaf(id: u32, name: impl Into<String>, leaf_id: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            kind: NodeKind::Leaf {
                leaf_id: leaf_id.into(),
            },
            on_success: Edge::Terminate,
            on_failure: Edge::Terminate,
            params: BTreeMap::new(),
        }
    }

    pub fn on_success(mut self, target: u32) -> Self {
        self.on_success = Edge::Node(NodeId(target));
        self
    }

    pub fn on_failure(mut self, target: u32) -> Self {
        self.on_failure = Edge::Node(NodeId(target));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<BbValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn edge(&self, outcome: TaskOutcome) -> Edge {
        match outcome {
            TaskOutcome::Success => self.on_success,
            TaskOutcome::Failure => self.on_failure,
        }
    }

    pub fn leaf_id(&self) -> Option<&str> {
        self.kind.leaf_id()
    }

    fn edges(&self) -> [(&'static str, Edge); 2] {
        [("success", self.on_success), ("failure", self.on_failure)]
    }
}

/// Immutable node/edge definition shared by every agent bound to it.
///
/// Cycles are allowed. Call [`GraphTemplate::build_lookup_cache`] after the
/// last node is added; the loader does this for you. Share the finished
/// template behind an `Arc` and never mutate it again.
#[derive(Debug, Clone)]
pub struct GraphTemplate {
    name: String,
    root: NodeId,
    nodes: Vec<NodeDef>,
    lookup: HashMap<NodeId, usize>,
    cache_built: bool,
}

impl GraphTemplate {
    pub fn new(name: impl Into<String>, root: u32) -> Self {
        Self {
            name: name.into(),
            root: NodeId(root),
            nodes: Vec::new(),
            lookup: HashMap::new(),
            cache_built: false,
        }
    }

    /// Append a node. Invalidates a previously built cache.
    pub fn add_node(&mut self, node: NodeDef) -> &mut Self {
        self.nodes.push(node);
        self.lookup.clear();
        self.cache_built = false;
        self
    }

    pub fn with_node(mut self, node: NodeDef) -> Self {
        self.add_node(node);
        self
    }

    /// Populate the id -> index map. Idempotent; the first node wins when ids repeat.
    pub fn build_lookup_cache(&mut self) {
        if self.cache_built {
            return;
        }
        self.lookup.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.lookup.entry(node.id).or_insert(index);
        }
        self.cache_built = true;
    }

    pub fn is_cache_built(&self) -> bool {
        self.cache_built
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &[NodeDef] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cache-backed index lookup. `None` before the cache is built.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        if !self.cache_built {
            return None;
        }
        self.lookup.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeDef> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    /// Check structure: non-empty, unique ids, root present, every edge resolvable.
    ///
    /// Leaf ids are deliberately not checked against any registry.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.nodes.is_empty() {
            return Err(LoadError::EmptyGraph {
                graph: self.name.clone(),
            });
        }

        let mut seen: HashMap<NodeId, &str> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if let Some(first) = seen.insert(node.id, node.name.as_str()) {
                return Err(LoadError::DuplicateNodeId {
                    id: node.id,
                    name: node.name.clone(),
                    first: first.to_string(),
                });
            }
        }

        if !seen.contains_key(&self.root) {
            return Err(LoadError::MissingRoot {
                graph: self.name.clone(),
                root: self.root.0 as i64,
            });
        }

        for node in &self.nodes {
            for (edge, target) in node.edges() {
                let Edge::Node(target) = target else {
                    continue;
                };
                if !seen.contains_key(&target) {
                    return Err(LoadError::DanglingEdge {
                        id: node.id,
                        name: node.name.clone(),
                        edge,
                        target,
                    });
                }
            }
        }

        Ok(())
    }

    /// Nodes no edge path from the root can reach, in id order.
    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let by_id: HashMap<NodeId, &NodeDef> = self.nodes.iter().map(|n| (n.id, n)).collect();
        let mut visited = BTreeSet::new();
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = by_id.get(&id) else {
                continue;
            };
            for (_, edge) in node.edges() {
                if let Some(target) = edge.target() {
                    stack.push(target);
                }
            }
        }

        let all: BTreeSet<NodeId> = by_id.keys().copied().collect();
        all.difference(&visited).copied().collect()
    }
}
