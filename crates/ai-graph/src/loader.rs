//! Declarative graph definitions (JSON or YAML) and their conversion into templates.
//!
//! ```yaml
//! name: guard
//! root: 0
//! nodes:
//!   - id: 0
//!     name: Start
//!     kind: leaf
//!     leaf_id: pick_goal
//!     next_on_success: 1
//!     next_on_failure: -1
//!   - id: 1
//!     name: MoveToGoal
//!     leaf_id: move_to
//!     next_on_success: 0
//!     parameters:
//!       speed: 2.5
//!       goal: [4.0, 0.0, 1.0]
//!       target: { entity: 17 }
//! ```
//!
//! Edges use `-1` (or omission) for "terminate". Keys are also accepted in
//! camelCase (`leafId`, `nextOnSuccess`, `nextOnFailure`).

use std::collections::BTreeMap;
use std::path::Path;

use ai_core::{BbValue, EntityRef, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::template::{Edge, GraphTemplate, NodeDef, NodeId, NodeKind};

/// Edge value meaning "stop walking the graph".
pub const TERMINATE: i64 = -1;

fn terminate() -> i64 {
    TERMINATE
}

fn default_kind() -> String {
    "leaf".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub name: String,
    pub root: i64,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, alias = "leafId")]
    pub leaf_id: Option<String>,
    #[serde(default = "terminate", alias = "nextOnSuccess")]
    pub next_on_success: i64,
    #[serde(default = "terminate", alias = "nextOnFailure")]
    pub next_on_failure: i64,
    #[serde(default, alias = "params")]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Yaml,
}

impl GraphFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(GraphFormat::Json),
            "yaml" | "yml" => Ok(GraphFormat::Yaml),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl GraphDefinition {
    pub fn from_json_str(source: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let format = GraphFormat::from_path(path)?;
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            GraphFormat::Json => Self::from_json_str(&source),
            GraphFormat::Yaml => Self::from_yaml_str(&source),
        }
    }

    /// Validate and convert into a template with its lookup cache built.
    pub fn into_template(self) -> Result<GraphTemplate, LoadError> {
        if self.nodes.is_empty() {
            return Err(LoadError::EmptyGraph { graph: self.name });
        }

        let root = u32::try_from(self.root).map_err(|_| LoadError::MissingRoot {
            graph: self.name.clone(),
            root: self.root,
        })?;

        let mut template = GraphTemplate::new(self.name, root);
        for node in self.nodes {
            template.add_node(node.into_node_def()?);
        }
        template.validate()?;
        template.build_lookup_cache();

        let unreachable = template.unreachable_nodes();
        if !unreachable.is_empty() {
            warn!(
                graph = template.name(),
                nodes = ?unreachable,
                "Nodes unreachable from root"
            );
        }
        info!(
            graph = template.name(),
            nodes = template.len(),
            root = %template.root(),
            "Loaded task graph"
        );
        Ok(template)
    }
}

impl NodeDefinition {
    fn into_node_def(self) -> Result<NodeDef, LoadError> {
        let id = u32::try_from(self.id)
            .map(NodeId)
            .map_err(|_| LoadError::InvalidNodeId {
                id: self.id,
                name: self.name.clone(),
            })?;

        let kind = match self.kind.as_str() {
            "leaf" => match self.leaf_id {
                Some(leaf_id) if !leaf_id.is_empty() => NodeKind::Leaf { leaf_id },
                _ => {
                    return Err(LoadError::MissingLeafId {
                        id,
                        name: self.name,
                    })
                }
            },
            other => {
                return Err(LoadError::UnknownKind {
                    id,
                    name: self.name.clone(),
                    kind: other.to_string(),
                })
            }
        };

        let on_success = convert_edge(id, &self.name, "success", self.next_on_success)?;
        let on_failure = convert_edge(id, &self.name, "failure", self.next_on_failure)?;

        let mut params = BTreeMap::new();
        for (key, value) in self.parameters {
            let converted = convert_param(&value).map_err(|reason| LoadError::InvalidParameter {
                id,
                name: self.name.clone(),
                key: key.clone(),
                reason,
            })?;
            params.insert(key, converted);
        }

        Ok(NodeDef {
            id,
            name: self.name,
            kind,
            on_success,
            on_failure,
            params,
        })
    }
}

fn convert_edge(id: NodeId, name: &str, edge: &'static str, value: i64) -> Result<Edge, LoadError> {
    if value == TERMINATE {
        return Ok(Edge::Terminate);
    }
    u32::try_from(value)
        .map(|target| Edge::Node(NodeId(target)))
        .map_err(|_| LoadError::InvalidEdge {
            id,
            name: name.to_string(),
            edge,
            value,
        })
}

/// Untyped definition value -> typed blackboard value.
fn convert_param(value: &Value) -> Result<BbValue, String> {
    match value {
        Value::Bool(b) => Ok(BbValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(BbValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(BbValue::Number(f))
            } else {
                Err(format!("has an unrepresentable number {n}"))
            }
        }
        Value::String(s) => Ok(BbValue::Text(s.clone())),
        Value::Array(items) => {
            let coords: Option<Vec<f32>> = items.iter().map(|v| v.as_f64().map(|f| f as f32)).collect();
            match coords.as_deref() {
                Some([x, y, z]) => Ok(BbValue::Vec3(Vec3::new(*x, *y, *z))),
                _ => Err("must be a vector of exactly three numbers".to_string()),
            }
        }
        Value::Object(map) => match (map.len(), map.get("entity").and_then(Value::as_u64)) {
            (1, Some(raw)) => Ok(BbValue::Entity(EntityRef::new(raw))),
            _ => Err("objects must have the form { entity: <u64> }".to_string()),
        },
        Value::Null => Err("must not be null".to_string()),
    }
}

/// Parse, validate and index a JSON graph definition.
pub fn load_json_str(source: &str) -> Result<GraphTemplate, LoadError> {
    GraphDefinition::from_json_str(source)?.into_template()
}

/// Parse, validate and index a YAML graph definition.
pub fn load_yaml_str(source: &str) -> Result<GraphTemplate, LoadError> {
    GraphDefinition::from_yaml_str(source)?.into_template()
}

/// Load a definition file; the format follows the extension.
pub fn load_path(path: impl AsRef<Path>) -> Result<GraphTemplate, LoadError> {
    GraphDefinition::from_path(path.as_ref())?.into_template()
}
