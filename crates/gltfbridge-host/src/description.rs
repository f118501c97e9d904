//! JSON scene descriptions
//!
//! A small serialized form of a [`MemoryScene`], used by the command line
//! front end and by tests:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "lambert2", "type": "lambert", "attributes": { "color": [0.8, 0.2, 0.2] } },
//!     { "name": "lambert2SG", "type": "shadingEngine" },
//!     { "name": "blendShape1", "type": "blendShape", "arrays": { "weight": [0.5, 1.0] } }
//!   ],
//!   "connections": [ { "from": "lambert2.outColor", "to": "lambert2SG.surfaceShader" } ],
//!   "locked": [ "blendShape1.weight[1]" ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use gltfbridge_core::{Error, NodeUuid, Plug, Result, ResultExt};
use serde::{Deserialize, Serialize};

use crate::memory::{MemoryScene, Value};
use crate::scene::SceneGraph;

/// Serialized scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
    /// Plug paths to lock after the scene is built
    #[serde(default)]
    pub locked: Vec<String>,
}

/// One node of a [`SceneDescription`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub arrays: BTreeMap<String, Vec<f64>>,
}

/// Attribute value as written in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(f64),
    Vector([f64; 3]),
    Text(String),
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Flag(flag) => Value::from(flag),
            AttributeValue::Number(number) => Value::Number(number),
            AttributeValue::Vector(vector) => Value::Vector(vector),
            AttributeValue::Text(text) => Value::Text(text),
        }
    }
}

/// Connection between two plug paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub from: String,
    pub to: String,
}

impl SceneDescription {
    /// Parse a description from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::invalid_data(format!("scene description: {e}")))
    }

    /// Read and parse a description file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Build the in-memory scene
    pub fn build(&self) -> Result<MemoryScene> {
        let mut scene = MemoryScene::new();

        for node in &self.nodes {
            let id = match &node.uuid {
                Some(uuid) => scene.add_node_with_uuid(&node.name, &node.node_type, NodeUuid::new(uuid)),
                None => scene.add_node(&node.name, &node.node_type),
            };
            for (attribute, value) in &node.attributes {
                scene.set_attribute(id, attribute, Value::from(value.clone()));
            }
            for (attribute, values) in &node.arrays {
                scene.set_array(id, attribute, values);
            }
        }

        for connection in &self.connections {
            let source = parse_plug(&scene, &connection.from)?;
            let destination = parse_plug(&scene, &connection.to)?;
            scene
                .connect(&source, &destination)
                .with_context(|| format!("connecting {} -> {}", connection.from, connection.to))?;
        }

        for path in &self.locked {
            let plug = parse_plug(&scene, path)?;
            scene.lock(&plug);
        }

        Ok(scene)
    }
}

/// Resolve `node.attribute` or `node.attribute[index]` against a scene
pub fn parse_plug(scene: &MemoryScene, path: &str) -> Result<Plug> {
    let (name, attribute) = path
        .split_once('.')
        .ok_or_else(|| Error::invalid_data(format!("plug path '{path}' has no attribute")))?;
    let node = scene
        .find_node(name)
        .ok_or_else(|| Error::invalid_data(format!("plug path '{path}' names unknown node '{name}'")))?;

    match attribute.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
        Some((attribute, index)) => {
            let index = index
                .parse::<u32>()
                .map_err(|e| Error::invalid_data(format!("plug path '{path}': {e}")))?;
            Ok(Plug::new(node, attribute).element(index))
        }
        None if attribute.is_empty() => {
            Err(Error::invalid_data(format!("plug path '{path}' has no attribute")))
        }
        None => Ok(Plug::new(node, attribute)),
    }
}
