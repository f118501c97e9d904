//! In-memory scene graph
//!
//! Models the parts of a host scene graph the exporter touches: named nodes
//! with stable identifiers, typed plug values, lock flags and a set of
//! source → destination connections. Values propagate along connections
//! when a source is assigned or a connection is made, so a driven plug always
//! holds its source's value, and a plug keeps its last value when the
//! connection driving it is broken.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use gltfbridge_core::{Error, NodeId, NodeUuid, Plug, Result};

use crate::scene::SceneGraph;

/// Value stored on a plug
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Vector([f64; 3]),
    Text(String),
    /// Connection-only attribute carrying no data
    Message,
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "a number",
            Value::Vector(_) => "a vector",
            Value::Text(_) => "text",
            Value::Message => "no data",
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Number(if value { 1.0 } else { 0.0 })
    }
}

impl From<[f64; 3]> for Value {
    fn from(value: [f64; 3]) -> Self {
        Value::Vector(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Host operation forced to fail, for exercising fatal error paths
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Identifier lookup of the node fails
    Uuid(NodeId),
    /// Assigning the plug fails
    SetValue(Plug),
    /// Changing the plug's lock flag fails
    SetLocked(Plug),
    /// Connecting anything into the destination plug fails
    Connect(Plug),
    /// Disconnecting anything from the destination plug fails
    Disconnect(Plug),
}

#[derive(Debug, Clone, PartialEq)]
struct NodeRecord {
    name: String,
    node_type: String,
    uuid: NodeUuid,
}

#[derive(Debug, Clone, PartialEq)]
struct PlugRecord {
    value: Value,
    locked: bool,
}

impl PlugRecord {
    fn new(value: Value) -> Self {
        Self { value, locked: false }
    }
}

/// In-memory [`SceneGraph`]
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: Vec<NodeRecord>,
    names: HashMap<String, NodeId>,
    plugs: BTreeMap<Plug, PlugRecord>,
    /// (source, destination)
    connections: BTreeSet<(Plug, Plug)>,
    faults: HashSet<Fault>,
}

// Injected faults are test configuration, not graph state
impl PartialEq for MemoryScene {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.plugs == other.plugs
            && self.connections == other.connections
    }
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with a generated identifier
    pub fn add_node(&mut self, name: impl Into<String>, node_type: impl Into<String>) -> NodeId {
        let uuid = NodeUuid::new(format!("00000000-0000-4000-8000-{:012X}", self.nodes.len()));
        self.add_node_with_uuid(name, node_type, uuid)
    }

    /// Add a node with a caller-chosen identifier
    pub fn add_node_with_uuid(
        &mut self,
        name: impl Into<String>,
        node_type: impl Into<String>,
        uuid: NodeUuid,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        let name = name.into();
        self.names.insert(name.clone(), id);
        self.nodes.push(NodeRecord {
            name,
            node_type: node_type.into(),
            uuid,
        });
        id
    }

    /// Rename a node. Its identifier is unchanged.
    pub fn rename(&mut self, node: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let record = self
            .nodes
            .get_mut(node.value() as usize)
            .ok_or(Error::NodeNotFound(node))?;
        if self.names.get(&record.name) == Some(&node) {
            self.names.remove(&record.name);
        }
        record.name = name.clone();
        self.names.insert(name, node);
        Ok(())
    }

    /// Most recently added node with this name
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// All nodes of a host type, in creation order
    pub fn nodes_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, record)| record.node_type == node_type)
            .map(|(index, _)| NodeId::new(index as u32))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create or overwrite an attribute, bypassing locks and connections
    pub fn set_attribute(&mut self, node: NodeId, attribute: &str, value: impl Into<Value>) -> Plug {
        let plug = Plug::new(node, attribute);
        self.store(&plug, value.into());
        plug
    }

    /// Create array elements `0..values.len()`
    pub fn set_array(&mut self, node: NodeId, attribute: &str, values: &[f64]) -> Plug {
        let array = Plug::new(node, attribute);
        for (index, value) in values.iter().enumerate() {
            self.store(&array.element(index as u32), Value::Number(*value));
        }
        array
    }

    /// Create or overwrite one (possibly sparse) array element
    pub fn set_element(&mut self, node: NodeId, attribute: &str, index: u32, value: f64) -> Plug {
        let plug = Plug::new(node, attribute).element(index);
        self.store(&plug, Value::Number(value));
        plug
    }

    /// Lock an existing plug
    pub fn lock(&mut self, plug: &Plug) {
        if let Some(record) = self.plugs.get_mut(plug) {
            record.locked = true;
        }
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        self.faults.insert(fault);
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Raw stored value of a plug
    pub fn value(&self, plug: &Plug) -> Option<&Value> {
        self.plugs.get(plug).map(|record| &record.value)
    }

    /// All connections as (source, destination)
    pub fn connections(&self) -> impl Iterator<Item = (&Plug, &Plug)> {
        self.connections.iter().map(|(source, destination)| (source, destination))
    }

    fn store(&mut self, plug: &Plug, value: Value) {
        self.plugs
            .entry(plug.clone())
            .or_insert_with(|| PlugRecord::new(Value::Message))
            .value = value;
        self.propagate(plug);
    }

    fn check_fault(&self, fault: Fault, operation: &str) -> Result<()> {
        if self.faults.contains(&fault) {
            return Err(Error::host(operation, format!("injected fault: {fault:?}")));
        }
        Ok(())
    }

    fn node(&self, node: NodeId) -> Result<&NodeRecord> {
        self.nodes
            .get(node.value() as usize)
            .ok_or(Error::NodeNotFound(node))
    }

    fn record(&self, plug: &Plug) -> Result<&PlugRecord> {
        self.node(plug.node)?;
        self.plugs
            .get(plug)
            .ok_or_else(|| Error::PlugNotFound(plug.clone()))
    }

    fn driver(&self, plug: &Plug) -> Option<&Plug> {
        self.connections
            .iter()
            .find(|(_, destination)| destination == plug)
            .map(|(source, _)| source)
    }

    /// Push values downstream from `origin` along connections
    fn propagate(&mut self, origin: &Plug) {
        let mut pending = vec![origin.clone()];
        let mut visited = HashSet::new();

        while let Some(plug) = pending.pop() {
            if !visited.insert(plug.clone()) {
                continue;
            }
            let value = match self.plugs.get(&plug) {
                Some(record) if record.value != Value::Message => record.value.clone(),
                _ => continue,
            };
            let targets: Vec<Plug> = self
                .connections
                .iter()
                .filter(|(source, _)| *source == plug)
                .map(|(_, destination)| destination.clone())
                .collect();
            for target in targets {
                self.plugs
                    .entry(target.clone())
                    .or_insert_with(|| PlugRecord::new(Value::Message))
                    .value = value.clone();
                pending.push(target);
            }
        }
    }

    fn typed<T>(
        &self,
        plug: &Plug,
        expected: &str,
        extract: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        self.node(plug.node)?;
        match self.plugs.get(plug) {
            None => Ok(None),
            Some(record) if record.value == Value::Message => Ok(None),
            Some(record) => match extract(&record.value) {
                Some(value) => Ok(Some(value)),
                None => Err(Error::invalid_data(format!(
                    "{plug} holds {}, expected {expected}",
                    record.value.kind()
                ))),
            },
        }
    }
}

impl SceneGraph for MemoryScene {
    fn node_name(&self, node: NodeId) -> Result<String> {
        Ok(self.node(node)?.name.clone())
    }

    fn node_type(&self, node: NodeId) -> Result<String> {
        Ok(self.node(node)?.node_type.clone())
    }

    fn node_uuid(&self, node: NodeId) -> Result<NodeUuid> {
        let record = self.node(node)?;
        self.check_fault(Fault::Uuid(node), "uuid")?;
        Ok(record.uuid.clone())
    }

    fn source_node(&self, node: NodeId, attribute: &str) -> Result<Option<NodeId>> {
        self.node(node)?;
        let input = Plug::new(node, attribute);
        Ok(self.driver(&input).map(|source| source.node))
    }

    fn number(&self, plug: &Plug) -> Result<Option<f64>> {
        self.typed(plug, "a number", |value| match value {
            Value::Number(number) => Some(*number),
            _ => None,
        })
    }

    fn vector(&self, plug: &Plug) -> Result<Option<[f64; 3]>> {
        self.typed(plug, "a vector", |value| match value {
            Value::Vector(vector) => Some(*vector),
            _ => None,
        })
    }

    fn text(&self, plug: &Plug) -> Result<Option<String>> {
        self.typed(plug, "text", |value| match value {
            Value::Text(text) => Some(text.clone()),
            _ => None,
        })
    }

    fn element_plugs(&self, array: &Plug) -> Result<Vec<Plug>> {
        self.node(array.node)?;
        Ok(self
            .plugs
            .keys()
            .filter(|plug| {
                plug.node == array.node && plug.attribute == array.attribute && plug.is_element()
            })
            .cloned()
            .collect())
    }

    fn plug_value(&self, plug: &Plug) -> Result<f64> {
        match &self.record(plug)?.value {
            Value::Number(number) => Ok(*number),
            other => Err(Error::invalid_data(format!(
                "{plug} holds {}, expected a number",
                other.kind()
            ))),
        }
    }

    fn set_plug_value(&mut self, plug: &Plug, value: f64) -> Result<()> {
        let record = self.record(plug)?;
        self.check_fault(Fault::SetValue(plug.clone()), "setValue")?;
        if record.locked {
            return Err(Error::PlugLocked(plug.clone()));
        }
        if let Some(source) = self.driver(plug) {
            return Err(Error::PlugDriven {
                plug: plug.clone(),
                source_plug: source.clone(),
            });
        }
        self.store(plug, Value::Number(value));
        Ok(())
    }

    fn is_locked(&self, plug: &Plug) -> Result<bool> {
        Ok(self.record(plug)?.locked)
    }

    fn set_locked(&mut self, plug: &Plug, locked: bool) -> Result<()> {
        self.record(plug)?;
        self.check_fault(Fault::SetLocked(plug.clone()), "setLocked")?;
        if let Some(record) = self.plugs.get_mut(plug) {
            record.locked = locked;
        }
        Ok(())
    }

    fn incoming(&self, plug: &Plug) -> Result<Vec<Plug>> {
        self.record(plug)?;
        Ok(self.driver(plug).cloned().into_iter().collect())
    }

    fn outgoing(&self, plug: &Plug) -> Result<Vec<Plug>> {
        self.record(plug)?;
        Ok(self
            .connections
            .iter()
            .filter(|(source, _)| source == plug)
            .map(|(_, destination)| destination.clone())
            .collect())
    }

    fn connect(&mut self, source: &Plug, destination: &Plug) -> Result<()> {
        self.node(source.node)?;
        self.node(destination.node)?;
        self.check_fault(Fault::Connect(destination.clone()), "connectAttr")?;
        if let Some(driver) = self.driver(destination) {
            return Err(Error::host(
                "connectAttr",
                format!("{destination} is already connected to {driver}"),
            ));
        }

        self.plugs
            .entry(source.clone())
            .or_insert_with(|| PlugRecord::new(Value::Message));
        self.plugs
            .entry(destination.clone())
            .or_insert_with(|| PlugRecord::new(Value::Message));
        self.connections.insert((source.clone(), destination.clone()));
        self.propagate(source);
        Ok(())
    }

    fn disconnect(&mut self, source: &Plug, destination: &Plug) -> Result<()> {
        self.check_fault(Fault::Disconnect(destination.clone()), "disconnectAttr")?;
        if !self.connections.remove(&(source.clone(), destination.clone())) {
            return Err(Error::host(
                "disconnectAttr",
                format!("{source} is not connected to {destination}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driven_scene() -> (MemoryScene, Plug, Plug) {
        let mut scene = MemoryScene::new();
        let driver = scene.add_node("driver", "transform");
        let blend = scene.add_node("blendShape1", "blendShape");
        let source = scene.set_attribute(driver, "translateX", 0.75);
        scene.set_array(blend, "weight", &[0.0, 0.5]);
        let target = Plug::new(blend, "weight").element(0);
        scene.connect(&source, &target).unwrap();
        (scene, source, target)
    }

    #[test]
    fn test_connect_propagates_value() {
        let (scene, _, target) = driven_scene();
        assert_eq!(scene.plug_value(&target).unwrap(), 0.75);
    }

    #[test]
    fn test_set_on_source_propagates() {
        let (mut scene, source, target) = driven_scene();
        scene.set_plug_value(&source, 0.1).unwrap();
        assert_eq!(scene.plug_value(&target).unwrap(), 0.1);
    }

    #[test]
    fn test_driven_plug_rejects_assignment() {
        let (mut scene, _, target) = driven_scene();
        let err = scene.set_plug_value(&target, 1.0).unwrap_err();
        assert!(matches!(err, Error::PlugDriven { .. }));
    }

    #[test]
    fn test_disconnect_keeps_last_value() {
        let (mut scene, source, target) = driven_scene();
        scene.disconnect(&source, &target).unwrap();
        assert_eq!(scene.plug_value(&target).unwrap(), 0.75);
        scene.set_plug_value(&target, 0.0).unwrap();
        assert_eq!(scene.plug_value(&target).unwrap(), 0.0);
    }

    #[test]
    fn test_double_connect_is_rejected() {
        let (mut scene, source, target) = driven_scene();
        assert!(scene.connect(&source, &target).is_err());
    }

    #[test]
    fn test_locked_plug_rejects_assignment() {
        let (mut scene, _, _) = driven_scene();
        let blend = scene.find_node("blendShape1").unwrap();
        let plug = Plug::new(blend, "weight").element(1);
        scene.lock(&plug);

        assert!(matches!(
            scene.set_plug_value(&plug, 0.2),
            Err(Error::PlugLocked(_))
        ));
        scene.set_locked(&plug, false).unwrap();
        scene.set_plug_value(&plug, 0.2).unwrap();
    }

    #[test]
    fn test_element_plugs_sorted() {
        let mut scene = MemoryScene::new();
        let blend = scene.add_node("blendShape1", "blendShape");
        scene.set_element(blend, "weight", 4, 1.0);
        scene.set_element(blend, "weight", 1, 1.0);
        scene.set_attribute(blend, "envelope", 1.0);

        let elements = scene.element_plugs(&Plug::new(blend, "weight")).unwrap();
        let indices: Vec<_> = elements.iter().map(|plug| plug.index).collect();
        assert_eq!(indices, vec![Some(1), Some(4)]);
    }

    #[test]
    fn test_uuid_survives_rename() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        let before = scene.node_uuid(shader).unwrap();
        scene.rename(shader, "skin_mat").unwrap();

        assert_eq!(scene.node_uuid(shader).unwrap(), before);
        assert_eq!(scene.find_node("skin_mat"), Some(shader));
        assert_eq!(scene.find_node("lambert2"), None);
    }

    #[test]
    fn test_injected_fault() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        scene.inject_fault(Fault::Uuid(shader));

        assert!(scene.node_uuid(shader).unwrap_err().is_fatal());
        scene.clear_faults();
        assert!(scene.node_uuid(shader).is_ok());
    }

    #[test]
    fn test_missing_attribute_is_none() {
        let mut scene = MemoryScene::new();
        let shader = scene.add_node("lambert2", "lambert");
        scene.set_attribute(shader, "color", [0.5, 0.5, 0.5]);

        assert_eq!(scene.vector(&Plug::new(shader, "transparency")).unwrap(), None);
        assert!(scene.number(&Plug::new(shader, "color")).is_err());
        assert!(scene.node_name(NodeId::new(99)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_connection_only_plug_reads_as_absent() {
        let mut scene = MemoryScene::new();
        let file = scene.add_node("file1", "file");
        let shader = scene.add_node("lambert2", "lambert");
        scene
            .connect(&Plug::new(file, "outColor"), &Plug::new(shader, "color"))
            .unwrap();

        assert_eq!(scene.vector(&Plug::new(shader, "color")).unwrap(), None);
        assert_eq!(scene.source_node(shader, "color").unwrap(), Some(file));
    }
}
