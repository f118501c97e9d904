//! Scene graph access trait

use gltfbridge_core::{NodeId, NodeUuid, Plug, Result};

/// Access to the host application's scene graph.
///
/// Every method reports host-state failures through `Err`. Absence of an
/// optional thing (an unconnected input, an attribute the node does not
/// carry) is `Ok(None)` or an empty list, never an error.
pub trait SceneGraph {
    /// Display name of a node. Not unique and not stable across renames.
    fn node_name(&self, node: NodeId) -> Result<String>;

    /// Host type name of a node (e.g. `lambert`, `file`, `blendShape`)
    fn node_type(&self, node: NodeId) -> Result<String>;

    /// Stable unique identifier of a node
    fn node_uuid(&self, node: NodeId) -> Result<NodeUuid>;

    /// Node whose output is connected to the named input of `node`
    fn source_node(&self, node: NodeId, attribute: &str) -> Result<Option<NodeId>>;

    /// Scalar attribute value, `None` if the attribute does not exist
    fn number(&self, plug: &Plug) -> Result<Option<f64>>;

    /// Three-component attribute value, `None` if the attribute does not exist
    fn vector(&self, plug: &Plug) -> Result<Option<[f64; 3]>>;

    /// String attribute value, `None` if the attribute does not exist
    fn text(&self, plug: &Plug) -> Result<Option<String>>;

    /// Existing logical elements of an array plug, ascending by index
    fn element_plugs(&self, array: &Plug) -> Result<Vec<Plug>>;

    /// Current effective value of a numeric plug
    fn plug_value(&self, plug: &Plug) -> Result<f64>;

    /// Assign a numeric plug. Fails if the plug is locked or driven.
    fn set_plug_value(&mut self, plug: &Plug, value: f64) -> Result<()>;

    fn is_locked(&self, plug: &Plug) -> Result<bool>;

    fn set_locked(&mut self, plug: &Plug, locked: bool) -> Result<()>;

    /// Plugs driving `plug`
    fn incoming(&self, plug: &Plug) -> Result<Vec<Plug>>;

    /// Plugs driven by `plug`
    fn outgoing(&self, plug: &Plug) -> Result<Vec<Plug>>;

    fn connect(&mut self, source: &Plug, destination: &Plug) -> Result<()>;

    fn disconnect(&mut self, source: &Plug, destination: &Plug) -> Result<()>;
}
