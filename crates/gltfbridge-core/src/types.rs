//! Common types used across gltfbridge
//!
//! This module provides the identifiers shared by the host collaborator and
//! the export core.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Handle to a node in the host scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Stable unique identifier of a node.
///
/// Survives renames and sessions, unlike the display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeUuid(String);

impl NodeUuid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute of a node, optionally one logical element of an array attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Plug {
    pub node: NodeId,
    pub attribute: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<u32>,
}

impl Plug {
    /// Plug for a whole attribute
    pub fn new(node: NodeId, attribute: impl Into<String>) -> Self {
        Self {
            node,
            attribute: attribute.into(),
            index: None,
        }
    }

    /// Plug for one logical element of this array attribute
    pub fn element(&self, index: u32) -> Self {
        Self {
            node: self.node,
            attribute: self.attribute.clone(),
            index: Some(index),
        }
    }

    /// The array plug this element belongs to
    pub fn array(&self) -> Self {
        Self::new(self.node, self.attribute.clone())
    }

    pub fn is_element(&self) -> bool {
        self.index.is_some()
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}.{}[{}]", self.node, self.attribute, index),
            None => write!(f, "{}.{}", self.node, self.attribute),
        }
    }
}

/// Color in hue/saturation/value form, all components in `0.0..=1.0`.
///
/// Equality and hashing compare the bit patterns of the components so the
/// type can key a map. `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl HsvColor {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }

    fn bits(&self) -> [u32; 3] {
        // Adding 0.0 turns -0.0 into +0.0
        [(self.h + 0.0).to_bits(), (self.s + 0.0).to_bits(), (self.v + 0.0).to_bits()]
    }

    /// Convert to linear RGB components
    pub fn to_rgb(&self) -> [f32; 3] {
        let h = self.h.rem_euclid(1.0) * 6.0;
        let s = self.s.clamp(0.0, 1.0);
        let v = self.v.clamp(0.0, 1.0);

        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match sector as u32 {
            0 => [v, t, p],
            1 => [q, v, p],
            2 => [p, v, t],
            3 => [p, q, v],
            4 => [t, p, v],
            _ => [v, p, q],
        }
    }
}

impl PartialEq for HsvColor {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for HsvColor {}

impl Hash for HsvColor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}
