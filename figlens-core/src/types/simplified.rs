//! Simplified node tree
//!
//! The output side of the walker. Style-like fields hold [`VarId`]
//! references into the global variable table rather than inline values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::raw::NodeKind;

/// Reference into the global variable table
///
/// Long form while the tree is being built (`fill_PNVRKQ`), short form
/// after ID compression (`f1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(String);

impl VarId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VarId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Absolute position and size of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// A property set on a component instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProperty {
    pub name: String,
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One node of the simplified tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedNode {
    pub id: String,
    pub name: String,

    /// Wire type name; vectors and collapsed icons report `IMAGE-SVG`
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<VarId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<VarId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<VarId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<VarId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<VarId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    /// CSS `border-radius` value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_properties: Vec<ComponentProperty>,

    /// Named-style reference (`{fill: "Brand/Primary", ...}` in the table)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<VarId>,

    /// Icon table reference for a collapsed vector subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Never serialized as an empty array
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SimplifiedNode>,
}

/// A node of the flattened wire form; `children` is always empty
pub type FlatNode = SimplifiedNode;

pub const IMAGE_SVG: &str = "IMAGE-SVG";

impl SimplifiedNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            bounding_box: None,
            text: None,
            text_style: None,
            fills: None,
            strokes: None,
            effects: None,
            layout: None,
            opacity: None,
            border_radius: None,
            component_id: None,
            component_properties: Vec::new(),
            styles: None,
            icon: None,
            children: Vec::new(),
        }
    }

    /// Start a simplified node for a raw node of the given kind
    pub fn for_kind(id: &str, name: &str, kind: &NodeKind) -> Self {
        let node_type = match kind {
            NodeKind::Vector => IMAGE_SVG,
            other => other.as_str(),
        };
        Self::new(id, name, node_type)
    }

    /// Mutable access to every field that may hold a variable reference
    pub fn var_refs_mut(&mut self) -> [&mut Option<VarId>; 6] {
        [
            &mut self.text_style,
            &mut self.fills,
            &mut self.strokes,
            &mut self.effects,
            &mut self.layout,
            &mut self.styles,
        ]
    }

    pub fn var_refs(&self) -> impl Iterator<Item = &VarId> {
        [
            &self.text_style,
            &self.fills,
            &self.strokes,
            &self.effects,
            &self.layout,
            &self.styles,
        ]
        .into_iter()
        .flatten()
    }

    /// Total number of nodes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SimplifiedNode::count).sum::<usize>()
    }
}
