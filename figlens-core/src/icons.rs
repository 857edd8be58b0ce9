//! Icon classification
//!
//! A node whose visible children are all vector leaves is collapsed into a
//! single content-addressed icon reference instead of being expanded.
//! Asset bytes come from an [`IconSource`]: [`SubtreeDigest`] works offline
//! from the raw geometry, renderers backed by the design API live in the
//! API crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RawNode;

/// How candidate icon subtrees are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconMode {
    /// Hash the subtree's own geometry
    #[default]
    Digest,
    /// Hash the SVG rendered by the design API
    Rendered,
    /// Never collapse; expand vector children like any other node
    Off,
}

/// Why a node was collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseReason {
    VectorChildren { count: usize },
}

/// Outcome of the icon pruning rule for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Expand,
    Collapse(CollapseReason),
}

/// Decide whether a node is an atomic icon
pub fn classify(node: &RawNode, mode: IconMode) -> Classification {
    if mode == IconMode::Off {
        return Classification::Expand;
    }

    let mut count = 0;
    for child in node.visible_children() {
        if !child.is_vector_leaf() {
            return Classification::Expand;
        }
        count += 1;
    }

    if count == 0 {
        Classification::Expand
    } else {
        Classification::Collapse(CollapseReason::VectorChildren { count })
    }
}

/// Binary content for an icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("icon fetch failed for node {node_id}: {message}")]
    Fetch { node_id: String, message: String },

    #[error("no rendered asset available for node {0}")]
    Missing(String),

    #[error("failed to encode icon subtree: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fetches the binary content of a candidate icon
#[async_trait]
pub trait IconSource: Send + Sync {
    async fn fetch_icon(&self, node: &RawNode) -> Result<IconAsset, IconError>;
}

/// Offline icon source: the subtree's geometry serialized as JSON
///
/// Ids, names and absolute positions are left out, so the same icon placed
/// twice produces the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtreeDigest;

const POSITIONAL_KEYS: &[&str] = &[
    "absoluteBoundingBox",
    "absoluteRenderBounds",
    "absoluteTransform",
    "relativeTransform",
    "transitionNodeID",
    "exportSettings",
];

impl SubtreeDigest {
    fn geometry(node: &RawNode) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::String(node.kind.as_str().to_string()));
        if let Some(bounds) = node.get("absoluteBoundingBox").and_then(Value::as_object) {
            for key in ["width", "height"] {
                if let Some(v) = bounds.get(key) {
                    out.insert(key.to_string(), v.clone());
                }
            }
        }
        for (key, value) in &node.props {
            if !POSITIONAL_KEYS.contains(&key.as_str()) {
                out.insert(key.clone(), value.clone());
            }
        }
        let children: Vec<Value> = node.visible_children().map(Self::geometry).collect();
        if !children.is_empty() {
            out.insert("children".to_string(), Value::Array(children));
        }
        Value::Object(out)
    }

    pub fn render(node: &RawNode) -> Result<IconAsset, IconError> {
        Ok(IconAsset {
            bytes: serde_json::to_vec(&Self::geometry(node))?,
            content_type: "application/json".to_string(),
        })
    }
}

#[async_trait]
impl IconSource for SubtreeDigest {
    async fn fetch_icon(&self, node: &RawNode) -> Result<IconAsset, IconError> {
        Self::render(node)
    }
}

/// Metadata for one distinct icon asset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconDescriptor {
    /// Full blake3 hash of the asset bytes
    pub hash: String,
    pub content_type: String,
    pub byte_length: usize,
    /// Every collapsed node that resolved to this asset
    pub node_ids: Vec<String>,
}

/// Content-addressed icon references, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconTable {
    entries: Vec<(String, IconDescriptor)>,
}

impl IconTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference for an asset: `icon_` plus the first 16 hex chars of its hash
    pub fn reference(asset: &IconAsset) -> (String, String) {
        let hash = hex::encode(blake3::hash(&asset.bytes).as_bytes());
        (format!("icon_{}", &hash[..16]), hash)
    }

    /// Record that `node_id` collapsed to `asset`; identical content shares a reference
    pub fn register(&mut self, asset: &IconAsset, node_id: &str) -> String {
        let (reference, hash) = Self::reference(asset);
        match self.entries.iter_mut().find(|(r, _)| *r == reference) {
            Some((_, descriptor)) => descriptor.node_ids.push(node_id.to_string()),
            None => self.entries.push((
                reference.clone(),
                IconDescriptor {
                    hash,
                    content_type: asset.content_type.clone(),
                    byte_length: asset.bytes.len(),
                    node_ids: vec![node_id.to_string()],
                },
            )),
        }
        reference
    }

    pub fn get(&self, reference: &str) -> Option<&IconDescriptor> {
        self.entries
            .iter()
            .find(|(r, _)| r == reference)
            .map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IconDescriptor)> {
        self.entries.iter().map(|(r, d)| (r.as_str(), d))
    }
}

impl Serialize for IconTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(r, d)| (r, d)))
    }
}
