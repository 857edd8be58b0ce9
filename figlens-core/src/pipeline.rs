//! Pipeline entry points
//!
//! raw response -> [`parse_response`] -> [`SimplifiedDesign`]
//! -> [`SimplifiedDesign::into_wire`] (compress, then flatten) -> [`WireDesign`]

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::compress::{compress, Compressed};
use crate::config::SimplifyOptions;
use crate::flatten::{flatten, FlatTree};
use crate::icons::{IconSource, IconTable, SubtreeDigest};
use crate::types::{
    parse_style_catalog, sanitize_component_sets, sanitize_components, ComponentDefinition,
    ComponentSetDefinition, FlatNode, RawNode, SimplifiedNode, StyleCatalog,
};
use crate::vars::GlobalVars;
use crate::walker::{NodeWalker, WalkState};

#[derive(Debug, thiserror::Error)]
pub enum SimplifyError {
    #[error("invalid design response: {0}")]
    InvalidResponse(String),
}

/// A simplified design before ID compression and flattening
#[derive(Debug)]
pub struct SimplifiedDesign {
    pub name: String,
    pub last_modified: String,
    pub thumbnail_url: String,
    pub nodes: Vec<SimplifiedNode>,
    pub components: BTreeMap<String, ComponentDefinition>,
    pub component_sets: BTreeMap<String, ComponentSetDefinition>,
    pub vars: GlobalVars,
    pub icons: IconTable,
}

/// Variable tables as sent on the wire
#[derive(Debug, Clone, Serialize)]
pub struct WireVars {
    pub styles: Map<String, Value>,
    pub icons: IconTable,
}

/// The final, wire-ready design
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDesign {
    pub name: String,
    pub last_modified: String,
    pub thumbnail_url: String,
    pub nodes: Vec<FlatNode>,
    pub components: BTreeMap<String, ComponentDefinition>,
    pub component_sets: BTreeMap<String, ComponentSetDefinition>,
    pub global_vars: WireVars,
    pub hierarchy: String,
}

impl SimplifiedDesign {
    /// Compress variable ids, then flatten the hierarchy
    pub fn into_wire(self) -> WireDesign {
        let Compressed { nodes, vars } = compress(self.nodes, self.vars);
        let FlatTree { hierarchy, nodes } = flatten(nodes);

        WireDesign {
            name: self.name,
            last_modified: self.last_modified,
            thumbnail_url: self.thumbnail_url,
            nodes,
            components: self.components,
            component_sets: self.component_sets,
            global_vars: WireVars {
                styles: vars.styles,
                icons: self.icons,
            },
            hierarchy,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(SimplifiedNode::count).sum()
    }
}

fn string_field(raw: &Map<String, Value>, key: &str, default: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn object_field<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    raw.get(key).and_then(Value::as_object)
}

/// Roots plus the component and style metadata that travel with them
#[derive(Default)]
struct ResponseParts {
    roots: Vec<Value>,
    components: BTreeMap<String, ComponentDefinition>,
    component_sets: BTreeMap<String, ComponentSetDefinition>,
    styles: StyleCatalog,
}

impl ResponseParts {
    fn absorb_metadata(&mut self, raw: &Map<String, Value>) {
        if let Some(components) = object_field(raw, "components") {
            self.components.extend(sanitize_components(components));
        }
        if let Some(sets) = object_field(raw, "componentSets") {
            self.component_sets.extend(sanitize_component_sets(sets));
        }
        if let Some(styles) = object_field(raw, "styles") {
            self.styles.extend(parse_style_catalog(styles));
        }
    }

    /// File responses root at `document.children`, node responses at `nodes.*.document`
    fn from_response(raw: &mut Map<String, Value>) -> Self {
        let mut parts = Self::default();
        parts.absorb_metadata(raw);

        let document_children = raw
            .get_mut("document")
            .and_then(Value::as_object_mut)
            .and_then(|doc| doc.get_mut("children"))
            .and_then(Value::as_array_mut)
            .map(std::mem::take);
        if let Some(children) = document_children {
            parts.roots = children;
            return parts;
        }

        if let Some(entries) = raw.get_mut("nodes").and_then(Value::as_object_mut) {
            for (node_id, entry) in entries.iter_mut() {
                let Some(entry) = entry.as_object_mut() else {
                    tracing::warn!("Skipping node entry {}: not an object", node_id);
                    continue;
                };
                parts.absorb_metadata(entry);
                match entry.remove("document") {
                    Some(document @ Value::Object(_)) => parts.roots.push(document),
                    _ => tracing::warn!("Skipping node entry {}: no document", node_id),
                }
            }
            return parts;
        }

        tracing::warn!("Could not find root nodes in design response");
        parts
    }
}

/// Simplify a raw design-API response.
///
/// `icons` is used to fetch collapsed icon assets; without one the subtree
/// digest is used.
pub async fn parse_response(
    raw: Value,
    icons: Option<&dyn IconSource>,
    options: &SimplifyOptions,
) -> Result<SimplifiedDesign, SimplifyError> {
    let Value::Object(mut raw) = raw else {
        return Err(SimplifyError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let parts = ResponseParts::from_response(&mut raw);
    let icon_source: &dyn IconSource = icons.unwrap_or(&SubtreeDigest);
    let walker = NodeWalker::new(icon_source, options.icon_mode, &parts.styles);
    let mut state = WalkState::new(options.new_vars());

    let mut nodes = Vec::new();
    for (index, root) in parts.roots.into_iter().enumerate() {
        let root = match RawNode::ingest(root) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Skipping root {}: {}", index, e);
                continue;
            }
        };
        if let Some(simplified) = walker.walk(&root, None, &mut state).await {
            nodes.push(simplified);
        }
    }

    let design = SimplifiedDesign {
        name: string_field(&raw, "name", "Untitled Design"),
        last_modified: string_field(&raw, "lastModified", ""),
        thumbnail_url: string_field(&raw, "thumbnailUrl", ""),
        nodes,
        components: parts.components,
        component_sets: parts.component_sets,
        vars: state.vars,
        icons: state.icons,
    };
    tracing::info!(
        "Simplified {}: {} nodes, {} variables, {} icons",
        design.name,
        design.node_count(),
        design.vars.len(),
        design.icons.len()
    );
    Ok(design)
}

/// [`parse_response`] followed by [`SimplifiedDesign::into_wire`]
pub async fn simplify(
    raw: Value,
    icons: Option<&dyn IconSource>,
    options: &SimplifyOptions,
) -> Result<WireDesign, SimplifyError> {
    Ok(parse_response(raw, icons, options).await?.into_wire())
}
