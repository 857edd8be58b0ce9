//! Component and component-set definitions
//!
//! The design API attaches full component metadata to every response.
//! Only the identifying fields survive into the simplified design.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A published or local component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    /// Set this component is a variant of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_set_id: Option<String>,
}

/// A set of component variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSetDefinition {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named style from the response's `styles` catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedStyle {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub style_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Named styles keyed by style id (`S:abc...`)
pub type StyleCatalog = BTreeMap<String, NamedStyle>;

/// Sanitize a raw `components` map. Entries that are not objects are skipped.
pub fn sanitize_components(raw: &Map<String, Value>) -> BTreeMap<String, ComponentDefinition> {
    raw.iter()
        .filter_map(|(id, value)| {
            let entry = value.as_object()?;
            Some((
                id.clone(),
                ComponentDefinition {
                    id: id.clone(),
                    key: string_field(entry, "key"),
                    name: string_field(entry, "name"),
                    component_set_id: entry
                        .get("componentSetId")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            ))
        })
        .collect()
}

/// Sanitize a raw `componentSets` map. Entries that are not objects are skipped.
pub fn sanitize_component_sets(raw: &Map<String, Value>) -> BTreeMap<String, ComponentSetDefinition> {
    raw.iter()
        .filter_map(|(id, value)| {
            let entry = value.as_object()?;
            Some((
                id.clone(),
                ComponentSetDefinition {
                    id: id.clone(),
                    key: string_field(entry, "key"),
                    name: string_field(entry, "name"),
                    description: entry
                        .get("description")
                        .and_then(Value::as_str)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                },
            ))
        })
        .collect()
}

/// Parse a raw `styles` catalog, skipping entries without a name
pub fn parse_style_catalog(raw: &Map<String, Value>) -> StyleCatalog {
    raw.iter()
        .filter_map(|(id, value)| {
            let style = NamedStyle::deserialize(value).ok()?;
            Some((id.clone(), style))
        })
        .collect()
}

fn string_field(entry: &Map<String, Value>, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sanitize_components_keeps_identity_fields() {
        let raw = object(json!({
            "1:10": {
                "key": "abc",
                "name": "Button",
                "description": "Primary button",
                "componentSetId": "1:9",
                "documentationLinks": []
            },
            "1:11": "garbage"
        }));

        let components = sanitize_components(&raw);
        assert_eq!(components.len(), 1);

        let button = &components["1:10"];
        assert_eq!(button.id, "1:10");
        assert_eq!(button.name, "Button");
        assert_eq!(button.component_set_id.as_deref(), Some("1:9"));

        let json = serde_json::to_value(button).unwrap();
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_sanitize_component_sets() {
        let raw = object(json!({
            "1:9": { "key": "def", "name": "Button", "description": "" },
            "2:9": { "key": "ghi", "name": "Chip", "description": "Small pill" }
        }));

        let sets = sanitize_component_sets(&raw);
        assert_eq!(sets["1:9"].description, None);
        assert_eq!(sets["2:9"].description.as_deref(), Some("Small pill"));
    }

    #[test]
    fn test_style_catalog_skips_unnamed() {
        let raw = object(json!({
            "S:1": { "key": "k1", "name": "Brand/Primary", "styleType": "FILL" },
            "S:2": { "key": "k2" }
        }));

        let catalog = parse_style_catalog(&raw);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog["S:1"].name, "Brand/Primary");
    }
}
