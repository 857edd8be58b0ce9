//! Component-instance metadata and named-style references

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{ComponentProperty, NodeKind, RawNode, SimplifiedNode};
use crate::vars::VarCategory;

#[derive(Debug, Deserialize)]
struct RawComponentProperty {
    #[serde(default)]
    value: Value,
    #[serde(rename = "type", default)]
    kind: String,
}

pub struct ComponentExtractor;

impl Extractor for ComponentExtractor {
    fn name(&self) -> &'static str {
        "component"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        _ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        if node.kind != NodeKind::Instance {
            return Ok(());
        }

        out.component_id = read_prop::<String>(node, "componentId")?;
        let properties =
            read_prop::<Map<String, Value>>(node, "componentProperties")?.unwrap_or_default();
        out.component_properties = properties
            .into_iter()
            .map(|(name, raw)| {
                let prop = RawComponentProperty::deserialize(raw).map_err(|source| {
                    ExtractError::Malformed {
                        field: "componentProperties",
                        source,
                    }
                })?;
                Ok(ComponentProperty {
                    name,
                    value: prop.value,
                    kind: prop.kind,
                })
            })
            .collect::<Result<_, ExtractError>>()?;
        Ok(())
    }
}

/// Resolves a node's `styles` map (`{fill: "S:1"}`) to style names
pub struct NamedStyleExtractor;

impl Extractor for NamedStyleExtractor {
    fn name(&self) -> &'static str {
        "named-styles"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        let Some(refs) = read_prop::<Map<String, Value>>(node, "styles")? else {
            return Ok(());
        };

        let resolved: Map<String, Value> = refs
            .iter()
            .filter_map(|(slot, style_id)| {
                let style = ctx.styles.get(style_id.as_str()?)?;
                Some((slot.clone(), Value::String(style.name.clone())))
            })
            .collect();

        if !resolved.is_empty() {
            out.styles = Some(ctx.intern(&resolved, VarCategory::Style)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{node, run};
    use crate::types::{NamedStyle, StyleCatalog};
    use crate::vars::{DedupMode, GlobalVars};
    use serde_json::json;

    #[test]
    fn test_instance_metadata() {
        let raw = node(json!({
            "id": "5:1",
            "type": "INSTANCE",
            "componentId": "1:10",
            "componentProperties": {
                "Label#1:0": { "value": "Buy now", "type": "TEXT" },
                "Size": { "value": "Large", "type": "VARIANT", "boundVariables": {} }
            }
        }));

        let (out, vars) = run(&ComponentExtractor, &raw, None);
        let out = out.unwrap();
        assert_eq!(out.component_id.as_deref(), Some("1:10"));
        assert_eq!(
            out.component_properties,
            vec![
                ComponentProperty {
                    name: "Label#1:0".to_string(),
                    value: json!("Buy now"),
                    kind: "TEXT".to_string(),
                },
                ComponentProperty {
                    name: "Size".to_string(),
                    value: json!("Large"),
                    kind: "VARIANT".to_string(),
                },
            ]
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_non_instances_are_ignored() {
        let raw = node(json!({ "id": "1:10", "type": "COMPONENT", "componentId": "x" }));
        let (out, _) = run(&ComponentExtractor, &raw, None);
        assert_eq!(out.unwrap().component_id, None);
    }

    #[test]
    fn test_named_styles_resolve_against_catalog() {
        let raw = node(json!({
            "id": "1",
            "type": "TEXT",
            "styles": { "fill": "S:1", "text": "S:2", "effect": "S:missing" }
        }));
        let mut styles = StyleCatalog::new();
        for (id, name) in [("S:1", "Brand/Primary"), ("S:2", "Body/Regular")] {
            styles.insert(
                id.to_string(),
                NamedStyle {
                    key: String::new(),
                    name: name.to_string(),
                    style_type: None,
                    description: None,
                },
            );
        }

        let mut vars = GlobalVars::with_seed(DedupMode::InsertionOrder, 0);
        let mut out = SimplifiedNode::new("1", "Label", "TEXT");
        let mut ctx = ExtractContext {
            vars: &mut vars,
            styles: &styles,
        };
        NamedStyleExtractor
            .extract(&raw, None, &mut ctx, &mut out)
            .unwrap();

        let id = out.styles.unwrap();
        assert!(id.as_str().starts_with("style_"));
        assert_eq!(
            vars.get(&id).unwrap(),
            &json!({ "fill": "Brand/Primary", "text": "Body/Regular" })
        );
    }

    #[test]
    fn test_unresolved_styles_emit_nothing() {
        let raw = node(json!({ "id": "1", "type": "RECTANGLE", "styles": { "fill": "S:9" } }));
        let (out, vars) = run(&NamedStyleExtractor, &raw, None);

        assert_eq!(out.unwrap().styles, None);
        assert!(vars.is_empty());
    }
}
