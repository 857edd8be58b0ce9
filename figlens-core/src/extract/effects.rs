//! Shadow and blur effects, rendered as CSS values

use serde::{Deserialize, Serialize};

use super::paint::Rgba;
use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{NodeKind, RawNode, SimplifiedNode};
use crate::vars::VarCategory;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct Offset {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct Effect {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    offset: Offset,
    #[serde(default)]
    radius: f64,
    #[serde(default)]
    spread: f64,
    color: Option<Rgba>,
}

fn default_visible() -> bool {
    true
}

const BLACK: Rgba = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

impl Effect {
    fn shadow(&self) -> String {
        let color = self.color.unwrap_or(BLACK).css_rgba(1.0);
        let shadow = format!(
            "{}px {}px {}px {}px {}",
            self.offset.x, self.offset.y, self.radius, self.spread, color
        );
        if self.kind == "INNER_SHADOW" {
            format!("inset {}", shadow)
        } else {
            shadow
        }
    }

    fn blur(&self) -> String {
        format!("blur({}px)", self.radius)
    }
}

/// Effects descriptor stored in the variable table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<String>,
}

fn join(parts: Vec<String>, separator: &str) -> Option<String> {
    (!parts.is_empty()).then(|| parts.join(separator))
}

pub struct EffectsExtractor;

impl Extractor for EffectsExtractor {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        let Some(effects) = read_prop::<Vec<Effect>>(node, "effects")? else {
            return Ok(());
        };

        let mut shadows = Vec::new();
        let mut layer_blurs = Vec::new();
        let mut background_blurs = Vec::new();
        for effect in effects.iter().filter(|e| e.visible) {
            match effect.kind.as_str() {
                "DROP_SHADOW" | "INNER_SHADOW" => shadows.push(effect.shadow()),
                "LAYER_BLUR" => layer_blurs.push(effect.blur()),
                "BACKGROUND_BLUR" => background_blurs.push(effect.blur()),
                _ => {}
            }
        }

        let shadow = join(shadows, ", ");
        let (box_shadow, text_shadow) = if node.kind == NodeKind::Text {
            (None, shadow)
        } else {
            (shadow, None)
        };
        let simplified = Effects {
            box_shadow,
            filter: join(layer_blurs, " "),
            backdrop_filter: join(background_blurs, " "),
            text_shadow,
        };

        if simplified != Effects::default() {
            out.effects = Some(ctx.intern(&simplified, VarCategory::Effect)?);
        }
        Ok(())
    }
}
