//! Fill and stroke extractors

use serde::{Deserialize, Serialize};

use super::paint::{css_shorthand, simplify_paints, Paint, SimplifiedPaint};
use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{RawNode, SimplifiedNode};
use crate::vars::VarCategory;

pub struct FillsExtractor;

impl Extractor for FillsExtractor {
    fn name(&self) -> &'static str {
        "fills"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        let Some(paints) = read_prop::<Vec<Paint>>(node, "fills")? else {
            return Ok(());
        };
        let fills = simplify_paints(&paints)?;
        if !fills.is_empty() {
            out.fills = Some(ctx.intern(&fills, VarCategory::Fill)?);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct StrokeWeights {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

/// Stroke descriptor stored in the variable table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub colors: Vec<SimplifiedPaint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dashes: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_align: Option<String>,
}

pub struct StrokesExtractor;

impl Extractor for StrokesExtractor {
    fn name(&self) -> &'static str {
        "strokes"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        let paints = read_prop::<Vec<Paint>>(node, "strokes")?.unwrap_or_default();
        let colors = simplify_paints(&paints)?;
        if colors.is_empty() {
            return Ok(());
        }

        let stroke_weight = match read_prop::<StrokeWeights>(node, "individualStrokeWeights")? {
            Some(w) => css_shorthand(w.top, w.right, w.bottom, w.left, true),
            None => node
                .f64("strokeWeight")
                .filter(|w| *w > 0.0)
                .map(|w| format!("{}px", w)),
        };

        let stroke = Stroke {
            colors,
            stroke_weight,
            stroke_dashes: read_prop::<Vec<f64>>(node, "strokeDashes")?.filter(|d| !d.is_empty()),
            stroke_align: node.str("strokeAlign").map(str::to_string),
        };
        out.strokes = Some(ctx.intern(&stroke, VarCategory::Stroke)?);
        Ok(())
    }
}
