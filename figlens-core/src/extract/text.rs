//! Text content and typography

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::paint::round_to;
use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{RawNode, SimplifiedNode};
use crate::vars::VarCategory;

/// The API's type style object (`style` on text nodes)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeStyle {
    font_family: Option<String>,
    font_weight: Option<Number>,
    font_size: Option<Number>,
    line_height_px: Option<f64>,
    letter_spacing: Option<f64>,
    text_case: Option<String>,
    text_decoration: Option<String>,
    text_align_horizontal: Option<String>,
    text_align_vertical: Option<String>,
}

/// Typography stored in the variable table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Number>,
    /// Relative to font size, e.g. `1.5em`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    /// Percent of font size, e.g. `2%`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_case: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align_vertical: Option<String>,
}

impl From<TypeStyle> for TextStyle {
    fn from(style: TypeStyle) -> Self {
        let font_size = style.font_size.as_ref().and_then(Number::as_f64).filter(|s| *s > 0.0);

        let line_height = match (style.line_height_px, font_size) {
            (Some(px), Some(size)) => Some(format!("{}em", round_to(px / size, 2))),
            _ => None,
        };
        let letter_spacing = match (style.letter_spacing, font_size) {
            (Some(spacing), Some(size)) if spacing != 0.0 => {
                Some(format!("{}%", round_to(spacing / size * 100.0, 2)))
            }
            _ => None,
        };

        Self {
            font_family: style.font_family,
            font_weight: style.font_weight,
            font_size: style.font_size,
            line_height,
            letter_spacing,
            text_case: style.text_case,
            text_decoration: style.text_decoration,
            text_align_horizontal: style.text_align_horizontal,
            text_align_vertical: style.text_align_vertical,
        }
    }
}

pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        out.text = read_prop::<String>(node, "characters")?;

        if let Some(style) = read_prop::<TypeStyle>(node, "style")? {
            let text_style = TextStyle::from(style);
            if text_style != TextStyle::default() {
                out.text_style = Some(ctx.intern(&text_style, VarCategory::Style)?);
            }
        }
        Ok(())
    }
}
