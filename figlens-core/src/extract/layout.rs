//! Layout extraction
//!
//! Maps auto-layout frames onto flexbox terms (`row`/`column`, justify and
//! align values, gap, padding) and records sizing and placement relative to
//! the parent. Every visible node gets a layout entry; plain nodes share
//! the `{mode: none, ...}` entries through deduplication.

use serde::Serialize;

use super::paint::{css_shorthand, round_to};
use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{BoundingBox, RawNode, SimplifiedNode};
use crate::vars::VarCategory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A dimension in px or one of the sizing keywords
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dimension {
    Px(f64),
    Keyword(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width: Dimension,
    pub height: Dimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sizing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<&'static str>,
}

/// Layout descriptor stored in the variable table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_items: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_self: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_relative_to_parent: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizing: Option<Sizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_scroll: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'static str>,
}

impl Layout {
    fn none() -> Self {
        Self {
            mode: "none",
            justify_content: None,
            align_items: None,
            align_self: None,
            wrap: None,
            gap: None,
            location_relative_to_parent: None,
            dimensions: None,
            padding: None,
            sizing: None,
            overflow_scroll: None,
            position: None,
        }
    }
}

fn flex_align(value: Option<&str>) -> Option<&'static str> {
    match value? {
        "MIN" => Some("flex-start"),
        "MAX" => Some("flex-end"),
        "CENTER" => Some("center"),
        "SPACE_BETWEEN" => Some("space-between"),
        "BASELINE" => Some("baseline"),
        "STRETCH" => Some("stretch"),
        _ => None,
    }
}

fn self_align(value: Option<&str>) -> Option<&'static str> {
    match value? {
        "MIN" => Some("flex-start"),
        "MAX" => Some("flex-end"),
        "CENTER" => Some("center"),
        "STRETCH" => Some("stretch"),
        _ => None,
    }
}

fn sizing_mode(value: Option<&str>) -> Option<&'static str> {
    match value? {
        "FIXED" => Some("fixed"),
        "FILL" => Some("fill"),
        "HUG" => Some("hug"),
        _ => None,
    }
}

fn overflow(value: Option<&str>) -> Option<Vec<&'static str>> {
    match value? {
        "HORIZONTAL_SCROLLING" => Some(vec!["x"]),
        "VERTICAL_SCROLLING" => Some(vec!["y"]),
        "HORIZONTAL_AND_VERTICAL_SCROLLING" => Some(vec!["x", "y"]),
        _ => None,
    }
}

/// Container properties: direction, alignment, gap, padding, scrolling
fn frame_values(node: &RawNode, layout: &mut Layout) {
    if !node.is_frame() {
        return;
    }

    layout.mode = match node.str("layoutMode") {
        Some("HORIZONTAL") => "row",
        Some("VERTICAL") => "column",
        _ => "none",
    };
    if layout.mode == "none" {
        layout.overflow_scroll = overflow(node.str("overflowDirection"));
        return;
    }

    layout.justify_content = flex_align(node.str("primaryAxisAlignItems"));
    layout.align_items = flex_align(node.str("counterAxisAlignItems"));
    if node.str("layoutWrap") == Some("WRAP") {
        layout.wrap = Some(true);
    }
    layout.gap = node
        .f64("itemSpacing")
        .filter(|gap| *gap > 0.0)
        .map(|gap| format!("{}px", gap));
    layout.padding = css_shorthand(
        node.f64("paddingTop").unwrap_or(0.0),
        node.f64("paddingRight").unwrap_or(0.0),
        node.f64("paddingBottom").unwrap_or(0.0),
        node.f64("paddingLeft").unwrap_or(0.0),
        true,
    );
    if node.get("clipsContent").and_then(|v| v.as_bool()) == Some(true) {
        layout.overflow_scroll = overflow(node.str("overflowDirection"));
    }
}

/// Item properties: sizing, positioning and dimensions within the parent
fn item_values(
    node: &RawNode,
    parent: Option<&RawNode>,
    layout: &mut Layout,
) -> Result<(), ExtractError> {
    let Some(bounds) = read_prop::<BoundingBox>(node, "absoluteBoundingBox")? else {
        return Ok(());
    };

    let horizontal = sizing_mode(node.str("layoutSizingHorizontal"));
    let vertical = sizing_mode(node.str("layoutSizingVertical"));
    if horizontal.is_some() || vertical.is_some() {
        layout.sizing = Some(Sizing {
            horizontal,
            vertical,
        });
    }

    let absolute = node.str("layoutPositioning") == Some("ABSOLUTE");
    if absolute {
        layout.position = Some("absolute");
    }

    let parent_is_frame = parent.is_some_and(RawNode::is_frame);
    let parent_is_auto = parent.is_some_and(RawNode::is_auto_layout);

    if parent_is_auto && !absolute {
        layout.align_self = self_align(node.str("layoutAlign"));
    }

    if absolute || (parent_is_frame && !parent_is_auto) {
        if let Some(parent_bounds) = parent
            .map(|p| read_prop::<BoundingBox>(p, "absoluteBoundingBox"))
            .transpose()?
            .flatten()
        {
            layout.location_relative_to_parent = Some(Point {
                x: bounds.x - parent_bounds.x,
                y: bounds.y - parent_bounds.y,
            });
        }
    }

    let stretch = parent_is_auto && node.str("layoutAlign") == Some("STRETCH");
    let parent_mode = parent.and_then(|p| p.str("layoutMode"));
    let stretch_h = stretch && parent_mode == Some("VERTICAL");
    let stretch_v = stretch && parent_mode == Some("HORIZONTAL");

    let keyword = |mode: Option<&str>, stretched: bool, px: f64| -> Dimension {
        if stretched {
            return Dimension::Keyword("stretch");
        }
        match mode {
            Some("fill") => Dimension::Keyword("fill-container"),
            Some("hug") => Dimension::Keyword("hug-contents"),
            _ => Dimension::Px(px),
        }
    };

    let preserve_ratio = node.get("preserveRatio").and_then(|v| v.as_bool()) == Some(true);
    let aspect_ratio = (preserve_ratio
        && !(stretch_h && stretch_v)
        && bounds.width > 0.0
        && bounds.height > 0.0)
        .then(|| round_to(bounds.width / bounds.height, 4));

    layout.dimensions = Some(Dimensions {
        width: keyword(horizontal, stretch_h, bounds.width),
        height: keyword(vertical, stretch_v, bounds.height),
        aspect_ratio,
    });
    Ok(())
}

/// Build the layout descriptor for a node
pub fn build_layout(node: &RawNode, parent: Option<&RawNode>) -> Result<Layout, ExtractError> {
    let mut layout = Layout::none();
    frame_values(node, &mut layout);
    item_values(node, parent, &mut layout)?;
    Ok(layout)
}

pub struct LayoutExtractor;

impl Extractor for LayoutExtractor {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn extract(
        &self,
        node: &RawNode,
        parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        let layout = build_layout(node, parent)?;
        out.layout = Some(ctx.intern(&layout, VarCategory::Layout)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::node;
    use serde_json::json;

    fn auto_layout_row() -> RawNode {
        node(json!({
            "id": "1:1",
            "type": "FRAME",
            "clipsContent": true,
            "layoutMode": "HORIZONTAL",
            "primaryAxisAlignItems": "SPACE_BETWEEN",
            "counterAxisAlignItems": "CENTER",
            "itemSpacing": 10,
            "paddingTop": 5, "paddingRight": 5, "paddingBottom": 5, "paddingLeft": 5,
            "overflowDirection": "HORIZONTAL_SCROLLING",
            "layoutSizingHorizontal": "HUG",
            "layoutSizingVertical": "FIXED",
            "preserveRatio": true,
            "absoluteBoundingBox": { "x": 0, "y": 0, "width": 100, "height": 50 }
        }))
    }

    fn to_json(layout: &Layout) -> serde_json::Value {
        serde_json::to_value(layout).unwrap()
    }

    #[test]
    fn test_auto_layout_frame() {
        let layout = build_layout(&auto_layout_row(), None).unwrap();
        assert_eq!(
            to_json(&layout),
            json!({
                "mode": "row",
                "justifyContent": "space-between",
                "alignItems": "center",
                "gap": "10px",
                "dimensions": { "width": "hug-contents", "height": 50.0, "aspectRatio": 2.0 },
                "padding": "5px",
                "sizing": { "horizontal": "hug", "vertical": "fixed" },
                "overflowScroll": ["x"]
            })
        );
    }

    #[test]
    fn test_stretch_child_of_row() {
        let parent = auto_layout_row();
        let child = node(json!({
            "id": "1:2",
            "type": "RECTANGLE",
            "layoutAlign": "STRETCH",
            "layoutSizingHorizontal": "FIXED",
            "layoutSizingVertical": "FILL",
            "absoluteBoundingBox": { "x": 5, "y": 5, "width": 20, "height": 40 }
        }));

        let layout = build_layout(&child, Some(&parent)).unwrap();
        assert_eq!(layout.mode, "none");
        assert_eq!(layout.align_self, Some("stretch"));
        assert_eq!(layout.location_relative_to_parent, None);
        assert_eq!(
            layout.dimensions,
            Some(Dimensions {
                width: Dimension::Px(20.0),
                height: Dimension::Keyword("stretch"),
                aspect_ratio: None,
            })
        );
    }

    #[test]
    fn test_absolute_child_gets_location() {
        let parent = auto_layout_row();
        let child = node(json!({
            "id": "1:3",
            "type": "RECTANGLE",
            "layoutPositioning": "ABSOLUTE",
            "layoutAlign": "CENTER",
            "absoluteBoundingBox": { "x": 70, "y": 10, "width": 25, "height": 30 }
        }));

        let layout = build_layout(&child, Some(&parent)).unwrap();
        assert_eq!(layout.position, Some("absolute"));
        assert_eq!(layout.align_self, None);
        assert_eq!(layout.location_relative_to_parent, Some(Point { x: 70.0, y: 10.0 }));
    }

    #[test]
    fn test_child_of_plain_frame() {
        let parent = node(json!({
            "id": "2:1",
            "type": "FRAME",
            "clipsContent": false,
            "layoutMode": "NONE",
            "absoluteBoundingBox": { "x": 100, "y": 100, "width": 200, "height": 200 }
        }));
        let child = node(json!({
            "id": "2:2",
            "type": "RECTANGLE",
            "layoutAlign": "CENTER",
            "absoluteBoundingBox": { "x": 110, "y": 120, "width": 50, "height": 60 }
        }));

        let layout = build_layout(&child, Some(&parent)).unwrap();
        assert_eq!(
            to_json(&layout),
            json!({
                "mode": "none",
                "locationRelativeToParent": { "x": 10.0, "y": 20.0 },
                "dimensions": { "width": 50.0, "height": 60.0 }
            })
        );
    }

    #[test]
    fn test_node_without_bounds() {
        let layout = build_layout(&node(json!({ "id": "0:1", "type": "CANVAS" })), None).unwrap();
        assert_eq!(to_json(&layout), json!({ "mode": "none" }));
    }
}
