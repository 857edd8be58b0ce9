//! Bounding box, opacity and corner radius

use super::{read_prop, ExtractContext, ExtractError, Extractor};
use crate::types::{BoundingBox, RawNode, SimplifiedNode};

pub struct GeometryExtractor;

impl Extractor for GeometryExtractor {
    fn name(&self) -> &'static str {
        "geometry"
    }

    fn extract(
        &self,
        node: &RawNode,
        _parent: Option<&RawNode>,
        _ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError> {
        out.bounding_box = read_prop::<BoundingBox>(node, "absoluteBoundingBox")?;
        out.opacity = node.f64("opacity");
        out.border_radius = border_radius(node)?;
        Ok(())
    }
}

fn border_radius(node: &RawNode) -> Result<Option<String>, ExtractError> {
    if let Some(radii) = read_prop::<Vec<f64>>(node, "rectangleCornerRadii")? {
        if radii.len() == 4 {
            if radii.iter().all(|r| *r == 0.0) {
                return Ok(None);
            }
            if radii.iter().all(|r| *r == radii[0]) {
                return Ok(Some(format!("{}px", radii[0])));
            }
            let joined: Vec<String> = radii.iter().map(|r| format!("{}px", r)).collect();
            return Ok(Some(joined.join(" ")));
        }
    }

    Ok(node
        .f64("cornerRadius")
        .filter(|r| *r > 0.0)
        .map(|r| format!("{}px", r)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{node, run};
    use serde_json::json;

    #[test]
    fn test_bounding_box_and_opacity() {
        let raw = node(json!({
            "id": "1:1",
            "type": "RECTANGLE",
            "opacity": 0.4,
            "absoluteBoundingBox": { "x": 10, "y": 20, "width": 100, "height": 50 }
        }));

        let (out, vars) = run(&GeometryExtractor, &raw, None);
        let out = out.unwrap();
        assert_eq!(
            out.bounding_box,
            Some(BoundingBox { x: 10.0, y: 20.0, width: 100.0, height: 50.0 })
        );
        assert_eq!(out.opacity, Some(0.4));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_corner_radii() {
        let uniform = node(json!({ "id": "1", "type": "RECTANGLE", "rectangleCornerRadii": [4, 4, 4, 4] }));
        let mixed = node(json!({ "id": "2", "type": "RECTANGLE", "rectangleCornerRadii": [8, 8, 0, 0] }));
        let zero = node(json!({ "id": "3", "type": "RECTANGLE", "rectangleCornerRadii": [0, 0, 0, 0] }));
        let single = node(json!({ "id": "4", "type": "FRAME", "cornerRadius": 12 }));
        let none = node(json!({ "id": "5", "type": "FRAME", "cornerRadius": 0 }));

        let radius = |n: &RawNode| run(&GeometryExtractor, n, None).0.unwrap().border_radius;
        assert_eq!(radius(&uniform).as_deref(), Some("4px"));
        assert_eq!(radius(&mixed).as_deref(), Some("8px 8px 0px 0px"));
        assert_eq!(radius(&zero), None);
        assert_eq!(radius(&single).as_deref(), Some("12px"));
        assert_eq!(radius(&none), None);
    }

    #[test]
    fn test_malformed_bounding_box() {
        let raw = node(json!({ "id": "1", "type": "FRAME", "absoluteBoundingBox": "wide" }));
        let (out, _) = run(&GeometryExtractor, &raw, None);
        assert!(matches!(
            out,
            Err(ExtractError::Malformed { field: "absoluteBoundingBox", .. })
        ));
    }
}
