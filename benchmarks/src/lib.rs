//! Synthetic design responses for benchmarking the simplification pipeline

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// A small palette so fills repeat the way real design systems do
const PALETTE: [(f64, f64, f64); 6] = [
    (1.0, 1.0, 1.0),
    (0.1, 0.1, 0.1),
    (0.2, 0.4, 0.9),
    (0.9, 0.9, 0.9),
    (0.95, 0.3, 0.3),
    (0.3, 0.8, 0.5),
];

fn solid(rng: &mut StdRng) -> Value {
    let (r, g, b) = PALETTE[rng.gen_range(0..PALETTE.len())];
    json!({ "type": "SOLID", "color": { "r": r, "g": g, "b": b, "a": 1 } })
}

fn text(id: String, rng: &mut StdRng) -> Value {
    let size = [12, 14, 16, 24][rng.gen_range(0..4)];
    json!({
        "id": id,
        "name": "Label",
        "type": "TEXT",
        "characters": "Lorem ipsum",
        "absoluteBoundingBox": { "x": 0, "y": 0, "width": 120, "height": size + 4 },
        "style": {
            "fontFamily": "Inter",
            "fontWeight": 400,
            "fontSize": size,
            "lineHeightPx": size + 4,
            "textAlignHorizontal": "LEFT"
        },
        "fills": [solid(rng)]
    })
}

fn icon(id: String, rng: &mut StdRng) -> Value {
    json!({
        "id": id,
        "name": "icon/check",
        "type": "FRAME",
        "absoluteBoundingBox": { "x": 0, "y": 0, "width": 24, "height": 24 },
        "children": [
            { "id": format!("{}v", id), "name": "Path", "type": "VECTOR", "fills": [solid(rng)] }
        ]
    })
}

fn card(prefix: u32, index: u32, rng: &mut StdRng) -> Value {
    let id = |n: u32| format!("{}:{}", prefix, index * 10 + n);
    let vertical = rng.gen_bool(0.5);
    json!({
        "id": id(0),
        "name": format!("Card {}", index),
        "type": "FRAME",
        "layoutMode": if vertical { "VERTICAL" } else { "HORIZONTAL" },
        "itemSpacing": 8,
        "paddingTop": 16,
        "paddingRight": 16,
        "paddingBottom": 16,
        "paddingLeft": 16,
        "cornerRadius": 8,
        "absoluteBoundingBox": { "x": 0, "y": index * 200, "width": 320, "height": 180 },
        "fills": [solid(rng)],
        "strokes": [solid(rng)],
        "strokeWeight": 1,
        "effects": [{
            "type": "DROP_SHADOW",
            "visible": true,
            "color": { "r": 0, "g": 0, "b": 0, "a": 0.1 },
            "offset": { "x": 0, "y": 2 },
            "radius": 8
        }],
        "children": [
            text(id(1), rng),
            text(id(2), rng),
            icon(id(3), rng),
            {
                "id": id(4),
                "name": "Divider",
                "type": "RECTANGLE",
                "absoluteBoundingBox": { "x": 0, "y": 0, "width": 288, "height": 1 },
                "fills": [solid(rng)]
            }
        ]
    })
}

/// A file response with `pages` canvases of `cards_per_page` cards each.
///
/// Every card holds two text nodes, an icon and a divider, so the response
/// carries `pages * (1 + cards_per_page * 6)` nodes below the document.
pub fn generate_file_response(pages: u32, cards_per_page: u32, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let canvases: Vec<Value> = (0..pages)
        .map(|page| {
            let prefix = page + 1;
            let cards: Vec<Value> = (0..cards_per_page)
                .map(|index| card(prefix, index, &mut rng))
                .collect();
            json!({
                "id": format!("0:{}", prefix),
                "name": format!("Page {}", prefix),
                "type": "CANVAS",
                "children": cards
            })
        })
        .collect();

    json!({
        "name": "Benchmark Design",
        "lastModified": "2024-01-01T00:00:00Z",
        "thumbnailUrl": "",
        "document": { "id": "0:0", "name": "Document", "type": "DOCUMENT", "children": canvases },
        "components": {},
        "componentSets": {},
        "styles": {}
    })
}

/// Number of nodes in a generated response, excluding the document
pub fn generated_node_count(pages: u32, cards_per_page: u32) -> u64 {
    pages as u64 * (1 + cards_per_page as u64 * 6)
}
