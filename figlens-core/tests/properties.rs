//! Property tests for variable dedup, id compression and hierarchy flattening

use std::collections::HashSet;

use figlens_core::{
    compress, decompress, flatten, parse_hierarchy, preorder_ids, DedupMode, GlobalVars,
    SimplifiedNode, VarCategory, VarId,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn node_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,4}:[0-9]{1,4}",
        "I[0-9]{1,3}:[0-9]{1,3};[0-9]{1,3}:[0-9]{1,3}",
    ]
}

fn tree() -> impl Strategy<Value = SimplifiedNode> {
    let leaf = node_id().prop_map(|id| SimplifiedNode::new(id.clone(), id, "RECTANGLE"));
    leaf.prop_recursive(4, 48, 5, |inner| {
        (node_id(), prop::collection::vec(inner, 0..5)).prop_map(|(id, children)| {
            let mut node = SimplifiedNode::new(id.clone(), id, "FRAME");
            node.children = children;
            node
        })
    })
}

fn preorder(node: &SimplifiedNode, out: &mut Vec<String>) {
    out.push(node.id.clone());
    for child in &node.children {
        preorder(child, out);
    }
}

fn long_ids() -> impl Strategy<Value = Vec<String>> {
    let long = "[A-Za-z]{1,8}_[A-Z0-9]{6}";
    let verbatim = "[a-z]{1,2}[0-9]{1,2}";
    prop::collection::vec(prop_oneof![4 => long, 1 => verbatim], 0..40).prop_map(|ids| {
        let mut seen = HashSet::new();
        ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
    })
}

fn category() -> impl Strategy<Value = VarCategory> {
    prop_oneof![
        Just(VarCategory::Style),
        Just(VarCategory::Fill),
        Just(VarCategory::Stroke),
        Just(VarCategory::Effect),
        Just(VarCategory::Layout),
    ]
}

fn small_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "#[0-9A-F]{6}".prop_map(|hex| json!([hex])),
        (0u8..4, 0u8..4).prop_map(|(a, b)| json!({ "gap": format!("{}px", a), "padding": b })),
    ]
}

proptest! {
    #[test]
    fn test_flatten_lists_every_node_in_preorder(roots in prop::collection::vec(tree(), 0..4)) {
        let mut expected = Vec::new();
        for root in &roots {
            preorder(root, &mut expected);
        }

        let flat = flatten(roots.clone());
        let shape = parse_hierarchy(&flat.hierarchy).unwrap();
        let ids: Vec<String> = preorder_ids(&shape).into_iter().map(str::to_string).collect();

        prop_assert_eq!(&ids, &expected);
        prop_assert_eq!(flat.nodes.len(), expected.len());
        prop_assert!(flat.nodes.iter().all(|n| n.children.is_empty()));
        prop_assert_eq!(flat.rebuild().unwrap(), roots);
    }

    #[test]
    fn test_short_ids_are_injective(ids in long_ids()) {
        let vars = GlobalVars::from_entries(
            DedupMode::InsertionOrder,
            ids.iter().enumerate().map(|(i, id)| (VarId::from(id.as_str()), json!(i))),
        );
        let compressed = compress(Vec::new(), vars).vars;

        prop_assert_eq!(compressed.styles.len(), ids.len());
        let mut shorts = HashSet::new();
        for id in &ids {
            let long = VarId::from(id.as_str());
            let short = compressed.short_id(&long).unwrap();
            prop_assert!(shorts.insert(short.clone()), "{} issued twice", short);
            prop_assert_eq!(compressed.long_id(short), Some(&long));
        }

        let originals: HashSet<_> = compressed.prefix_map.values().collect();
        prop_assert_eq!(originals.len(), compressed.prefix_map.len());
    }

    #[test]
    fn test_compress_then_decompress_restores_references(
        values in prop::collection::vec((small_value(), category()), 1..30),
        seed in any::<u64>()
    ) {
        let mut vars = GlobalVars::with_seed(DedupMode::InsertionOrder, seed);
        let mut nodes = Vec::new();
        for (i, (value, category)) in values.into_iter().enumerate() {
            let id = vars.find_or_create_var(value, category);
            let mut node = SimplifiedNode::new(i.to_string(), "n", "RECTANGLE");
            match category {
                VarCategory::Fill => node.fills = Some(id),
                VarCategory::Stroke => node.strokes = Some(id),
                VarCategory::Effect => node.effects = Some(id),
                VarCategory::Layout => node.layout = Some(id),
                VarCategory::Style => node.text_style = Some(id),
            }
            nodes.push(node);
        }
        let original = nodes.clone();

        let compressed = compress(nodes, vars);
        let mut nodes = compressed.nodes;
        for node in &nodes {
            for reference in node.var_refs() {
                prop_assert!(compressed.vars.styles.contains_key(reference.as_str()));
            }
        }

        decompress(&mut nodes, &compressed.vars);
        prop_assert_eq!(nodes, original);
    }

    #[test]
    fn test_equal_values_share_an_id(
        values in prop::collection::vec(small_value(), 1..30),
        category in category()
    ) {
        let mut vars = GlobalVars::with_seed(DedupMode::InsertionOrder, 7);
        let ids: Vec<VarId> = values
            .iter()
            .map(|v| vars.find_or_create_var(v.clone(), category))
            .collect();

        let distinct: HashSet<String> = values.iter().map(|v| v.to_string()).collect();
        prop_assert_eq!(vars.len(), distinct.len());
        for (i, a) in values.iter().enumerate() {
            for (j, b) in values.iter().enumerate() {
                prop_assert_eq!(a == b, ids[i] == ids[j]);
            }
        }
    }
}
