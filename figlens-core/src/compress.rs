//! Variable ID compression
//!
//! Renames long-form variable ids (`fill_PNVRKQ`) to short ones (`f1`) and
//! rewrites every reference in the tree. Each category gets the shortest
//! prefix of its name not already bound to another category, and its own
//! counter starting at 1:
//!
//! ```text
//! style_WMXDFX  -> s1
//! stroke_Q2P9LA -> st1
//! fill_123ABC   -> f1
//! fill_456DEF   -> f2
//! ```
//!
//! Ids are numbered in the order the variable table issued them. The
//! compressor consumes the table, so it runs once per request. Ids that do
//! not look like `<letters>_<alnum>` are kept as they are.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use crate::types::{SimplifiedNode, VarId};
use crate::vars::GlobalVars;

static LONG_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)_[A-Za-z0-9]+$").expect("long id pattern is valid")
});

/// The compressed variable table and the mappings used to build it
#[derive(Debug, Clone, Default)]
pub struct CompressedVars {
    /// Short id -> value, in issue order
    pub styles: Map<String, Value>,
    pub long_to_short: HashMap<VarId, VarId>,
    /// Short prefix -> original category name
    pub prefix_map: BTreeMap<String, String>,
    short_to_long: HashMap<VarId, VarId>,
}

impl CompressedVars {
    pub fn short_id(&self, long: &VarId) -> Option<&VarId> {
        self.long_to_short.get(long)
    }

    /// Reverse lookup, for decompressing a tree
    pub fn long_id(&self, short: &VarId) -> Option<&VarId> {
        self.short_to_long.get(short)
    }
}

/// Output of [`compress`]
#[derive(Debug, Clone)]
pub struct Compressed {
    pub nodes: Vec<SimplifiedNode>,
    pub vars: CompressedVars,
}

/// Allocates short prefixes and per-prefix counters
#[derive(Debug, Default)]
struct PrefixAllocator {
    /// Short prefix -> original
    bound: BTreeMap<String, String>,
    /// Original -> short prefix
    by_original: HashMap<String, String>,
    counters: HashMap<String, usize>,
    /// Ids kept verbatim; generated ids skip over them
    reserved: HashSet<VarId>,
}

impl PrefixAllocator {
    fn prefix_for(&mut self, original: &str) -> String {
        if let Some(short) = self.by_original.get(original) {
            return short.clone();
        }

        let short = (1..=original.len())
            .map(|len| &original[..len])
            .find(|candidate| match self.bound.get(*candidate) {
                None => true,
                Some(owner) => owner == original,
            })
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_fallback", original));

        tracing::debug!("Bound short prefix {} to {}", short, original);
        self.bound.insert(short.clone(), original.to_string());
        self.by_original.insert(original.to_string(), short.clone());
        short
    }

    fn next_id(&mut self, original: &str) -> VarId {
        let prefix = self.prefix_for(original);
        let counter = self.counters.entry(prefix.clone()).or_insert(0);
        loop {
            *counter += 1;
            let id = VarId::new(format!("{}{}", prefix, counter));
            if !self.reserved.contains(&id) {
                return id;
            }
        }
    }
}

/// Compress the variable table and rewrite the tree's references
pub fn compress(mut nodes: Vec<SimplifiedNode>, vars: GlobalVars) -> Compressed {
    let entries = vars.into_entries();
    let mut allocator = PrefixAllocator {
        reserved: entries
            .iter()
            .filter(|(long, _)| !LONG_ID.is_match(long.as_str()))
            .map(|(long, _)| long.clone())
            .collect(),
        ..Default::default()
    };
    let mut out = CompressedVars::default();

    for (long, value) in entries {
        let short = match LONG_ID.captures(long.as_str()) {
            Some(caps) => allocator.next_id(&caps[1].to_lowercase()),
            None => long.clone(),
        };
        out.styles.insert(short.as_str().to_string(), value);
        out.short_to_long.insert(short.clone(), long.clone());
        out.long_to_short.insert(long, short);
    }
    out.prefix_map = allocator.bound;

    for node in &mut nodes {
        rewrite(node, &out.long_to_short);
    }

    Compressed { nodes, vars: out }
}

fn rewrite(node: &mut SimplifiedNode, long_to_short: &HashMap<VarId, VarId>) {
    for slot in node.var_refs_mut() {
        if let Some(short) = slot.as_ref().and_then(|long| long_to_short.get(long)) {
            *slot = Some(short.clone());
        }
    }
    for child in &mut node.children {
        rewrite(child, long_to_short);
    }
}

/// Replace short ids with their long forms again
pub fn decompress(nodes: &mut [SimplifiedNode], vars: &CompressedVars) {
    for node in nodes {
        for slot in node.var_refs_mut() {
            if let Some(long) = slot.as_ref().and_then(|short| vars.long_id(short)) {
                *slot = Some(long.clone());
            }
        }
        decompress(&mut node.children, vars);
    }
}
