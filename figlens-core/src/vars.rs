//! Global variable store
//!
//! Deduplicates style-like values (text styles, fill lists, strokes, effects,
//! layouts) produced while walking a tree. Each distinct value is stored once
//! under a long-form id `<category>_<nonce>`; nodes hold the id.
//!
//! Two values are "the same" when their serialized JSON is identical. With
//! [`DedupMode::InsertionOrder`] object keys are compared in the order they
//! were written, so `{a, b}` and `{b, a}` get separate ids.
//! [`DedupMode::Canonical`] sorts keys first and merges them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::types::VarId;

const NONCE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NONCE_LEN: usize = 6;

/// Semantic kind of a stored value; its name is the id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarCategory {
    Style,
    Fill,
    Stroke,
    Effect,
    Layout,
}

impl VarCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Fill => "fill",
            Self::Stroke => "stroke",
            Self::Effect => "effect",
            Self::Layout => "layout",
        }
    }
}

impl std::fmt::Display for VarCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How stored values are compared for deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupMode {
    /// Keys compared in insertion order
    #[default]
    InsertionOrder,
    /// Keys sorted recursively before comparing
    Canonical,
}

/// Position in the store returned by [`GlobalVars::mark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarMark(usize);

#[derive(Debug, Clone)]
struct Entry {
    id: VarId,
    value: Value,
    key: String,
}

/// Per-request table of deduplicated values
#[derive(Debug, Clone)]
pub struct GlobalVars {
    entries: Vec<Entry>,
    /// Dedup key -> position in `entries`
    by_key: HashMap<String, usize>,
    issued: HashSet<VarId>,
    mode: DedupMode,
    rng: StdRng,
}

impl Default for GlobalVars {
    fn default() -> Self {
        Self::new(DedupMode::default())
    }
}

impl GlobalVars {
    pub fn new(mode: DedupMode) -> Self {
        Self::with_rng(mode, StdRng::from_entropy())
    }

    /// A store whose nonce stream is reproducible
    pub fn with_seed(mode: DedupMode, seed: u64) -> Self {
        Self::with_rng(mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mode: DedupMode, rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            issued: HashSet::new(),
            mode,
            rng,
        }
    }

    /// Build a store from already-issued ids, e.g. a long-form table read back from disk.
    ///
    /// Entries keep the given order. Later duplicates of an id are ignored.
    pub fn from_entries(mode: DedupMode, entries: impl IntoIterator<Item = (VarId, Value)>) -> Self {
        let mut vars = Self::new(mode);
        for (id, value) in entries {
            if vars.issued.contains(&id) {
                continue;
            }
            let category = id.as_str().split('_').next().unwrap_or_default().to_string();
            let key = vars.dedup_key(&category, &value);
            vars.by_key.entry(key.clone()).or_insert(vars.entries.len());
            vars.issued.insert(id.clone());
            vars.entries.push(Entry { id, value, key });
        }
        vars
    }

    pub fn mode(&self) -> DedupMode {
        self.mode
    }

    /// Return the id of an equal stored value, or store `value` under a fresh id
    pub fn find_or_create_var(&mut self, value: Value, category: VarCategory) -> VarId {
        let key = self.dedup_key(category.prefix(), &value);
        if let Some(&index) = self.by_key.get(&key) {
            return self.entries[index].id.clone();
        }

        let id = self.fresh_id(category);
        self.by_key.insert(key.clone(), self.entries.len());
        self.issued.insert(id.clone());
        self.entries.push(Entry {
            id: id.clone(),
            value,
            key,
        });
        id
    }

    /// Serialize `value` and intern it
    pub fn intern<T: Serialize>(
        &mut self,
        value: &T,
        category: VarCategory,
    ) -> Result<VarId, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.find_or_create_var(value, category))
    }

    pub fn get(&self, id: &VarId) -> Option<&Value> {
        self.entries.iter().find(|e| &e.id == id).map(|e| &e.value)
    }

    pub fn contains(&self, id: &VarId) -> bool {
        self.issued.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in issue order
    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Value)> {
        self.entries.iter().map(|e| (&e.id, &e.value))
    }

    pub fn into_entries(self) -> Vec<(VarId, Value)> {
        self.entries.into_iter().map(|e| (e.id, e.value)).collect()
    }

    pub fn mark(&self) -> VarMark {
        VarMark(self.entries.len())
    }

    /// Drop every entry issued after `mark`
    pub fn rollback(&mut self, mark: VarMark) {
        if mark.0 >= self.entries.len() {
            return;
        }
        for entry in self.entries.drain(mark.0..) {
            self.issued.remove(&entry.id);
            if self.by_key.get(&entry.key).is_some_and(|&i| i >= mark.0) {
                self.by_key.remove(&entry.key);
            }
        }
    }

    fn fresh_id(&mut self, category: VarCategory) -> VarId {
        loop {
            let nonce: String = (0..NONCE_LEN)
                .map(|_| NONCE_CHARS[self.rng.gen_range(0..NONCE_CHARS.len())] as char)
                .collect();
            let id = VarId::new(format!("{}_{}", category.prefix(), nonce));
            if !self.issued.contains(&id) {
                return id;
            }
        }
    }

    fn dedup_key(&self, category: &str, value: &Value) -> String {
        let body = match self.mode {
            DedupMode::InsertionOrder => value.to_string(),
            DedupMode::Canonical => canonicalize(value).to_string(),
        };
        format!("{}\u{0}{}", category, body)
    }
}

/// Recursively sort object keys
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|k| (k.clone(), canonicalize(&map[k])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
