//! Hierarchy flattening
//!
//! Replaces nested `children` arrays with a flat pre-order node list and a
//! hierarchy string that records the nesting by id only:
//!
//! ```text
//! node := id | id "(" node ("," node)* ")"
//! ```
//!
//! Multiple roots are joined with commas at the top level.

use serde::{Deserialize, Serialize};

use crate::types::{FlatNode, SimplifiedNode};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("unexpected `{found}` at position {position}")]
    Unexpected { found: char, position: usize },

    #[error("empty node id at position {0}")]
    EmptyId(usize),

    #[error("unbalanced parentheses at end of hierarchy")]
    Unbalanced,

    #[error("hierarchy names {ids} nodes but {nodes} were given")]
    CountMismatch { ids: usize, nodes: usize },

    #[error("hierarchy expects node {expected} but found {found}")]
    OrderMismatch { expected: String, found: String },
}

/// Flat form of a simplified tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatTree {
    pub hierarchy: String,
    pub nodes: Vec<FlatNode>,
}

/// Flatten a forest in pre-order
pub fn flatten(roots: Vec<SimplifiedNode>) -> FlatTree {
    let mut hierarchy = String::new();
    let mut nodes = Vec::new();
    for (i, root) in roots.into_iter().enumerate() {
        if i > 0 {
            hierarchy.push(',');
        }
        visit(root, &mut hierarchy, &mut nodes);
    }
    FlatTree { hierarchy, nodes }
}

fn visit(mut node: SimplifiedNode, hierarchy: &mut String, nodes: &mut Vec<FlatNode>) {
    let children = std::mem::take(&mut node.children);
    hierarchy.push_str(&node.id);
    nodes.push(node);

    if children.is_empty() {
        return;
    }
    hierarchy.push('(');
    for (i, child) in children.into_iter().enumerate() {
        if i > 0 {
            hierarchy.push(',');
        }
        visit(child, hierarchy, nodes);
    }
    hierarchy.push(')');
}

/// Nesting recovered from a hierarchy string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub id: String,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// Ids of a parsed forest in pre-order
pub fn preorder_ids(roots: &[HierarchyNode]) -> Vec<&str> {
    let mut out = Vec::new();
    for root in roots {
        root.collect_ids(&mut out);
    }
    out
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn id(&mut self) -> Result<String, HierarchyError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '(' | ')' | ',') {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(HierarchyError::EmptyId(start));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn node(&mut self) -> Result<HierarchyNode, HierarchyError> {
        let id = self.id()?;
        let mut children = Vec::new();
        if self.peek() == Some('(') {
            self.pos += 1;
            loop {
                children.push(self.node()?);
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(found) => {
                        return Err(HierarchyError::Unexpected {
                            found,
                            position: self.pos,
                        })
                    }
                    None => return Err(HierarchyError::Unbalanced),
                }
            }
        }
        Ok(HierarchyNode { id, children })
    }

    fn forest(&mut self) -> Result<Vec<HierarchyNode>, HierarchyError> {
        let mut roots = Vec::new();
        if self.input.is_empty() {
            return Ok(roots);
        }
        loop {
            roots.push(self.node()?);
            match self.peek() {
                Some(',') => self.pos += 1,
                None => return Ok(roots),
                Some(found) => {
                    return Err(HierarchyError::Unexpected {
                        found,
                        position: self.pos,
                    })
                }
            }
        }
    }
}

/// Parse a hierarchy string into its forest
pub fn parse_hierarchy(input: &str) -> Result<Vec<HierarchyNode>, HierarchyError> {
    Parser { input, pos: 0 }.forest()
}

impl FlatTree {
    /// Rebuild the nested tree from the flat list and the hierarchy string
    pub fn rebuild(self) -> Result<Vec<SimplifiedNode>, HierarchyError> {
        let shape = parse_hierarchy(&self.hierarchy)?;
        let ids = preorder_ids(&shape);
        if ids.len() != self.nodes.len() {
            return Err(HierarchyError::CountMismatch {
                ids: ids.len(),
                nodes: self.nodes.len(),
            });
        }
        if let Some((expected, node)) = ids.iter().zip(&self.nodes).find(|(id, n)| **id != n.id) {
            return Err(HierarchyError::OrderMismatch {
                expected: expected.to_string(),
                found: node.id.clone(),
            });
        }

        let mut nodes = self.nodes.into_iter();
        Ok(shape.iter().filter_map(|s| attach(s, &mut nodes)).collect())
    }
}

fn attach(shape: &HierarchyNode, nodes: &mut impl Iterator<Item = FlatNode>) -> Option<SimplifiedNode> {
    let mut node = nodes.next()?;
    node.children = shape
        .children
        .iter()
        .filter_map(|child| attach(child, nodes))
        .collect();
    Some(node)
}
