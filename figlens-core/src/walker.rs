//! Node walker
//!
//! Depth-first traversal of a raw tree. For every visible node the extractors
//! run once, then the icon classification decides whether the children are
//! expanded or the subtree collapses into one icon reference.
//!
//! Traversal is sequential: icon fetches are awaited one node at a time so
//! variable ids are issued in the same order on every run.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::extract::{default_extractors, ExtractContext, Extractor};
use crate::icons::{classify, Classification, IconError, IconMode, IconSource, IconTable};
use crate::types::{RawNode, SimplifiedNode, StyleCatalog, IMAGE_SVG};
use crate::vars::GlobalVars;

/// Mutable per-request output of a walk
#[derive(Debug, Default)]
pub struct WalkState {
    pub vars: GlobalVars,
    pub icons: IconTable,
}

impl WalkState {
    pub fn new(vars: GlobalVars) -> Self {
        Self {
            vars,
            icons: IconTable::new(),
        }
    }
}

pub struct NodeWalker<'a> {
    extractors: Vec<Box<dyn Extractor>>,
    icon_source: &'a dyn IconSource,
    icon_mode: IconMode,
    styles: &'a StyleCatalog,
}

impl<'a> NodeWalker<'a> {
    pub fn new(icon_source: &'a dyn IconSource, icon_mode: IconMode, styles: &'a StyleCatalog) -> Self {
        Self {
            extractors: default_extractors(),
            icon_source,
            icon_mode,
            styles,
        }
    }

    /// Replace the extractor set
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn Extractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Simplify `node` and its subtree.
    ///
    /// Returns `None` for invisible nodes and for nodes an extractor rejected;
    /// a rejected node leaves nothing behind in the variable table.
    pub fn walk<'b>(
        &'b self,
        node: &'b RawNode,
        parent: Option<&'b RawNode>,
        state: &'b mut WalkState,
    ) -> BoxFuture<'b, Option<SimplifiedNode>> {
        async move {
            if !node.visible {
                tracing::debug!("Skipping invisible node {}", node.id);
                return None;
            }

            let mut out = self.extract(node, parent, state)?;

            if let Classification::Collapse(reason) = classify(node, self.icon_mode) {
                match self.collapse(node, state).await {
                    Ok(reference) => {
                        tracing::debug!("Collapsed {} into {} ({:?})", node.id, reference, reason);
                        out.node_type = IMAGE_SVG.to_string();
                        out.icon = Some(reference);
                        return Some(out);
                    }
                    Err(e) => {
                        tracing::warn!("Icon fetch failed for {}, expanding instead: {}", node.id, e);
                    }
                }
            }

            for child in node.visible_children() {
                if let Some(simplified) = self.walk(child, Some(node), state).await {
                    out.children.push(simplified);
                }
            }
            Some(out)
        }
        .boxed()
    }

    /// Run every extractor; on the first failure roll back this node's variables
    fn extract(
        &self,
        node: &RawNode,
        parent: Option<&RawNode>,
        state: &mut WalkState,
    ) -> Option<SimplifiedNode> {
        let mark = state.vars.mark();
        let mut out = SimplifiedNode::for_kind(&node.id, &node.name, &node.kind);
        let mut ctx = ExtractContext {
            vars: &mut state.vars,
            styles: self.styles,
        };

        for extractor in &self.extractors {
            if let Err(e) = extractor.extract(node, parent, &mut ctx, &mut out) {
                tracing::warn!(
                    "Skipping node {} ({}): {} extractor failed: {}",
                    node.id,
                    node.name,
                    extractor.name(),
                    e
                );
                state.vars.rollback(mark);
                return None;
            }
        }
        Some(out)
    }

    async fn collapse(&self, node: &RawNode, state: &mut WalkState) -> Result<String, IconError> {
        let asset = self.icon_source.fetch_icon(node).await?;
        Ok(state.icons.register(&asset, &node.id))
    }
}
