//! Per-node extractors
//!
//! Each extractor reads one raw node and fills its own fields of the
//! simplified node. Style-like values are interned through the request's
//! [`ExtractContext`] so nodes only carry variable ids.

pub mod component;
pub mod effects;
pub mod geometry;
pub mod layout;
pub mod paint;
pub mod text;
pub mod visuals;

use serde::Serialize;

use crate::types::{RawNode, SimplifiedNode, StyleCatalog, VarId};
use crate::vars::{GlobalVars, VarCategory};

pub use component::{ComponentExtractor, NamedStyleExtractor};
pub use effects::EffectsExtractor;
pub use geometry::GeometryExtractor;
pub use layout::LayoutExtractor;
pub use text::TextExtractor;
pub use visuals::{FillsExtractor, StrokesExtractor};

/// Error raised by an extractor on a malformed raw node
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed `{field}`: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("solid paint is missing its color")]
    MissingColor,

    #[error("failed to encode {category} value: {source}")]
    Encode {
        category: VarCategory,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-request state shared by every extractor call
pub struct ExtractContext<'a> {
    pub vars: &'a mut GlobalVars,
    /// Named styles from the response being simplified
    pub styles: &'a StyleCatalog,
}

impl ExtractContext<'_> {
    pub fn intern<T: Serialize>(&mut self, value: &T, category: VarCategory) -> Result<VarId, ExtractError> {
        self.vars
            .intern(value, category)
            .map_err(|source| ExtractError::Encode { category, source })
    }
}

/// Derives one category of output from a raw node
pub trait Extractor: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        node: &RawNode,
        parent: Option<&RawNode>,
        ctx: &mut ExtractContext<'_>,
        out: &mut SimplifiedNode,
    ) -> Result<(), ExtractError>;
}

/// Read a typed property, mapping decode failures to [`ExtractError::Malformed`]
pub(crate) fn read_prop<T: serde::de::DeserializeOwned>(
    node: &RawNode,
    field: &'static str,
) -> Result<Option<T>, ExtractError> {
    node.read(field)
        .map_err(|source| ExtractError::Malformed { field, source })
}

/// The full extractor set, in the order variables are issued
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(GeometryExtractor),
        Box::new(ComponentExtractor),
        Box::new(TextExtractor),
        Box::new(NamedStyleExtractor),
        Box::new(FillsExtractor),
        Box::new(StrokesExtractor),
        Box::new(EffectsExtractor),
        Box::new(LayoutExtractor),
    ]
}
