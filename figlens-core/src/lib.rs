//! Figlens Core Library
//!
//! Turns raw design-API responses into a compact form for language-model
//! clients: per-node extraction, deduplicated style variables, short
//! variable ids and a flat node list with a hierarchy string.

pub mod compress;
pub mod config;
pub mod extract;
pub mod flatten;
pub mod icons;
pub mod pipeline;
pub mod types;
pub mod vars;
pub mod walker;

pub use compress::{compress, decompress, Compressed, CompressedVars};
pub use config::{
    mask_secret, AppConfig, ConfigError, ConfigSource, Credential, OutputFormat, Resolved,
    ResolvedAuth, SimplifyOptions,
};
pub use extract::{ExtractContext, ExtractError, Extractor};
pub use flatten::{
    flatten, parse_hierarchy, preorder_ids, FlatTree, HierarchyError, HierarchyNode,
};
pub use icons::{
    classify, Classification, CollapseReason, IconAsset, IconDescriptor, IconError, IconMode,
    IconSource, IconTable, SubtreeDigest,
};
pub use pipeline::{parse_response, simplify, SimplifiedDesign, SimplifyError, WireDesign, WireVars};
pub use types::*;
pub use vars::{DedupMode, GlobalVars, VarCategory};
pub use walker::{NodeWalker, WalkState};
