//! Figlens API client
//!
//! REST access to design files, node subtrees, rendered images and image
//! fills, plus [`RenderedIcons`], the API-backed icon source.

pub mod client;
pub mod icons;
pub mod images;

pub use client::{auth_header, normalize_node_id, ApiError, FigmaClient, DEFAULT_BASE_URL};
pub use icons::RenderedIcons;
pub use images::{ImageFormat, ImageRequest, DEFAULT_SCALE};
