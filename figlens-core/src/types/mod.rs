//! Core types for figlens

pub mod component;
pub mod raw;
pub mod simplified;

pub use component::*;
pub use raw::*;
pub use simplified::*;
