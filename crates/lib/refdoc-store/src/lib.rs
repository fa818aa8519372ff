//! Symbol models and schema constants for refdoc.
//!
//! This crate defines the canonical data model shared by the reflection
//! readers, the symbol index, and the render engine.

pub mod models;
pub mod schema;

pub use models::*;
