//! Readers for reflected source structures.
//!
//! The reflection dump reader turns an external reflector's per-file output
//! into class descriptors; the doc-block parser handles the raw comments
//! embedded in it.

pub mod docblock;
pub mod reflection_json;

pub use docblock::DocBlockParser;
pub use reflection_json::{ParseError, ReflectionJsonParser};
