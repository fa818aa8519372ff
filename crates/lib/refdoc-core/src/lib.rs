//! Core engine for refdoc.
//!
//! This crate builds the in-memory symbol index from reflection dumps,
//! resolves queries against it, renders documentation documents, and runs
//! the interactive selection flow through a pluggable chat transport.

pub mod control;
pub mod corpus;
pub mod index;
pub mod parsers;
pub mod render;
pub mod resolve;
pub mod services;
pub mod session;
pub mod transport;
