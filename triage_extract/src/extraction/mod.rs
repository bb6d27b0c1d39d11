//! Pattern-based extraction of report fields from dictated text.
//!
//! `mappings` holds the token normalization tables, `patterns` the matcher
//! definitions and default table, and `engine` the pass that turns a
//! transcript into field writes.

pub mod engine;
pub mod mappings;
pub mod patterns;
