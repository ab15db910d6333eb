//! Diff processing and parsing utilities.
//!
//! This module handles segmenting raw git diff output into per-file
//! blocks and classifying each block into a structured record.

pub mod parser;

pub use parser::{classify, parse, segment, DiffOperation, DiffRecord, ParseError};
