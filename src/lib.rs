#[macro_export]
macro_rules! profile {
  ($name:expr) => {{
    let _span = tracing::span!(tracing::Level::DEBUG, $name);
    let _enter = _span.enter();
  }};
}

pub mod config;
pub mod diff;
pub mod filter;
pub mod generator;
pub mod git;
pub mod instructions;
pub mod prompt;
pub mod tree;

// Re-exports
pub use diff::{DiffOperation, DiffRecord, ParseError};
pub use generator::PrPromptGenerator;
