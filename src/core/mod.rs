// Public modules
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod naming;
pub mod progress;
pub mod properties;
pub mod refactor;
pub mod scanner;
pub mod source;
pub mod transaction;
pub mod walk;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
