//! Centralized error handling for the EPG merger
//!
//! The merge engine itself has no fatal error conditions: defects inside a
//! source document are counted and skipped. The types here describe failures
//! of the collaborators around it (configuration, fetching, parsing, writing).
//!
//! # Usage
//!
//! ```rust
//! use epg_merger::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("no sources configured"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
