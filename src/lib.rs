//! EPG merger library
//!
//! Combines several electronic programme guide feeds into one XMLTV document:
//! channels are merged first-writer-wins, programmes are deduplicated per
//! channel and start time, per-source allow-lists restrict what each feed
//! may contribute, and a name override table renames channels on output.
//!
//! The merge engine lives in [`merge`]; [`ingestor`] and [`generator`] are
//! the collaborators that fetch and write the feeds.

pub mod config;
pub mod errors;
pub mod generator;
pub mod ingestor;
pub mod merge;
pub mod models;
pub mod utils;

pub use merge::{EpgMerger, MergeConfig, MergeOutput, MergeReport};
