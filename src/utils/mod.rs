//! Helpers shared by the ingestor, the merge engine and the generator
//!
//! - `datetime` for XMLTV timestamp parsing and canonicalisation
//! - `xmltv_parser` for reading XMLTV documents
//! - `jitter` for fetch retries

pub mod datetime;
pub mod jitter;
pub mod xmltv_parser;

pub use datetime::XmltvTimestamp;
pub use xmltv_parser::parse_xmltv_document;
