//! # ms-pipeline
//!
//! The split-by-size workflow and the retention sweep that reclaims its
//! output.
//!
//! - [`Ingestor`] persists an upload, probes it, plans a segment duration,
//!   segments it and maps the results to public URLs.
//! - [`RetentionSweeper`] deletes storage entries older than the retention
//!   window.

pub mod ingest;
pub mod locator;
pub mod retention;
pub mod upload;

pub use ingest::Ingestor;
pub use locator::LocatorTemplate;
pub use retention::RetentionSweeper;
pub use upload::{file_stream, persist_stream, BodyError};
