//! ms-core: shared errors, configuration, and asset naming.
//!
//! This crate is the foundational dependency for the other ms-* crates. It
//! owns the error taxonomy of the segmentation engine, the application
//! configuration, and the storage naming scheme that ties an uploaded input
//! to the segments derived from it.

pub mod asset;
pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use asset::{AssetId, Extension, MediaAsset, SegmentFile};
pub use error::{
    Error, IngestError, PlanError, ProbeError, Result, SegmentError, StorageError,
};
