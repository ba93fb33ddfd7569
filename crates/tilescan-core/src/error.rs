//! Error types for pipeline construction and resource loading.
//!
//! Runtime geometry problems (malformed boxes, out-of-bounds corners,
//! singular transforms) are recovered locally with placeholder crops and
//! never surface here. This enum covers the failures that must reach the
//! caller before any frame is processed.

use std::path::PathBuf;

/// Errors surfaced by [`crate::TileReader::new`] and resource loaders.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame buffer did not match its declared dimensions.
    #[error("invalid frame buffer: {0}")]
    InvalidFrame(String),

    /// A template gallery image exists but could not be read or decoded.
    #[error("failed to load template gallery image {path}: {source}")]
    Gallery {
        /// Path of the offending gallery entry.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },

    /// A classifier artifact exists but could not be loaded. This is fatal
    /// at construction: silently falling back would mask a configuration
    /// defect.
    #[error("failed to load classifier model {path}: {reason}")]
    Model {
        /// Path of the model artifact.
        path: PathBuf,
        /// Underlying load error.
        reason: String,
    },
}
