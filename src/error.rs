//! Engine error types.

use thiserror::Error;

/// Errors surfaced at the engine boundary.
///
/// Only input-driven failures live here. Malformed kernels and internal
/// dimension mismatches are bugs and panic instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A buffer was requested with a zero width or height.
    #[error("image dimensions must be non-zero (got {width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Raw pixel data does not match `width * height * 4`.
    #[error("pixel data for {width}x{height} needs {expected} bytes, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Worker count outside the supported range.
    #[error("worker count must be between 1 and {max} (got {requested})")]
    WorkerCount { requested: usize, max: usize },

    /// Unknown transform name.
    #[error("unknown transform '{0}'")]
    UnknownTransform(String),

    /// Output format name or file extension the codec glue cannot write.
    #[error("unsupported output format '{0}' (expected png, jpeg or bmp)")]
    UnsupportedFormat(String),

    /// The rayon pool for a transform call could not be started.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Decode/encode failure in the codec glue.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
