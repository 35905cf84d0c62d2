//! ParaFX: row-parallel raster transforms with a bounded undo/redo session.
//!
//! ```no_run
//! use parafx::{EditSession, EngineConfig, PixelBuffer, Transform};
//!
//! let mut session = EditSession::new();
//! session.load(PixelBuffer::filled(64, 64, [100, 100, 100, 255])?);
//! session.apply_transform(Transform::Brighten, &EngineConfig::default())?;
//! session.undo();
//! # Ok::<(), parafx::EngineError>(())
//! ```
#![allow(clippy::too_many_arguments)]

pub mod buffer;
pub mod error;
pub mod history;
pub mod io;
pub mod logger;
pub mod ops;

pub use buffer::PixelBuffer;
pub use error::{EngineError, Result};
pub use history::{EditSession, HistoryEntry, MAX_HISTORY, SessionState};
pub use ops::kernel::Kernel;
pub use ops::{EngineConfig, Transform, TransformRun, Workers};
