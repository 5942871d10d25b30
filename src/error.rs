//! Error types for the registry lifecycle and layout configuration.

use std::io;

use compact_str::CompactString;
use thiserror::Error;

/// Errors returned by [`Progress`](crate::Progress) operations.
#[derive(Error, Debug)]
pub enum ProgressError {
    /// The registry was stopped; bars can no longer be created and rendering cannot start.
    #[error("progress has been stopped")]
    Stopped,

    /// [`Progress::start`](crate::Progress::start) was called more than once.
    #[error("progress rendering already started")]
    AlreadyStarted,

    /// [`Progress::wait`](crate::Progress::wait) was called before rendering started.
    #[error("progress rendering was never started")]
    NotStarted,

    /// The render thread panicked.
    #[error("render thread panicked")]
    RenderPanicked,

    /// The layout parameters are invalid.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    /// Writing to the output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Static layout configuration errors, detected before anything is drawn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The truncation ellipsis does not fit into a field.
    #[error("ellipsis {ellipsis:?} is wider than the {width}-column field")]
    EllipsisTooWide {
        /// The offending ellipsis text.
        ellipsis: CompactString,
        /// The target field width.
        width: usize,
    },

    /// The bar brackets leave no room for the bar body.
    #[error("bar width {width} leaves no room inside brackets {left:?} and {right:?}")]
    BarTooNarrow {
        /// The configured total bar width.
        width: usize,
        /// Left bracket glyph.
        left: CompactString,
        /// Right bracket glyph.
        right: CompactString,
    },
}
