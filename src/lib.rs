//! # `atomic_multibar`
//!
//! Thread-safe rendering of many named progress bars to a text terminal.
//!
//! `atomic_multibar` keeps a registry of bars that producer threads update
//! independently, and a single render thread that redraws all of them in place at a
//! fixed cadence. It is designed to be:
//!
//! * **Concurrent**: Bar handles are cheap to clone ([`Arc`](std::sync::Arc)-based) and
//!   each bar has its own lock, so producers never block one another.
//! * **Stable on screen**: Every field is sized by *visible* length, ignoring ANSI escape
//!   sequences, so colored output lines up exactly like plain output.
//! * **Waitable**: [`Progress::wait`] blocks until every bar has finished and been drawn
//!   in its final state, or until [`Progress::stop`] is called.
//!
//! ```no_run
//! use atomic_multibar::Progress;
//!
//! let progress = Progress::new();
//! for key in ["server1000", "server1001"] {
//!     let bar = progress.new_bar(key, 100)?;
//!     std::thread::spawn(move || {
//!         for _ in 0..100 {
//!             bar.set_message("fetching...");
//!             bar.increment();
//!         }
//!     });
//! }
//!
//! progress.start()?;
//! progress.wait()?;
//! # Ok::<(), atomic_multibar::ProgressError>(())
//! ```
//!
//! ## Modules
//!
//! * [`bar`]: A single bar: counts, messages, lifecycle and line rendering.
//! * [`builder`]: Fluent construction of a [`Progress`] with custom layout or output.
//! * [`decorate`]: Pluggable text around the bar body (elapsed time, percentage, ...).
//! * [`io`]: [`Read`](std::io::Read)/[`Write`](std::io::Write) wrappers that advance a bar.
//! * [`iter`]: Extension traits to advance a bar from an iterator.
//! * [`param`]: Layout widths, glyphs and refresh interval.
//! * [`progress`]: The registry, render thread and completion waiting.
//! * [`style`]: Per-segment styling hooks.
//! * [`text`]: Escape-aware measuring, truncation and padding.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bar;
pub mod builder;
pub mod decorate;
pub mod error;
pub mod io;
pub mod iter;
pub mod param;
pub mod progress;
mod render;
pub mod style;
pub mod text;

pub use bar::{Bar, BarSnapshot, BarStatus};
pub use builder::ProgressBuilder;
pub use decorate::{Decorator, Elapsed, Percent, Steps};
pub use error::{LayoutError, ProgressError};
pub use iter::{BarIter, BarIteratorExt};
pub use param::{ExtendedPlacement, Param};
pub use progress::Progress;
pub use style::{Slot, Style, StyleTable};
