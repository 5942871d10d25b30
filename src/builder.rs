//! Fluent interface for constructing [`Progress`] instances.
//!
//! [`Progress::new`] covers the common case of default layout on stdout. The
//! [`ProgressBuilder`] is for everything else:
//!
//! * **Layout:** column widths, glyphs, ellipsis and refresh interval, either field by
//!   field or as a whole [`Param`].
//! * **Output:** any `Write + Send` sink instead of stdout, e.g. stderr or an in-memory
//!   buffer for tests.
//! * **Cursor control:** a custom strategy for moving back over the previous frame.
//!
//! The layout is validated once in [`build`](ProgressBuilder::build); a `Progress` that
//! exists always has a drawable layout.

use std::{
    io::{self, Write},
    time::Duration,
};

use compact_str::CompactString;

use crate::{
    error::ProgressError,
    param::{ExtendedPlacement, Param},
    progress::{CursorUp, Progress, ansi_cursor_up},
};

/// A builder for [`Progress`] instances with custom layout, output or cursor control.
pub struct ProgressBuilder {
    param: Param,
    out: Option<Box<dyn Write + Send>>,
    cursor_up: Option<CursorUp>,
}

impl Default for ProgressBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBuilder {
    /// Starts from the default [`Param`], stdout and ANSI cursor movement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            param: Param::default(),
            out: None,
            cursor_up: None,
        }
    }

    /// Replaces all layout parameters at once.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.param = param;
        self
    }

    /// Sets the redraw interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.param.interval = interval;
        self
    }

    /// Sets the number of spaces before each key.
    #[must_use]
    pub const fn pre_pad(mut self, width: usize) -> Self {
        self.param.pre_pad = width;
        self
    }

    /// Sets the key column width.
    #[must_use]
    pub const fn key_width(mut self, width: usize) -> Self {
        self.param.key_width = width;
        self
    }

    /// Sets the text drawn after the key.
    #[must_use]
    pub fn key_div(mut self, div: impl Into<CompactString>) -> Self {
        self.param.key_div = div.into();
        self
    }

    /// Sets the message column width.
    #[must_use]
    pub const fn message_width(mut self, width: usize) -> Self {
        self.param.message_width = width;
        self
    }

    /// Sets the pre-bar decorator column width.
    #[must_use]
    pub const fn pre_width(mut self, width: usize) -> Self {
        self.param.pre_width = width;
        self
    }

    /// Sets the bar width, brackets included.
    #[must_use]
    pub const fn bar_width(mut self, width: usize) -> Self {
        self.param.bar_width = width;
        self
    }

    /// Sets the post-bar decorator column width.
    #[must_use]
    pub const fn post_width(mut self, width: usize) -> Self {
        self.param.post_width = width;
        self
    }

    /// Sets the bracket glyphs.
    #[must_use]
    pub fn brackets(
        mut self,
        left: impl Into<CompactString>,
        right: impl Into<CompactString>,
    ) -> Self {
        self.param.l_bracket = left.into();
        self.param.r_bracket = right.into();
        self
    }

    /// Sets the filled, empty and cursor glyphs.
    #[must_use]
    pub const fn glyphs(mut self, full: char, empty: char, cursor: char) -> Self {
        self.param.full = full;
        self.param.empty = empty;
        self.param.cursor = cursor;
        self
    }

    /// Sets the text appended to truncated fields.
    #[must_use]
    pub fn ellipsis(mut self, ellipsis: impl Into<CompactString>) -> Self {
        self.param.ellipsis = ellipsis.into();
        self
    }

    /// Sets where extended messages are drawn.
    #[must_use]
    pub const fn extended(mut self, placement: ExtendedPlacement) -> Self {
        self.param.extended = placement;
        self
    }

    /// Draws to `out` instead of stdout.
    #[must_use]
    pub fn output(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Some(Box::new(out));
        self
    }

    /// Replaces the strategy used to move back over the previous frame.
    #[must_use]
    pub fn cursor_up(
        mut self,
        f: impl FnMut(&mut dyn Write, usize) -> io::Result<()> + Send + 'static,
    ) -> Self {
        self.cursor_up = Some(Box::new(f));
        self
    }

    /// Validates the layout and constructs the [`Progress`].
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Layout`] if the layout cannot be drawn.
    pub fn build(self) -> Result<Progress, ProgressError> {
        self.param.validate()?;
        Ok(Progress::from_parts(
            self.param,
            self.out.unwrap_or_else(|| Box::new(io::stdout())),
            self.cursor_up.unwrap_or_else(|| Box::new(ansi_cursor_up)),
        ))
    }
}
