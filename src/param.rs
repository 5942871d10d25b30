//! Layout and timing parameters shared by every bar of a [`Progress`](crate::Progress).
//!
//! A rendered line looks like this (default parameters, 72 columns):
//!
//! ```text
//! server1000: downloading...               3s [=========>----------]  50%
//! |--key---|| |-----message------| |--pre----| |-------bar--------| |post|
//! ```
//!
//! Parameters are fixed once the `Progress` is built and are validated eagerly, so
//! rendering itself can never fail on layout grounds.

use std::time::Duration;

use compact_str::CompactString;

use crate::{error::LayoutError, text};

/// Where the multi-line extended message of a bar is drawn.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtendedPlacement {
    /// Directly below the bar it belongs to.
    #[default]
    Inline,
    /// Below all bars, in bar order.
    Batched,
}

/// Layout widths, glyphs and refresh rate.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    /// Time between redraws.
    pub interval: Duration,

    /// Spaces before the key.
    pub pre_pad: usize,
    /// Width of the key column.
    pub key_width: usize,
    /// Text drawn right after the key.
    pub key_div: CompactString,
    /// Width of the message column.
    pub message_width: usize,
    /// Width of the pre-bar decorator column.
    pub pre_width: usize,
    /// Width of the bar including its brackets.
    pub bar_width: usize,
    /// Width of the post-bar decorator column.
    pub post_width: usize,

    /// Left bracket of the bar body.
    pub l_bracket: CompactString,
    /// Right bracket of the bar body.
    pub r_bracket: CompactString,
    /// Glyph for completed cells.
    pub full: char,
    /// Glyph for remaining cells.
    pub empty: char,
    /// Glyph at the leading edge of a partially filled bar.
    pub cursor: char,

    /// Appended to any field that had to be cut short.
    pub ellipsis: CompactString,
    /// Placement of extended messages.
    pub extended: ExtendedPlacement,
}

impl Default for Param {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            pre_pad: 0,
            key_width: 10,
            key_div: CompactString::const_new(":"),
            message_width: 20,
            pre_width: 11,
            bar_width: 22,
            post_width: 4,
            l_bracket: CompactString::const_new("["),
            r_bracket: CompactString::const_new("]"),
            full: '=',
            empty: '-',
            cursor: '>',
            ellipsis: CompactString::const_new("..."),
            extended: ExtendedPlacement::Inline,
        }
    }
}

impl Param {
    /// Checks that every field can hold the ellipsis and the bar has room for its body.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`] found.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for width in [
            self.key_width,
            self.message_width,
            self.pre_width,
            self.post_width,
        ] {
            text::check_ellipsis(&self.ellipsis, width)?;
        }

        if self.body_width() == 0 {
            return Err(LayoutError::BarTooNarrow {
                width: self.bar_width,
                left: self.l_bracket.clone(),
                right: self.r_bracket.clone(),
            });
        }
        Ok(())
    }

    /// Number of glyph cells between the brackets.
    #[must_use]
    pub fn body_width(&self) -> usize {
        self.bar_width
            .saturating_sub(text::visible_len(&self.l_bracket))
            .saturating_sub(text::visible_len(&self.r_bracket))
    }

    /// Column at which the message starts; extended messages are indented to it.
    #[must_use]
    pub fn message_column(&self) -> usize {
        self.pre_pad + self.key_width + text::visible_len(&self.key_div) + 1
    }

    /// Visible width of a fully rendered bar line.
    #[must_use]
    pub fn line_width(&self) -> usize {
        self.message_column()
            + self.message_width
            + 1
            + self.pre_width
            + 1
            + self.bar_width
            + 1
            + self.post_width
    }
}
