//! Per-segment text styling for rendered bars.
//!
//! A [`StyleTable`] holds one [`Style`] per visual segment of a bar line. Styles are
//! arbitrary `&str -> String` transforms (typically wrapping text in color escapes) and
//! default to the identity transform. Styles are applied *after* a segment has been
//! sized, so they never affect column layout.
//!
//! Tables are cheap to clone (each slot is an [`Arc`]) and every bar owns its own copy,
//! so one bar can be recolored without touching its neighbours.

use std::{borrow::Cow, fmt, sync::Arc};

use crossterm::style::{Color, Stylize};

type Transform = dyn Fn(&str) -> String + Send + Sync;

/// A single text transform. The default leaves text untouched.
#[derive(Clone, Default)]
pub struct Style(Option<Arc<Transform>>);

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "Style(custom)" } else { "Style(identity)" })
    }
}

impl Style {
    /// Wraps an arbitrary transform.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(f)))
    }

    /// The identity transform.
    #[must_use]
    pub const fn plain() -> Self {
        Self(None)
    }

    /// Sets the foreground color.
    #[must_use]
    pub fn fg(color: Color) -> Self {
        Self::new(move |s| s.with(color).to_string())
    }

    /// Returns `true` if this style leaves text untouched.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.0.is_none()
    }

    /// Applies the transform.
    #[must_use]
    pub fn apply<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match &self.0 {
            Some(f) => Cow::Owned(f(s)),
            None => Cow::Borrowed(s),
        }
    }
}

/// Names one styleable segment of a bar line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Slot {
    /// The bar key.
    Key,
    /// The divider after the key.
    KeyDiv,
    /// The message of a running or completed bar.
    Message,
    /// The message of a stopped bar.
    StopMessage,
    /// Output of the pre-bar decorator.
    PreBar,
    /// Left bracket glyph.
    LBracket,
    /// Right bracket glyph.
    RBracket,
    /// Unfilled cells.
    Empty,
    /// Filled cells.
    Full,
    /// The cursor cell between filled and empty.
    Cursor,
    /// Output of the post-bar decorator.
    PostBar,
}

impl Slot {
    /// Every slot, in on-screen order.
    pub const ALL: [Self; 11] = [
        Self::Key,
        Self::KeyDiv,
        Self::Message,
        Self::StopMessage,
        Self::PreBar,
        Self::LBracket,
        Self::RBracket,
        Self::Empty,
        Self::Full,
        Self::Cursor,
        Self::PostBar,
    ];
}

/// One [`Style`] per segment of a rendered bar.
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct StyleTable {
    pub key: Style,
    pub key_div: Style,
    pub message: Style,
    pub stop_message: Style,
    pub pre_bar: Style,
    pub l_bracket: Style,
    pub r_bracket: Style,
    pub empty: Style,
    pub full: Style,
    pub cursor: Style,
    pub post_bar: Style,
}

impl StyleTable {
    /// A table where every slot is the identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table where every slot uses `style`.
    #[must_use]
    pub fn uniform(style: &Style) -> Self {
        let mut table = Self::new();
        table.set_all(style);
        table
    }

    /// Sets every slot to `style`.
    pub fn set_all(&mut self, style: &Style) {
        for slot in Slot::ALL {
            self.set(slot, style.clone());
        }
    }

    /// Sets a single slot.
    pub fn set(&mut self, slot: Slot, style: Style) {
        *self.slot_mut(slot) = style;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, slot: Slot, style: Style) -> Self {
        self.set(slot, style);
        self
    }

    /// Returns the style for a slot.
    #[must_use]
    pub const fn get(&self, slot: Slot) -> &Style {
        match slot {
            Slot::Key => &self.key,
            Slot::KeyDiv => &self.key_div,
            Slot::Message => &self.message,
            Slot::StopMessage => &self.stop_message,
            Slot::PreBar => &self.pre_bar,
            Slot::LBracket => &self.l_bracket,
            Slot::RBracket => &self.r_bracket,
            Slot::Empty => &self.empty,
            Slot::Full => &self.full,
            Slot::Cursor => &self.cursor,
            Slot::PostBar => &self.post_bar,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Style {
        match slot {
            Slot::Key => &mut self.key,
            Slot::KeyDiv => &mut self.key_div,
            Slot::Message => &mut self.message,
            Slot::StopMessage => &mut self.stop_message,
            Slot::PreBar => &mut self.pre_bar,
            Slot::LBracket => &mut self.l_bracket,
            Slot::RBracket => &mut self.r_bracket,
            Slot::Empty => &mut self.empty,
            Slot::Full => &mut self.full,
            Slot::Cursor => &mut self.cursor,
            Slot::PostBar => &mut self.post_bar,
        }
    }
}
