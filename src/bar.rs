//! A single progress bar.
//!
//! A [`Bar`] is a cheap, cloneable handle (an [`Arc`]) to one progress entity. Producers
//! hold a clone and mutate it directly; the owning [`Progress`](crate::Progress) only
//! reads it when drawing. All state lives behind one per-bar [`Mutex`], so producers of
//! different bars never contend with each other.
//!
//! # Lifecycle
//!
//! A bar starts `Running` and ends in exactly one terminal state:
//!
//! * [`BarStatus::Completed`] when the position reaches the total.
//! * [`BarStatus::Stopped`] when [`Bar::stop`] is called first.
//!
//! The terminal transition raises a one-shot completion signal which the render loop
//! consumes exactly once, after the bar has been drawn in its final state.

use std::{sync::Arc, time::Duration};

use compact_str::CompactString;
use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    decorate::{Context, Decorator, Elapsed, Percent},
    param::Param,
    style::StyleTable,
    text::{self, Align},
};

/// Where a bar is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarStatus {
    /// Still accepting updates.
    #[default]
    Running,
    /// Reached its total.
    Completed,
    /// Stopped before reaching its total.
    Stopped,
}

impl BarStatus {
    /// `true` for [`Completed`](Self::Completed) and [`Stopped`](Self::Stopped).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One-shot completion signal handed to the render loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Signal {
    Active,
    Pending,
    Signaled,
}

/// A thread-safe, cloneable handle to one progress bar.
///
/// Bars are created by [`Progress::new_bar`](crate::Progress::new_bar). Cloning is cheap
/// and every clone refers to the same bar.
#[derive(Clone)]
pub struct Bar {
    state: Arc<Mutex<BarState>>,
    param: Arc<Param>,
}

struct BarState {
    key: CompactString,
    message: CompactString,
    extended: CompactString,
    current: u64,
    total: u64,
    start: Instant,
    status: BarStatus,
    signal: Signal,
    pre: Box<dyn Decorator>,
    post: Box<dyn Decorator>,
    style: StyleTable,
}

/// Lines produced by rendering one bar.
pub(crate) struct Frame {
    pub(crate) line: String,
    pub(crate) extended: Vec<String>,
}

impl Bar {
    pub(crate) fn new(key: impl Into<CompactString>, total: u64, param: Arc<Param>) -> Self {
        // A zero-length bar has nothing to wait for.
        let (status, signal) = if total == 0 {
            (BarStatus::Completed, Signal::Pending)
        } else {
            (BarStatus::Running, Signal::Active)
        };

        Self {
            state: Arc::new(Mutex::new(BarState {
                key: key.into(),
                message: CompactString::default(),
                extended: CompactString::default(),
                current: 0,
                total,
                start: Instant::now(),
                status,
                signal,
                pre: Box::new(Elapsed::new()),
                post: Box::new(Percent),
                style: StyleTable::default(),
            })),
            param,
        }
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Moves the bar to `curr`, clamped to the total.
    ///
    /// Ignored once the bar is completed or stopped.
    pub fn update(&self, curr: u64) {
        self.state.lock().update(curr);
    }

    /// Advances the bar by one.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Advances the bar by `n`.
    pub fn add(&self, n: u64) {
        let mut state = self.state.lock();
        let next = state.current.saturating_add(n);
        state.update(next);
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Replaces the single-line message.
    pub fn set_message(&self, message: impl Into<CompactString>) {
        self.state.lock().message = message.into();
    }

    /// Replaces this bar's styling. Other bars are unaffected.
    pub fn set_style(&self, style: StyleTable) {
        self.state.lock().style = style;
    }

    /// Replaces the decorator drawn between the message and the bar body.
    pub fn set_pre_decorator(&self, decorator: impl Decorator + 'static) {
        self.state.lock().pre = Box::new(decorator);
    }

    /// Replaces the decorator drawn after the bar body.
    pub fn set_post_decorator(&self, decorator: impl Decorator + 'static) {
        self.state.lock().post = Box::new(decorator);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stops a running bar, freezing its position.
    ///
    /// A non-empty `message` replaces the message and `extended` replaces the extended
    /// message; an empty `message` leaves both as they were. Stopping an already
    /// completed or stopped bar does nothing, so the first stop message wins.
    pub fn stop(&self, message: &str, extended: &str) {
        self.state.lock().stop(message, extended);
    }

    /// Hands out the completion signal: `true` exactly once after the bar turns
    /// terminal, `false` otherwise.
    pub(crate) fn consume_completion_signal(&self) -> bool {
        let mut state = self.state.lock();
        if state.signal == Signal::Pending {
            state.signal = Signal::Signaled;
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the key this bar was registered under.
    #[must_use]
    pub fn key(&self) -> CompactString {
        self.state.lock().key.clone()
    }

    /// Returns the current position.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.state.lock().current
    }

    /// Returns the total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> BarStatus {
        self.state.lock().status
    }

    /// Returns `true` once the bar is completed or stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Creates a consistent snapshot of the bar.
    #[must_use]
    pub fn snapshot(&self) -> BarSnapshot {
        self.into()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Renders the bar as a single fixed-width line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut state = self.state.lock();
        state.render_line(&self.param)
    }

    /// Renders the line plus the extended message lines under one lock acquisition.
    pub(crate) fn frame(&self) -> Frame {
        let mut state = self.state.lock();
        let line = state.render_line(&self.param);
        let extended = state.render_extended(&self.param);
        Frame { line, extended }
    }
}

impl BarState {
    fn update(&mut self, curr: u64) {
        if self.status != BarStatus::Running {
            return;
        }
        self.current = curr.min(self.total);
        if self.current == self.total {
            self.status = BarStatus::Completed;
            self.signal = Signal::Pending;
        }
    }

    fn stop(&mut self, message: &str, extended: &str) {
        if self.status != BarStatus::Running {
            return;
        }
        self.status = BarStatus::Stopped;
        self.signal = Signal::Pending;
        if !message.is_empty() {
            self.message = message.into();
            self.extended = extended.into();
        }
    }

    fn context(&self) -> Context {
        Context {
            current: self.current,
            total: self.total,
            start: self.start,
            stopped: self.status == BarStatus::Stopped,
        }
    }

    fn render_line(&mut self, param: &Param) -> String {
        let ctx = self.context();
        let pre = self.pre.decorate(&ctx);
        let post = self.post.decorate(&ctx);

        let style = &self.style;
        let message_style = if ctx.stopped {
            &style.stop_message
        } else {
            &style.message
        };
        let ellipsis = param.ellipsis.as_str();

        let mut line = String::with_capacity(param.line_width());
        line.push_str(&" ".repeat(param.pre_pad));
        line.push_str(&style.key.apply(&text::fit(
            &self.key,
            ellipsis,
            param.key_width,
            Align::Left,
        )));
        line.push_str(&style.key_div.apply(&param.key_div));
        line.push(' ');
        line.push_str(&message_style.apply(&text::fit(
            &self.message,
            ellipsis,
            param.message_width,
            Align::Left,
        )));
        line.push(' ');
        line.push_str(&style.pre_bar.apply(&text::fit(
            &pre,
            ellipsis,
            param.pre_width,
            Align::Right,
        )));
        line.push(' ');
        self.push_body(param, &mut line);
        line.push(' ');
        line.push_str(&style.post_bar.apply(&text::fit(
            &post,
            ellipsis,
            param.post_width,
            Align::Right,
        )));
        line
    }

    fn push_body(&self, param: &Param, line: &mut String) {
        let cells = glyph_cells(self.current, self.total, param.body_width());
        let style = &self.style;

        line.push_str(&style.l_bracket.apply(&param.l_bracket));
        if cells.full > 0 {
            line.push_str(&style.full.apply(&repeat(param.full, cells.full)));
        }
        if cells.cursor {
            let mut cursor = [0u8; 4];
            line.push_str(&style.cursor.apply(param.cursor.encode_utf8(&mut cursor)));
        }
        if cells.empty > 0 {
            line.push_str(&style.empty.apply(&repeat(param.empty, cells.empty)));
        }
        line.push_str(&style.r_bracket.apply(&param.r_bracket));
    }

    /// Extended message lines, indented to the message column and wrapped to the
    /// remaining line width so every row drawn is a row counted.
    fn render_extended(&self, param: &Param) -> Vec<String> {
        if self.extended.is_empty() {
            return Vec::new();
        }

        let column = param.message_column();
        let indent = " ".repeat(column);
        let width = param.line_width() - column;
        let style = if self.status == BarStatus::Stopped {
            &self.style.stop_message
        } else {
            &self.style.message
        };

        self.extended
            .lines()
            .flat_map(|l| text::wrap(l, width))
            .map(|piece| {
                let mut out = indent.clone();
                out.push_str(&style.apply(&piece));
                out
            })
            .collect()
    }
}

fn repeat(c: char, n: usize) -> String {
    std::iter::repeat_n(c, n).collect()
}

/// Cell breakdown of a bar body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Cells {
    pub(crate) full: usize,
    pub(crate) cursor: bool,
    pub(crate) empty: usize,
}

/// Splits `width` cells into filled, cursor and empty.
///
/// `floor(current * width / total)` cells are filled; while the bar is partially
/// filled the last of them is drawn as the cursor instead.
pub(crate) fn glyph_cells(current: u64, total: u64, width: usize) -> Cells {
    let filled = if total == 0 {
        width
    } else {
        let scaled = u128::from(current.min(total)) * width as u128 / u128::from(total);
        usize::try_from(scaled).unwrap_or(width)
    };

    let cursor = filled > 0 && filled < width;
    Cells {
        full: filled - usize::from(cursor),
        cursor,
        empty: width - filled,
    }
}

/// A plain-data snapshot of a [`Bar`] at a specific point in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarSnapshot {
    key: CompactString,
    message: CompactString,
    extended: CompactString,
    current: u64,
    total: u64,
    status: BarStatus,
    elapsed: Duration,
}

impl From<&Bar> for BarSnapshot {
    fn from(bar: &Bar) -> Self {
        let state = bar.state.lock();
        Self {
            key: state.key.clone(),
            message: state.message.clone(),
            extended: state.extended.clone(),
            current: state.current,
            total: state.total,
            status: state.status,
            elapsed: state.start.elapsed(),
        }
    }
}

impl BarSnapshot {
    /// Returns the bar key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the single-line message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the extended message.
    #[must_use]
    pub fn extended(&self) -> &str {
        &self.extended
    }

    /// Returns the position.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Returns the total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> BarStatus {
        self.status
    }

    /// Returns the time since the bar was created.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::{Bar, BarStatus, Cells, glyph_cells};
    use crate::{
        decorate::{Compose, Context, Steps},
        param::Param,
        style::{Slot, Style, StyleTable},
        text::visible_len,
    };

    fn bar(total: u64) -> Bar {
        Bar::new("bar", total, Arc::new(Param::default()))
    }

    /// Rendering Lifecycle
    /// Empty, half-way with cursor, and full without cursor.
    #[test]
    fn test_render_lifecycle() {
        let b = bar(10);
        assert_eq!(
            b.render(),
            "bar       :                               0s [--------------------]   0%"
        );

        for _ in 0..5 {
            b.increment();
        }
        assert_eq!(
            b.render(),
            "bar       :                               0s [=========>----------]  50%"
        );

        b.update(10);
        b.set_message("done");
        assert_eq!(
            b.render(),
            "bar       : done                          0s [====================] 100%"
        );
        assert_eq!(b.status(), BarStatus::Completed);
    }

    /// Update Clamping
    /// Overshooting clamps to total; updates after completion are ignored.
    #[test]
    fn test_update_clamps_and_freezes() {
        let b = bar(10);
        b.update(25);
        assert_eq!(b.current(), 10);
        assert!(b.is_finished());

        b.update(3);
        b.increment();
        assert_eq!(b.current(), 10, "completed bars are frozen");
    }

    /// Stop Idempotence
    /// The first stop message wins and the position freezes.
    #[test]
    fn test_stop_idempotent() {
        let b = bar(10);
        b.update(4);
        b.stop("a", "first\nsecond");
        b.stop("b", "");
        b.increment();

        let snap = b.snapshot();
        assert_eq!(snap.message(), "a");
        assert_eq!(snap.extended(), "first\nsecond");
        assert_eq!(snap.current(), 4);
        assert_eq!(snap.status(), BarStatus::Stopped);

        assert!(b.consume_completion_signal());
        assert!(!b.consume_completion_signal());
    }

    /// Silent Stop
    /// An empty stop message keeps the existing message.
    #[test]
    fn test_stop_without_message() {
        let b = bar(10);
        b.set_message("working");
        b.stop("", "ignored");
        assert_eq!(b.snapshot().message(), "working");
        assert_eq!(b.snapshot().extended(), "");
        assert_eq!(b.status(), BarStatus::Stopped);
    }

    /// Stop After Completion
    /// A completed bar stays completed and keeps its message.
    #[test]
    fn test_stop_after_complete_is_noop() {
        let b = bar(1);
        b.set_message("ok");
        b.increment();
        b.stop("cancelled", "");
        assert_eq!(b.status(), BarStatus::Completed);
        assert_eq!(b.snapshot().message(), "ok");
    }

    /// Exactly-Once Completion
    /// Concurrent increments produce a single completion signal.
    #[test]
    fn test_completion_signal_exactly_once() {
        const N: u64 = 64;
        let b = bar(N);

        assert!(!b.consume_completion_signal(), "running bars have no signal");

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let b = b.clone();
                thread::spawn(move || b.increment())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let signals = (0..10).filter(|_| b.consume_completion_signal()).count();
        assert_eq!(signals, 1);
        assert_eq!(b.current(), N);
    }

    /// Zero-Length Bar
    /// Created already complete, drawn fully filled.
    #[test]
    fn test_zero_total() {
        let b = bar(0);
        assert_eq!(b.status(), BarStatus::Completed);
        assert!(b.render().contains("[====================] 100%"));
        assert!(b.consume_completion_signal());
    }

    /// Glyph Cells
    #[test]
    fn test_glyph_cells() {
        let cells = |c, t| glyph_cells(c, t, 20);
        assert_eq!(
            cells(0, 10),
            Cells {
                full: 0,
                cursor: false,
                empty: 20
            }
        );
        assert_eq!(
            cells(1, 100),
            Cells {
                full: 0,
                cursor: false,
                empty: 20
            },
            "less than one cell filled shows no cursor"
        );
        assert_eq!(
            cells(5, 10),
            Cells {
                full: 9,
                cursor: true,
                empty: 10
            }
        );
        assert_eq!(
            cells(10, 10),
            Cells {
                full: 20,
                cursor: false,
                empty: 0
            }
        );
    }

    /// Styling
    /// Styles wrap segments without changing the visible layout.
    #[test]
    fn test_styled_render_keeps_width() {
        let b = bar(10);
        b.update(3);
        let plain = b.render();

        b.set_style(StyleTable::uniform(&Style::new(|s| format!("\x1b[31m{s}\x1b[0m"))));
        let styled = b.render();

        assert_ne!(plain, styled);
        assert_eq!(visible_len(&styled), visible_len(&plain));
        assert_eq!(visible_len(&plain), Param::default().line_width());
    }

    /// Stop Message Styling
    /// Stopped bars draw their message with the stop-message slot.
    #[test]
    fn test_stop_message_style() {
        let b = bar(10);
        b.set_style(StyleTable::new().with(Slot::StopMessage, Style::new(|s| s.to_uppercase())));
        b.stop("error!", "details here");

        let frame = b.frame();
        assert!(frame.line.contains("ERROR!"));
        assert_eq!(frame.extended, vec![format!("{}DETAILS HERE", " ".repeat(12))]);
    }

    /// Extended Wrapping
    /// Long extended lines wrap so no drawn row is wider than the bar line.
    #[test]
    fn test_extended_message_wraps() {
        let b = bar(10);
        b.stop("failed", &format!("{}\nshort", "x".repeat(100)));

        let frame = b.frame();
        let indent = " ".repeat(12);
        assert_eq!(
            frame.extended,
            vec![
                format!("{indent}{}", "x".repeat(60)),
                format!("{indent}{}", "x".repeat(40)),
                format!("{indent}short"),
            ]
        );
        assert!(frame.extended.iter().all(|l| visible_len(l) <= 72));
    }

    /// Custom Decorators
    /// Decorators are replaced per bar and truncated to their column.
    #[test]
    fn test_custom_decorators() {
        let b = bar(33);
        b.update(10);
        b.set_pre_decorator(Compose::new().with(Steps).with(|_: &Context| "x".to_owned()));
        b.set_post_decorator(|_: &Context| "too long".to_owned());

        let line = b.render();
        assert!(line.contains(" (10/33) x ["), "{line}");
        assert!(line.ends_with("] t..."), "{line}");
    }

    /// Long Fields
    /// Keys and messages are cut with the ellipsis.
    #[test]
    fn test_long_fields_truncated() {
        let b = Bar::new("a-very-long-server-name", 10, Arc::new(Param::default()));
        b.set_message("this message does not fit in twenty columns");
        let line = b.render();
        assert!(line.starts_with("a-very-...: this message does... "), "{line}");
        assert_eq!(visible_len(&line), 72);
    }
}
