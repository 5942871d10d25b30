//! Pluggable text shown on either side of the bar body.
//!
//! Each bar carries a pre-bar and a post-bar [`Decorator`]. The bar calls it once per
//! render, under its own lock, with a [`Context`] describing the current state. The
//! defaults are [`Elapsed`] before the bar and [`Percent`] after it.
//!
//! Decorators return plain text; color comes from the bar's
//! [`StyleTable`](crate::StyleTable). Any `FnMut(&Context) -> String + Send` closure is
//! a decorator too, which makes one-off formats easy:
//!
//! ```
//! use atomic_multibar::decorate::Context;
//!
//! let remaining = |ctx: &Context| format!("{} left", ctx.total - ctx.current);
//! # let _ = remaining;
//! ```

use std::time::Duration;

use web_time::Instant;

/// State handed to a [`Decorator`] on every render.
#[derive(Clone, Copy, Debug)]
pub struct Context {
    /// Current position.
    pub current: u64,
    /// Target position.
    pub total: u64,
    /// When the bar was created.
    pub start: Instant,
    /// Whether the bar was stopped before completing.
    pub stopped: bool,
}

impl Context {
    /// `true` once the bar can no longer move: completed or stopped.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.stopped || self.current >= self.total
    }
}

/// Produces auxiliary text for one side of a bar.
///
/// Decorators are owned by a single bar and may keep state between renders.
pub trait Decorator: Send {
    /// Renders the text for the given state.
    fn decorate(&mut self, ctx: &Context) -> String;
}

impl<F> Decorator for F
where
    F: FnMut(&Context) -> String + Send,
{
    fn decorate(&mut self, ctx: &Context) -> String {
        self(ctx)
    }
}

/// Time since the bar was created, e.g. `1m 5s`.
///
/// The clock freezes the first time the decorator sees the bar in a terminal state, so a
/// finished bar keeps showing how long it ran.
#[derive(Clone, Debug, Default)]
pub struct Elapsed {
    frozen: Option<Instant>,
}

impl Elapsed {
    /// A running clock.
    #[must_use]
    pub const fn new() -> Self {
        Self { frozen: None }
    }
}

impl Decorator for Elapsed {
    fn decorate(&mut self, ctx: &Context) -> String {
        let now = if ctx.is_terminal() {
            *self.frozen.get_or_insert_with(Instant::now)
        } else {
            Instant::now()
        };
        fmt_duration(now.saturating_duration_since(ctx.start))
    }
}

/// Completion percentage, e.g. `42%`. A zero-length bar is `100%`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Percent;

impl Decorator for Percent {
    fn decorate(&mut self, ctx: &Context) -> String {
        let pct = if ctx.total == 0 {
            100
        } else {
            ctx.current.saturating_mul(100) / ctx.total
        };
        format!("{pct}%")
    }
}

/// Position out of total, e.g. `(10/33)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Steps;

impl Decorator for Steps {
    fn decorate(&mut self, ctx: &Context) -> String {
        format!("({}/{})", ctx.current, ctx.total)
    }
}

/// Several decorators joined by single spaces.
///
/// ```
/// use atomic_multibar::decorate::{Compose, Elapsed, Steps};
///
/// let steps_then_time = Compose::new().with(Steps).with(Elapsed::new());
/// # let _ = steps_then_time;
/// ```
#[derive(Default)]
pub struct Compose {
    parts: Vec<Box<dyn Decorator>>,
}

impl Compose {
    /// An empty composition, rendering as an empty string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decorator.
    #[must_use]
    pub fn with(mut self, part: impl Decorator + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }
}

impl Decorator for Compose {
    fn decorate(&mut self, ctx: &Context) -> String {
        let mut out = String::new();
        for part in &mut self.parts {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&part.decorate(ctx));
        }
        out
    }
}

/// Formats a duration rounded to whole seconds: `0s`, `23s`, `45m 23s`, `67h 45m 23s`.
///
/// Zero-valued units are omitted, except for a zero duration.
#[must_use]
pub fn fmt_duration(d: Duration) -> String {
    let mut secs = d.as_secs() + u64::from(d.subsec_millis() >= 500);
    if secs == 0 {
        return "0s".to_owned();
    }

    let hours = secs / 3600;
    secs %= 3600;
    let mins = secs / 60;
    secs %= 60;

    let mut out = String::new();
    for (value, unit) in [(hours, 'h'), (mins, 'm'), (secs, 's')] {
        if value > 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&value.to_string());
            out.push(unit);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use web_time::Instant;

    use super::{Compose, Context, Decorator, Elapsed, Percent, Steps, fmt_duration};

    fn ctx(current: u64, total: u64) -> Context {
        Context {
            current,
            total,
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Percent Formatting
    /// Integer division, zero-length bars are complete.
    #[test]
    fn test_percent() {
        assert_eq!(Percent.decorate(&ctx(0, 10)), "0%");
        assert_eq!(Percent.decorate(&ctx(33, 99)), "33%");
        assert_eq!(Percent.decorate(&ctx(10, 10)), "100%");
        assert_eq!(Percent.decorate(&ctx(0, 0)), "100%");
    }

    /// Steps Formatting
    #[test]
    fn test_steps() {
        assert_eq!(Steps.decorate(&ctx(10, 33)), "(10/33)");
    }

    /// Duration Formatting
    #[test]
    fn test_fmt_duration() {
        assert_eq!(fmt_duration(Duration::ZERO), "0s");
        assert_eq!(fmt_duration(Duration::from_millis(499)), "0s");
        assert_eq!(fmt_duration(Duration::from_millis(1500)), "2s");
        assert_eq!(fmt_duration(Duration::from_secs(45 * 60 + 23)), "45m 23s");
        assert_eq!(
            fmt_duration(Duration::from_secs(67 * 3600 + 45 * 60 + 23)),
            "67h 45m 23s"
        );
        assert_eq!(fmt_duration(Duration::from_secs(3600 + 5)), "1h 5s");
    }

    /// Elapsed Freezing
    /// Once terminal, the clock no longer advances.
    #[test]
    fn test_elapsed_freezes() {
        let start = Instant::now().checked_sub(Duration::from_secs(5)).unwrap();
        let mut elapsed = Elapsed::new();

        let running = Context {
            current: 1,
            total: 2,
            start,
            stopped: false,
        };
        assert_eq!(elapsed.decorate(&running), "5s");
        assert!(elapsed.frozen.is_none());

        let done = Context { current: 2, ..running };
        assert_eq!(elapsed.decorate(&done), "5s");
        let frozen = elapsed.frozen;
        assert!(frozen.is_some());

        elapsed.decorate(&done);
        assert_eq!(elapsed.frozen, frozen, "freeze point is recorded once");
    }

    /// Composition
    /// Parts are joined with single spaces; closures participate too.
    #[test]
    fn test_compose() {
        let mut composed = Compose::new()
            .with(Steps)
            .with(Percent)
            .with(|c: &Context| format!("<{}>", c.total - c.current));
        assert_eq!(composed.decorate(&ctx(5, 10)), "(5/10) 50% <5>");
        assert_eq!(Compose::new().decorate(&ctx(5, 10)), "");
    }
}
