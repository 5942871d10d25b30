//! The periodic redraw loop.
//!
//! One render thread runs per [`Progress`](crate::Progress). It sleeps for the
//! configured interval (waking early if asked to quit), then draws every bar in place:
//! move the cursor up over the previous frame, write one line per bar plus any
//! extended-message lines, flush, and finally hand out completion signals.
//!
//! Signals are consumed in a separate pass after the frame is written, so a bar is
//! always drawn in its terminal state before it counts as done.
//!
//! Lock order follows the registry: registry lock, then each bar lock in list order,
//! then the loop-state lock.

use std::io::{self, Write as _};

use tracing::{debug, error, trace};
use web_time::Instant;

use crate::{
    error::ProgressError,
    param::ExtendedPlacement,
    progress::{Registry, Shared},
};

/// Body of the render thread.
///
/// Draws one final frame after being told to quit, so stop messages reach the screen.
pub(crate) fn run(shared: &Shared) -> Result<(), ProgressError> {
    loop {
        let quit = shared.sleep();

        let drawn = {
            let mut registry = shared.registry.lock();
            shared.draw(&mut registry)
        };
        if let Err(err) = drawn {
            error!(%err, "progress render failed");
            shared.fail();
            return Err(err.into());
        }

        if quit {
            debug!("progress render loop exiting");
            return Ok(());
        }
    }
}

impl Shared {
    /// Sleeps one interval or until quit is requested. Returns the quit flag.
    fn sleep(&self) -> bool {
        let deadline = Instant::now() + self.param.interval;
        let mut state = self.state.lock();
        while !state.quit {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.wake.wait_for(&mut state, deadline - now);
        }
        state.quit
    }

    /// Marks the loop as failed and releases the waiter.
    fn fail(&self) {
        self.state.lock().failed = true;
        self.done.notify_all();
    }

    /// Draws every bar over the previous frame and consumes completion signals.
    pub(crate) fn draw(&self, registry: &mut Registry) -> io::Result<()> {
        let Registry {
            bars,
            out,
            cursor_up,
            drawn,
            ..
        } = registry;

        if let Some(rows) = drawn.filter(|&rows| rows > 0) {
            cursor_up(&mut **out, rows)?;
        }

        let mut lines = 0;
        let mut deferred = Vec::new();
        for bar in bars.iter() {
            let frame = bar.frame();
            writeln!(out, "{}", frame.line)?;
            lines += 1;

            match self.param.extended {
                ExtendedPlacement::Inline => {
                    for line in &frame.extended {
                        writeln!(out, "{line}")?;
                        lines += 1;
                    }
                }
                ExtendedPlacement::Batched => deferred.extend(frame.extended),
            }
        }
        for line in &deferred {
            writeln!(out, "{line}")?;
            lines += 1;
        }
        out.flush()?;
        *drawn = Some(lines);

        let signaled = bars
            .iter()
            .filter(|bar| bar.consume_completion_signal())
            .count();
        if signaled > 0 {
            let mut state = self.state.lock();
            state.pending = state.pending.saturating_sub(signaled);
            if state.pending == 0 {
                self.done.notify_all();
            }
        }

        trace!(lines, signaled, "progress frame drawn");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::Arc,
    };

    use parking_lot::Mutex;

    use crate::{param::Param, progress::Progress};

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Cursor Movement
    /// The cursor moves up by the previous frame's line count, extended lines included.
    #[test]
    fn test_cursor_up_counts_extended_lines() {
        let moves = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&moves);
        let sink = Sink::default();

        let p = Progress::builder()
            .param(Param::default())
            .output(sink.clone())
            .cursor_up(move |_, rows| {
                recorded.lock().push(rows);
                Ok(())
            })
            .build()
            .unwrap();
        let a = p.new_bar("a", 10).unwrap();
        p.new_bar("b", 10).unwrap();

        let shared = Arc::clone(&p.shared);
        let draw = || {
            let mut registry = shared.registry.lock();
            shared.draw(&mut registry).unwrap();
        };

        draw();
        assert!(moves.lock().is_empty(), "nothing to move over on the first frame");

        a.stop("boom", "line one\nline two");
        draw();
        draw();
        assert_eq!(*moves.lock(), [2, 4]);
        assert_eq!(shared.state.lock().pending, 1, "only the stopped bar signaled");
    }

    /// Pending Countdown
    /// Each terminal bar is counted exactly once across frames.
    #[test]
    fn test_pending_counts_down_once() {
        let p = Progress::builder().output(Sink::default()).build().unwrap();
        let a = p.new_bar("a", 1).unwrap();
        let b = p.new_bar("b", 1).unwrap();
        let shared = Arc::clone(&p.shared);
        let draw = || shared.draw(&mut shared.registry.lock()).unwrap();

        assert_eq!(shared.state.lock().pending, 2);
        a.increment();
        draw();
        draw();
        assert_eq!(shared.state.lock().pending, 1);

        b.stop("gave up", "");
        draw();
        assert_eq!(shared.state.lock().pending, 0);
    }
}
