//! The registry that owns, draws, and waits on a set of bars.
//!
//! A [`Progress`] keeps its bars in creation order (which is also draw order) plus a
//! key lookup, and runs a single render thread that redraws all of them in place every
//! [`Param::interval`]. Producers never talk to the registry after
//! [`new_bar`](Progress::new_bar); they update their [`Bar`] directly.
//!
//! # Synchronization Strategy
//!
//! There are three locks, always acquired in this order and never the reverse:
//!
//! 1. The **registry lock**, which guards the bar list, the key map, the output sink and
//!    the cursor-up strategy. Creation, broadcasts, [`stop`](Progress::stop) and every
//!    render pass take it.
//! 2. The **bar locks**, taken one at a time in list order while a bar is stringified
//!    or updated by a broadcast.
//! 3. The **loop-state lock**, which guards the pending count and the stop/quit flags
//!    that [`wait`](Progress::wait) and the render thread sleep on.
//!
//! Producers only ever take their own bar lock, so they block neither each other nor
//! the registry for longer than one render of their bar.
//!
//! # Completion
//!
//! Every bar increments a pending counter when created. The render loop decrements it
//! once per bar, in a pass that runs *after* drawing, so every bar is on screen in its
//! final state before it counts as done. [`wait`](Progress::wait) returns when the
//! counter reaches zero, when [`stop`](Progress::stop) is called, or when drawing
//! fails.

use std::{
    collections::HashMap,
    fmt,
    io::{self, Write},
    sync::Arc,
    thread::JoinHandle,
};

use compact_str::CompactString;
use crossterm::{QueueableCommand, cursor::MoveUp};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::{
    bar::{Bar, BarSnapshot},
    builder::ProgressBuilder,
    decorate::Decorator,
    error::ProgressError,
    param::Param,
    render,
    style::StyleTable,
};

/// Moves the terminal cursor up by the given number of rows.
pub type CursorUp = Box<dyn FnMut(&mut dyn Write, usize) -> io::Result<()> + Send>;

/// Emits `ESC[<rows>A`.
pub fn ansi_cursor_up(out: &mut dyn Write, rows: usize) -> io::Result<()> {
    let rows = u16::try_from(rows).unwrap_or(u16::MAX);
    out.queue(MoveUp(rows))?;
    Ok(())
}

/// A thread-safe, cloneable registry of progress bars with its own render thread.
///
/// ```no_run
/// use atomic_multibar::Progress;
///
/// let progress = Progress::new();
/// let bar = progress.new_bar("download", 100)?;
///
/// std::thread::spawn(move || {
///     for _ in 0..100 {
///         bar.increment();
///     }
/// });
///
/// progress.start()?;
/// progress.wait()?;
/// # Ok::<(), atomic_multibar::ProgressError>(())
/// ```
#[derive(Clone)]
pub struct Progress {
    pub(crate) shared: Arc<Shared>,
    _owner: Arc<Owner>,
}

/// Held only by [`Progress`] handles, never by the render thread. Dropping the last
/// handle without [`wait`](Progress::wait) tells the thread to draw once more and exit.
struct Owner(Arc<Shared>);

impl Drop for Owner {
    fn drop(&mut self) {
        let detached = {
            let mut state = self.0.state.lock();
            state.quit = true;
            state.render.take()
        };
        self.0.wake.notify_all();
        if detached.is_some() {
            debug!("progress dropped while rendering, render thread detached");
        }
    }
}

pub(crate) struct Shared {
    pub(crate) param: Arc<Param>,
    pub(crate) registry: Mutex<Registry>,
    pub(crate) state: Mutex<LoopState>,
    /// Wakes [`Progress::wait`].
    pub(crate) done: Condvar,
    /// Wakes the render thread.
    pub(crate) wake: Condvar,
}

pub(crate) struct Registry {
    pub(crate) bars: Vec<Bar>,
    by_key: HashMap<CompactString, Bar>,
    stopped: bool,
    pub(crate) out: Box<dyn Write + Send>,
    pub(crate) cursor_up: CursorUp,
    /// Lines written by the previous render pass, `None` before the first one.
    pub(crate) drawn: Option<usize>,
}

#[derive(Default)]
pub(crate) struct LoopState {
    pub(crate) pending: usize,
    pub(crate) stopped: bool,
    pub(crate) quit: bool,
    pub(crate) failed: bool,
    started: bool,
    render: Option<JoinHandle<Result<(), ProgressError>>>,
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only metadata; the bars stay unlocked.
        f.debug_struct("Progress")
            .field("count", &self.len())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Creates a registry with default parameters that draws to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            Param::default(),
            Box::new(io::stdout()),
            Box::new(ansi_cursor_up),
        )
    }

    /// Creates a registry with custom parameters that draws to stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Layout`] if `param` is invalid.
    pub fn with_param(param: Param) -> Result<Self, ProgressError> {
        ProgressBuilder::new().param(param).build()
    }

    /// Starts a [`ProgressBuilder`].
    #[must_use]
    pub fn builder() -> ProgressBuilder {
        ProgressBuilder::new()
    }

    /// Assembles a registry from already validated parts.
    pub(crate) fn from_parts(
        param: Param,
        out: Box<dyn Write + Send>,
        cursor_up: CursorUp,
    ) -> Self {
        let shared = Arc::new(Shared {
            param: Arc::new(param),
            registry: Mutex::new(Registry {
                bars: Vec::new(),
                by_key: HashMap::new(),
                stopped: false,
                out,
                cursor_up,
                drawn: None,
            }),
            state: Mutex::new(LoopState::default()),
            done: Condvar::new(),
            wake: Condvar::new(),
        });
        Self {
            _owner: Arc::new(Owner(Arc::clone(&shared))),
            shared,
        }
    }

    /// Returns the layout parameters.
    #[must_use]
    pub fn param(&self) -> &Param {
        &self.shared.param
    }

    // ========================================================================
    // Bars
    // ========================================================================

    /// Creates a bar, appends it to the draw order, and returns its handle.
    ///
    /// Keys are expected to be unique. Reusing one still adds a new bar, but
    /// [`bar`](Self::bar) will then only find the newest.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Stopped`] after [`stop`](Self::stop).
    pub fn new_bar(&self, key: impl Into<CompactString>, total: u64) -> Result<Bar, ProgressError> {
        let key = key.into();
        let mut registry = self.shared.registry.lock();
        if registry.stopped {
            return Err(ProgressError::Stopped);
        }

        let bar = Bar::new(key.clone(), total, Arc::clone(&self.shared.param));
        registry.bars.push(bar.clone());
        if registry.by_key.insert(key.clone(), bar.clone()).is_some() {
            warn!(%key, "duplicate bar key, lookup now returns the newest bar");
        }
        self.shared.state.lock().pending += 1;

        debug!(%key, total, "bar created");
        Ok(bar)
    }

    /// Looks up a bar by key.
    #[must_use]
    pub fn bar(&self, key: &str) -> Option<Bar> {
        self.shared.registry.lock().by_key.get(key).cloned()
    }

    /// Returns handles to all bars, in draw order.
    #[must_use]
    pub fn bars(&self) -> Vec<Bar> {
        self.shared.registry.lock().bars.clone()
    }

    /// Returns the number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.registry.lock().bars.len()
    }

    /// Returns `true` if no bars were created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.registry.lock().bars.is_empty()
    }

    /// Returns a snapshot of every bar, in draw order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BarSnapshot> {
        // Clone the handles under the lock, snapshot the bars without it.
        let bars = self.bars();
        bars.iter().map(Bar::snapshot).collect()
    }

    // ========================================================================
    // Broadcasts
    // ========================================================================

    /// Applies `style` to every bar created so far.
    ///
    /// Bars created afterwards keep the default style.
    pub fn set_style(&self, style: &StyleTable) {
        let registry = self.shared.registry.lock();
        for bar in &registry.bars {
            bar.set_style(style.clone());
        }
    }

    /// Gives every bar created so far a fresh pre-bar decorator from `make`.
    ///
    /// Each bar gets its own instance, so stateful decorators such as
    /// [`Elapsed`](crate::decorate::Elapsed) keep per-bar state.
    pub fn set_pre_decorator<D, F>(&self, mut make: F)
    where
        D: Decorator + 'static,
        F: FnMut() -> D,
    {
        let registry = self.shared.registry.lock();
        for bar in &registry.bars {
            bar.set_pre_decorator(make());
        }
    }

    /// Gives every bar created so far a fresh post-bar decorator from `make`.
    pub fn set_post_decorator<D, F>(&self, mut make: F)
    where
        D: Decorator + 'static,
        F: FnMut() -> D,
    {
        let registry = self.shared.registry.lock();
        for bar in &registry.bars {
            bar.set_post_decorator(make());
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Draws every bar once, then starts the render thread.
    ///
    /// The thread runs until [`wait`](Self::wait) returns or the last `Progress`
    /// handle is dropped, whichever comes first.
    ///
    /// # Errors
    ///
    /// * [`ProgressError::Stopped`] after [`stop`](Self::stop).
    /// * [`ProgressError::AlreadyStarted`] on a second call.
    /// * [`ProgressError::Io`] if the first draw fails or the thread cannot be spawned.
    pub fn start(&self) -> Result<(), ProgressError> {
        // Held throughout so concurrent starts are serialized.
        let mut registry = self.shared.registry.lock();
        if registry.stopped {
            return Err(ProgressError::Stopped);
        }
        if self.shared.state.lock().started {
            return Err(ProgressError::AlreadyStarted);
        }

        self.shared.draw(&mut registry)?;

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("progress-render".into())
            .spawn(move || render::run(&shared))?;

        let mut state = self.shared.state.lock();
        state.started = true;
        state.render = Some(handle);
        drop(state);

        debug!(
            bars = registry.bars.len(),
            interval = ?self.shared.param.interval,
            "progress rendering started"
        );
        Ok(())
    }

    /// Stops the registry and every bar still running.
    ///
    /// No bars can be created afterwards, and a pending [`wait`](Self::wait) returns
    /// without waiting for the remaining bars. See [`Bar::stop`] for how the messages
    /// are applied.
    pub fn stop(&self, message: &str, extended: &str) {
        let mut registry = self.shared.registry.lock();
        registry.stopped = true;
        for bar in &registry.bars {
            bar.stop(message, extended);
        }

        self.shared.state.lock().stopped = true;
        self.shared.done.notify_all();
        debug!(bars = registry.bars.len(), "progress stopped");
    }

    /// Returns `true` once [`stop`](Self::stop) was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.registry.lock().stopped
    }

    /// Blocks until every bar has completed or stopped and been drawn, or until
    /// [`stop`](Self::stop) is called, then shuts the render thread down.
    ///
    /// The render thread draws one last frame before exiting. Calling `wait` again
    /// returns immediately.
    ///
    /// # Errors
    ///
    /// * [`ProgressError::NotStarted`] if [`start`](Self::start) was never called.
    /// * [`ProgressError::Io`] if the render thread failed to write.
    /// * [`ProgressError::RenderPanicked`] if the render thread panicked.
    pub fn wait(&self) -> Result<(), ProgressError> {
        let handle = {
            let mut state = self.shared.state.lock();
            if !state.started {
                return Err(ProgressError::NotStarted);
            }
            while state.render.is_some() && state.pending > 0 && !state.stopped && !state.failed
            {
                self.shared.done.wait(&mut state);
            }
            state.quit = true;
            state.render.take()
        };
        self.shared.wake.notify_all();

        let Some(handle) = handle else {
            return Ok(());
        };
        handle.join().map_err(|_| ProgressError::RenderPanicked)?
    }
}
