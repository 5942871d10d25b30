//! Iterator adapters that advance a bar per item.
//!
//! [`BarIteratorExt`] adds helpers to every [`Iterator`] so a loop can drive a bar
//! without touching it directly:
//!
//! ```no_run
//! use atomic_multibar::{BarIteratorExt, Progress};
//!
//! let progress = Progress::new();
//! let files = vec!["a.txt", "b.txt", "c.txt"];
//! let iter = files.into_iter().progress_in(&progress, "files")?;
//!
//! progress.start()?;
//! for file in iter {
//!     // ...
//! #   let _ = file;
//! }
//! progress.wait()?;
//! # Ok::<(), atomic_multibar::ProgressError>(())
//! ```
//!
//! When the underlying iterator runs dry the bar is driven to its total, so a loop that
//! yields fewer items than announced still completes its bar.

use compact_str::CompactString;

use crate::{bar::Bar, error::ProgressError, progress::Progress};

/// An iterator that advances a [`Bar`] on every item.
pub struct BarIter<I> {
    iter: I,
    bar: Bar,
}

impl<I> BarIter<I> {
    /// Wraps `iter`, advancing `bar`.
    pub const fn new(iter: I, bar: Bar) -> Self {
        Self { iter, bar }
    }

    /// Returns the bar being advanced.
    pub const fn bar(&self) -> &Bar {
        &self.bar
    }
}

impl<I: Iterator> Iterator for BarIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next();

        if item.is_some() {
            self.bar.increment();
        } else {
            // Exhausted; no-op if the bar already completed or was stopped.
            self.bar.update(u64::MAX);
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach a [`Bar`] to any iterator.
pub trait BarIteratorExt: Iterator + Sized {
    /// Advances an existing bar per item.
    fn progress_with(self, bar: Bar) -> BarIter<Self>;

    /// Creates a bar in `progress`, sized by the iterator's length, and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Stopped`] if `progress` was stopped.
    fn progress_in(
        self,
        progress: &Progress,
        key: impl Into<CompactString>,
    ) -> Result<BarIter<Self>, ProgressError>
    where
        Self: ExactSizeIterator;
}

impl<I: Iterator> BarIteratorExt for I {
    fn progress_with(self, bar: Bar) -> BarIter<Self> {
        BarIter::new(self, bar)
    }

    fn progress_in(
        self,
        progress: &Progress,
        key: impl Into<CompactString>,
    ) -> Result<BarIter<Self>, ProgressError>
    where
        Self: ExactSizeIterator,
    {
        let bar = progress.new_bar(key, self.len() as u64)?;
        Ok(BarIter::new(self, bar))
    }
}

#[cfg(test)]
mod tests {
    use super::BarIteratorExt as _;
    use crate::{bar::BarStatus, progress::Progress};

    fn quiet() -> Progress {
        Progress::builder().output(std::io::sink()).build().unwrap()
    }

    /// Iterator Integration
    /// The bar is sized from the iterator and completes on exhaustion.
    #[test]
    fn test_iterator_adapter() {
        let progress = quiet();
        let data = [1, 2, 3, 4, 5];

        let iter = data.iter().progress_in(&progress, "iter_test").unwrap();
        let bar = iter.bar().clone();
        assert_eq!(bar.total(), 5);

        assert_eq!(iter.sum::<i32>(), 15);
        assert_eq!(bar.current(), 5);
        assert_eq!(bar.status(), BarStatus::Completed);
    }

    /// Short Iterators
    /// Yielding fewer items than the bar expects still completes it.
    #[test]
    fn test_short_iterator_completes_bar() {
        let progress = quiet();
        let bar = progress.new_bar("short", 10).unwrap();

        let count = (0..3).progress_with(bar.clone()).count();
        assert_eq!(count, 3);
        assert_eq!(bar.current(), 10);
        assert!(bar.is_finished());
    }
}
