//! Byte-counting adapters that drive a bar from a transfer.
//!
//! [`BarReader`] and [`BarWriter`] wrap any [`Read`] or [`Write`] and [`add`](Bar::add)
//! every byte actually moved to their [`Bar`]. Give the bar the expected byte count as
//! its total, e.g. a file's length or a `Content-Length`.
//!
//! The bar's own rules apply to the counts:
//!
//! * A transfer longer than announced clamps at the total; the bar completes once, on
//!   the byte that reaches it.
//! * A transfer shorter than announced leaves the bar running. Call
//!   [`Bar::stop`] (or [`Progress::stop`](crate::Progress::stop)) so a waiter is released.
//! * Once the bar is stopped, the adapter keeps passing data through but the bar no
//!   longer moves.

use std::io::{self, BufRead, Read, Write};

use crate::bar::Bar;

/// A [`Read`] wrapper that advances a [`Bar`] by the bytes read.
///
/// If the inner reader is [`BufRead`], so is the wrapper; bytes then count when they
/// are [consumed](BufRead::consume), not when the buffer is filled.
pub struct BarReader<R> {
    inner: R,
    bar: Bar,
}

impl<R> BarReader<R> {
    /// Wraps `inner`, advancing `bar`.
    pub const fn new(inner: R, bar: Bar) -> Self {
        Self { inner, bar }
    }

    /// Returns the bar being advanced.
    pub const fn bar(&self) -> &Bar {
        &self.bar
    }

    /// Unwraps the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BarReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bar.add(n as u64);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for BarReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.bar.add(amt as u64);
    }
}

/// A [`Write`] wrapper that advances a [`Bar`] by the bytes the inner writer accepted.
///
/// Short writes count only what was written; failed writes count nothing.
pub struct BarWriter<W> {
    inner: W,
    bar: Bar,
}

impl<W> BarWriter<W> {
    /// Wraps `inner`, advancing `bar`.
    pub const fn new(inner: W, bar: Bar) -> Self {
        Self { inner, bar }
    }

    /// Returns the bar being advanced.
    pub const fn bar(&self) -> &Bar {
        &self.bar
    }

    /// Unwraps the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for BarWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bar.add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
