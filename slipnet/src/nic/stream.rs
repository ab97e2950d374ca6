//! A device on top of any writer.
use std::io::{self, Write};

use super::Device;

/// Writes frames to an `io::Write`, such as an opened serial tty or a pipe.
///
/// Each frame is flushed on its own so that no partial frame lingers in a buffer.
#[derive(Debug)]
pub struct Stream<W> {
    inner: W,
}

impl<W: Write> Stream<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Stream { inner }
    }

    /// Get a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Device for Stream<W> {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.inner.write_all(frame)?;
        self.inner.flush()
    }
}
