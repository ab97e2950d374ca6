//! A software device recording all writes.
use std::io;

use super::Device;

/// A device that keeps every frame written to it.
///
/// Nothing is actually transmitted. Useful to inspect the output of the stack in tests, or to
/// connect two stacks by handing the captured bytes of one to the `receive` of the other.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    frames: Vec<Vec<u8>>,
    broken: bool,
}

impl Capture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Capture::default()
    }

    /// Create a capture that refuses every write.
    pub fn broken() -> Self {
        Capture {
            frames: Vec::new(),
            broken: true,
        }
    }

    /// All frames written so far, oldest first.
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// Remove and return all frames written so far.
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        core::mem::replace(&mut self.frames, Vec::new())
    }
}

impl Device for Capture {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "capture refuses writes"));
        }

        self.frames.push(frame.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut capture = Capture::new();
        capture.send(b"one").unwrap();
        capture.send(b"two").unwrap();
        assert_eq!(capture.frames().len(), 2);
        assert_eq!(capture.take(), vec![b"one".to_vec(), b"two".to_vec()]);
        assert!(capture.frames().is_empty());
    }

    #[test]
    fn broken_refuses() {
        let mut capture = Capture::broken();
        assert!(capture.send(b"one").is_err());
        assert!(capture.frames().is_empty());
    }
}
