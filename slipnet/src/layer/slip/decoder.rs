use crate::layer::Result;
use crate::wire::slip::{self, END, ESC};

/// A streaming frame decoder.
///
/// Bytes can be fed in chunks of any size, a frame may span any number of chunks. The decoder
/// has two states: reading plain bytes, or having just read an `ESC`.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    buffer: Vec<u8>,
    escaping: bool,
}

impl Decoder {
    /// Create a decoder expecting the start of a frame.
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Query if the previous byte was an unfinished escape sequence.
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// The number of decoded bytes of the frame currently in progress.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Process a chunk of raw line bytes.
    ///
    /// Calls `deliver` for every completed, non-empty frame. An error returned from it is logged
    /// and the remaining bytes are processed regardless.
    pub fn feed<F>(&mut self, chunk: &[u8], mut deliver: F)
        where F: FnMut(&[u8]) -> Result<()>
    {
        for &byte in chunk {
            if self.escaping {
                self.escaping = false;
                match slip::unescape(byte) {
                    Some(byte) => self.buffer.push(byte),
                    None => net_debug!("slip: dropping invalid escaped byte {:#04x}", byte),
                }
                continue;
            }

            match byte {
                END => self.finish(&mut deliver),
                ESC => self.escaping = true,
                other => self.buffer.push(other),
            }
        }
    }

    fn finish<F>(&mut self, deliver: &mut F)
        where F: FnMut(&[u8]) -> Result<()>
    {
        // Delimiters at the start and end of frames as well as back to back.
        if self.buffer.is_empty() {
            return;
        }

        if let Err(err) = deliver(&self.buffer) {
            net_warn!("slip: frame of {} bytes rejected: {}", self.buffer.len(), err);
        }

        self.buffer.clear();
    }
}
