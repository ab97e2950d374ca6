//! Encapsulates a serial line device.
//!
//! The stack only ever writes to a device. Bytes read from the line are handed to the stack by
//! whoever owns the reading half, see [`Interface::receive`].
//!
//! [`Interface::receive`]: ../iface/struct.Interface.html#method.receive
use std::io;

mod capture;
mod stream;

pub use self::capture::Capture;
pub use self::stream::Stream;

/// The sending half of a raw, full-duplex byte transport to one peer.
pub trait Device {
    /// Write all bytes of one encoded frame.
    ///
    /// A frame is written as a whole or the device is considered faulty. The stack does not retry
    /// and will not resend the frame, upper layers recover through their own retransmission.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl<D: Device + ?Sized> Device for &'_ mut D {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send(frame)
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send(frame)
    }
}
