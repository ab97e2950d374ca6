use crate::layer::Result;
use crate::wire::{Checksum, Ipv4Address};

/// The outcome of handing a datagram to the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The frame was written to the device.
    Sent,

    /// No line leads to the next hop, the datagram was dropped.
    Unreachable,
}

/// Something that can put datagrams on a line.
pub trait Transmit {
    /// Frame and write a datagram on the line toward `next_hop`.
    fn transmit(&mut self, datagram: &[u8], next_hop: Ipv4Address) -> Result<Delivery>;
}

/// A handle to the lines, passed along with every incoming frame.
pub struct Handle<'a> {
    lines: &'a mut dyn Transmit,
    checksum: Checksum,
}

/// An incoming frame.
pub struct In<'a> {
    /// The peer at the other end of the line the frame arrived on.
    pub peer: Ipv4Address,

    /// A handle to answer or forward.
    pub handle: Handle<'a>,

    /// The unescaped frame content.
    pub frame: &'a [u8],
}

impl<'a> Handle<'a> {
    /// Wrap some lines into a handle.
    pub fn new(lines: &'a mut dyn Transmit, checksum: Checksum) -> Self {
        Handle { lines, checksum }
    }

    /// Reborrow the handle with a shorter lifetime.
    pub fn borrow_mut(&mut self) -> Handle<'_> {
        Handle {
            lines: &mut *self.lines,
            checksum: self.checksum,
        }
    }

    /// Whether incoming checksums need to be validated.
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Transmit a datagram toward the next hop.
    pub fn transmit(&mut self, datagram: &[u8], next_hop: Ipv4Address) -> Result<Delivery> {
        self.lines.transmit(datagram, next_hop)
    }
}
