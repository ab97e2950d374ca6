//! The serial line layer.
//!
//! Each line connects to exactly one peer, identified by its ip address. There is no link layer
//! addressing, the line chosen for a frame *is* its destination. The [`Multiplexer`] holds one
//! stream [`Decoder`] and one [`Device`] per line and dispatches all complete frames to a single
//! upper layer handler, together with a [`Handle`] to transmit on any line.
//!
//! [`Multiplexer`]: struct.Multiplexer.html
//! [`Decoder`]: struct.Decoder.html
//! [`Device`]: ../../nic/trait.Device.html
//! [`Handle`]: struct.Handle.html
use crate::layer::{FnHandler, Result};

mod decoder;
mod endpoint;
mod packet;

pub use decoder::Decoder;

pub use endpoint::{
    Lines,
    Multiplexer,
};

pub use packet::{
    Delivery,
    Handle,
    In as InFrame,
    Transmit,
};

/// A frame receiver.
pub trait Recv {
    /// Inspect one complete, unescaped frame.
    ///
    /// An error does not affect the decoding of subsequent frames. It is only logged.
    fn receive(&mut self, frame: InFrame) -> Result<()>;
}

impl<E: Recv + ?Sized> Recv for &'_ mut E {
    fn receive(&mut self, frame: InFrame) -> Result<()> {
        (**self).receive(frame)
    }
}

impl<F> Recv for FnHandler<F>
    where F: FnMut(InFrame) -> Result<()>
{
    fn receive(&mut self, frame: InFrame) -> Result<()> {
        (self.0)(frame)
    }
}
