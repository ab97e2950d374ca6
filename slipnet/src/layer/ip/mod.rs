//! The IP layer.
//!
//! A node is both host and router. Datagrams addressed to the configured local address are
//! delivered to the upper layer, all others are forwarded along the longest matching route. There
//! is no notion of an attached subnet. Even peers directly at the end of a line are reached only
//! through an explicit route whose next hop names that line.
//!
//! ## Structure
//!
//! The [`Endpoint`] stores the local address and the routing table. The table is an immutable
//! value, replacing it swaps the whole table at once.
//!
//! ## Receiving packets
//!
//! The endpoint borrowed through [`Endpoint::recv`] acts as a frame receiver of the slip layer.
//! Frames that do not parse as IPv4, or fail their checksum, are rejected. A datagram for the
//! local address is handed upward only if it carries TCP. Any other datagram is forwarded with
//! its time to live decremented. When the time to live runs out, the source is told with an ICMP
//! time exceeded message, but only if there is a route back to it.
//!
//! ## Transmitting packets
//!
//! Locally originated datagrams always carry a plain twenty octet header with time to live 64.
//! The source address is the local address, or unspecified while none is configured.
//!
//! [`Endpoint`]: struct.Endpoint.html
//! [`Endpoint::recv`]: struct.Endpoint.html#method.recv
use crate::layer::FnHandler;

mod endpoint;
mod packet;
mod route;
#[cfg(test)]
mod tests;

pub use endpoint::{
    Endpoint,
    Receiver,
};

pub use packet::{
    Handle,
    In as InPacket,
};

pub use route::{
    ParseRouteError,
    Route,
    Routes,
};

/// An IP receiver.
///
/// Gets all datagrams that are addressed to this host and carry a supported protocol.
pub trait Recv {
    /// Inspect one incoming datagram.
    fn receive(&mut self, packet: InPacket);
}

impl<E: Recv + ?Sized> Recv for &'_ mut E {
    fn receive(&mut self, packet: InPacket) {
        (**self).receive(packet)
    }
}

impl<F> Recv for FnHandler<F>
    where F: FnMut(InPacket)
{
    fn receive(&mut self, packet: InPacket) {
        (self.0)(packet)
    }
}
