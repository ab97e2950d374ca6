//! The layers of the stack.
//!
//! Each layer has an endpoint holding its configuration and state. To process incoming data, the
//! endpoint is borrowed together with a handler for the layer above, yielding a receiver that
//! implements the `Recv` trait of the layer below. These compose into a single callback chain:
//!
//! ```text
//! slip::Multiplexer::receive(peer, chunk, ip.recv(tcp.recv(app, time)))
//! ```
//!
//! Every incoming packet carries a `Handle` that allows the upper layer to answer through the
//! lower layers. The handle for tcp can send ip datagrams, the one for ip can transmit frames on
//! any line.
//!
//! Errors are mostly absorbed where they happen. The `Result` of this module is used where an
//! operation has an immediate caller that can sensibly react, such as sending a datagram.
use core::fmt;

use crate::wire;

pub mod icmp;
pub mod ip;
pub mod slip;
pub mod tcp;

/// The error type for the layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// A payload does not fit into a single datagram.
    BadSize,

    /// The device refused to take the frame.
    Device,

    /// An incoming packet could not be parsed.
    Malformed(wire::Error),
}

/// The result type for the layers.
pub type Result<T> = core::result::Result<T, Error>;

/// Wraps a closure as a handler.
///
/// Each layer implements its `Recv` trait for this wrapper around closures with a matching
/// signature, which saves defining a struct for simple handlers.
pub struct FnHandler<F>(pub F);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::BadSize => write!(f, "payload size out of bounds"),
            Error::Device => write!(f, "device failure"),
            Error::Malformed(err) => write!(f, "malformed packet: {}", err),
        }
    }
}

impl std::error::Error for Error { }

impl From<wire::Error> for Error {
    fn from(err: wire::Error) -> Self {
        Error::Malformed(err)
    }
}
