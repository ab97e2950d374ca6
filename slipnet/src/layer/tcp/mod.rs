//! The TCP layer.
//!
//! Only the passive side of a connection exists. A [`Server`] listens on one port and every SYN
//! to that port opens a new [`Connection`], replacing any previous connection with the same
//! identity. The application learns of connections and their data through the [`Accept`] and
//! [`Recv`] traits and acts on them through a [`Socket`].
//!
//! ## Sending
//!
//! Data given to [`Socket::send`] is queued without bound and drained in segments of at most one
//! maximum segment size, as far as the congestion window allows. The window grows by one segment
//! for each window of acknowledged data and halves when the retransmission timer fires. Only the
//! oldest outstanding segment is ever retransmitted.
//!
//! ## Receiving
//!
//! Only the segment at exactly the expected sequence number is accepted, everything else is
//! answered with a duplicate acknowledgment. A FIN delivers an empty slice to the application
//! and the connection waits for it to close its half.
//!
//! ## Timers
//!
//! Nothing happens on its own. The owner polls the server with the current time, see
//! [`Server::poll`] and [`Server::next_deadline`].
//!
//! [`Server`]: struct.Server.html
//! [`Connection`]: struct.Connection.html
//! [`Accept`]: trait.Accept.html
//! [`Recv`]: trait.Recv.html
//! [`Socket`]: struct.Socket.html
//! [`Socket::send`]: struct.Socket.html#method.send
//! [`Server::poll`]: struct.Server.html#method.poll
//! [`Server::next_deadline`]: struct.Server.html#method.next_deadline
use crate::time::Duration;

mod connection;
mod endpoint;
mod rtt;
mod siphash;
mod socket;
#[cfg(test)]
mod tests;

pub use connection::{
    Congestion,
    Connection,
    State,
};

pub use endpoint::{
    FourTuple,
    Receiver,
    Registry,
    Server,
};

pub use rtt::RttEstimator;
pub use siphash::IsnGenerator;
pub use socket::Socket;

/// Parameters of all connections of a server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// The maximum segment size, the largest payload of a single segment.
    pub mss: usize,

    /// The receive window advertised in every segment.
    pub window_len: u16,

    /// The retransmission timeout before the first round trip sample.
    pub initial_timeout: Duration,

    /// Lower bound of the retransmission timeout.
    pub min_timeout: Duration,

    /// Upper bound of the retransmission timeout.
    pub max_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mss: 1460,
            window_len: 1024,
            initial_timeout: Duration::from_secs(1),
            min_timeout: Duration::from_millis(200),
            max_timeout: Duration::from_millis(300),
        }
    }
}

/// Gets notified of new connections.
pub trait Accept {
    /// A connection has just been opened, its SYN+ACK is already sent.
    fn accept(&mut self, socket: &mut Socket);
}

/// Receives the data of connections.
pub trait Recv {
    /// In-order data arrived on a connection.
    ///
    /// Each octet is delivered exactly once. An empty slice signals that the peer has closed its
    /// half of the connection.
    fn receive(&mut self, socket: &mut Socket, data: &[u8]);
}

impl<A: Accept + ?Sized> Accept for &'_ mut A {
    fn accept(&mut self, socket: &mut Socket) {
        (**self).accept(socket)
    }
}

impl<R: Recv + ?Sized> Recv for &'_ mut R {
    fn receive(&mut self, socket: &mut Socket, data: &[u8]) {
        (**self).receive(socket, data)
    }
}

/// An application that ignores new connections and drops all data.
impl Accept for () {
    fn accept(&mut self, _: &mut Socket) { }
}

impl Recv for () {
    fn receive(&mut self, _: &mut Socket, _: &[u8]) { }
}
