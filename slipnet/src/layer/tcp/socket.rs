use crate::layer::ip;
use crate::time::Instant;

use super::connection::{Connection, State};
use super::endpoint::FourTuple;

/// A connection together with the means to send on it.
///
/// Handed to the application in callbacks, or obtained through [`Server::socket`].
///
/// [`Server::socket`]: struct.Server.html#method.socket
pub struct Socket<'a> {
    connection: &'a mut Connection,
    handle: ip::Handle<'a>,
    time: Instant,
}

impl<'a> Socket<'a> {
    pub(crate) fn new(connection: &'a mut Connection, handle: ip::Handle<'a>, time: Instant) -> Self {
        Socket { connection, handle, time, }
    }

    /// The identity of the connection.
    pub fn id(&self) -> FourTuple {
        self.connection.id()
    }

    /// The state of the connection.
    pub fn state(&self) -> State {
        self.connection.state()
    }

    /// Inspect the connection.
    pub fn connection(&self) -> &Connection {
        self.connection
    }

    /// The time of the current event.
    pub fn time(&self) -> Instant {
        self.time
    }

    /// Queue data for sending and send what the window allows.
    ///
    /// Ignored once the connection is closed.
    pub fn send(&mut self, data: &[u8]) {
        self.connection.send(&mut self.handle, data, self.time)
    }

    /// Close our half of the connection by sending a FIN.
    ///
    /// Only has an effect while established or after the peer closed. Data still waiting for the
    /// window is sent first, the FIN follows it.
    pub fn close(&mut self) {
        self.connection.close(&mut self.handle, self.time)
    }
}
