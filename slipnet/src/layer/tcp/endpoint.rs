use core::fmt;
use std::collections::HashMap;

use crate::layer::ip;
use crate::time::{Expiration, Instant};
use crate::wire::{Ipv4Address, TcpRepr, tcp_packet};

use super::{Accept, Config, Recv};
use super::connection::{Connection, Incoming};
use super::siphash::IsnGenerator;
use super::socket::Socket;

/// The identity of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FourTuple {
    /// Our address.
    pub local: Ipv4Address,
    /// Our port, the listening port.
    pub local_port: u16,
    /// The address of the peer.
    pub remote: Ipv4Address,
    /// The port of the peer.
    pub remote_port: u16,
}

/// The connections of a server, by identity.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<FourTuple, Connection>,
}

/// A server listening on a single port.
pub struct Server {
    port: u16,
    config: Config,
    isn: IsnGenerator,
    registry: Registry,
}

/// A server borrowed for receiving.
///
/// Implements the upper protocol of the ip layer.
pub struct Receiver<'a, A> {
    server: &'a mut Server,
    app: A,
    time: Instant,
}

impl Registry {
    /// Insert a connection under its identity.
    ///
    /// Returns the connection that was replaced, if any.
    pub fn insert(&mut self, connection: Connection) -> Option<Connection> {
        self.connections.insert(connection.id(), connection)
    }

    /// Look up a connection.
    pub fn get(&self, id: FourTuple) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Look up a connection for modification.
    pub fn get_mut(&mut self, id: FourTuple) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Forget a connection.
    pub fn remove(&mut self, id: FourTuple) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// The number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Query if there are no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Iterate over all connections, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item=&Connection> + '_ {
        self.connections.values()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item=&mut Connection> + '_ {
        self.connections.values_mut()
    }
}

impl Server {
    /// Listen on a port, with a randomly keyed sequence number generator.
    pub fn new(port: u16, config: Config) -> Self {
        Server::with_isn_generator(port, config, IsnGenerator::from_std_hash())
    }

    /// Listen on a port, choosing initial sequence numbers with the given generator.
    pub fn with_isn_generator(port: u16, config: Config, isn: IsnGenerator) -> Self {
        Server {
            port,
            config,
            isn,
            registry: Registry::default(),
        }
    }

    /// The listening port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The parameters of new connections.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All connections.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All connections, for modification.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Borrow the server as a receiver for the ip layer.
    ///
    /// The application is notified of new connections and receives their data.
    pub fn recv<A>(&mut self, app: A, time: Instant) -> Receiver<'_, A>
        where A: Accept + Recv,
    {
        Receiver { server: self, app, time, }
    }

    /// Fire all due retransmission timers.
    pub fn poll(&mut self, mut handle: ip::Handle, time: Instant) {
        for connection in self.registry.iter_mut() {
            connection.poll(&mut handle, time);
        }
    }

    /// The earliest deadline of any connection.
    pub fn next_deadline(&self) -> Expiration {
        self.registry.iter()
            .map(Connection::deadline)
            .min()
            .unwrap_or(Expiration::Never)
    }

    /// A socket for a connection, outside of any callback.
    pub fn socket<'a>(&'a mut self, id: FourTuple, handle: ip::Handle<'a>, time: Instant)
        -> Option<Socket<'a>>
    {
        let connection = self.registry.get_mut(id)?;
        Some(Socket::new(connection, handle, time))
    }

    /// Open a new connection in answer to a SYN.
    fn open<A: Accept>(
        &mut self,
        mut handle: ip::Handle,
        id: FourTuple,
        repr: &TcpRepr,
        app: &mut A,
        time: Instant,
    ) {
        let isn = self.isn.get_isn(id, time);
        let mut connection = Connection::new(id, isn, repr.seq_number, self.config);
        connection.send_syn_ack(&mut handle);

        if let Some(old) = self.registry.insert(connection) {
            net_debug!("tcp: {} replaced connection in state {:?}", id, old.state());
        }
        net_debug!("tcp: {} opened, isn={}", id, isn);

        if let Some(connection) = self.registry.get_mut(id) {
            app.accept(&mut Socket::new(connection, handle.borrow_mut(), time));
        }
    }

    /// Process a segment of an existing connection.
    fn process<R: Recv>(
        &mut self,
        mut handle: ip::Handle,
        id: FourTuple,
        repr: &TcpRepr,
        payload: &[u8],
        app: &mut R,
        time: Instant,
    ) {
        let connection = match self.registry.get_mut(id) {
            Some(connection) => connection,
            None => {
                net_debug!("tcp: no connection for {}, dropping {}", id, repr);
                return;
            },
        };

        connection.on_ack(&mut handle, repr, time);

        match connection.on_data(repr) {
            Incoming::Ignored => (),
            Incoming::Duplicate => connection.send_ack(&mut handle),
            Incoming::InOrder { fin } => {
                if !payload.is_empty() {
                    let mut socket = Socket::new(connection, handle.borrow_mut(), time);
                    app.receive(&mut socket, payload);
                }
                if fin {
                    let mut socket = Socket::new(connection, handle.borrow_mut(), time);
                    app.receive(&mut socket, &[]);
                }
                connection.send_ack(&mut handle);
            },
        }
    }
}

impl<A> ip::Recv for Receiver<'_, A>
    where A: Accept + Recv,
{
    fn receive(&mut self, packet: ip::InPacket) {
        let ip::InPacket { handle, repr: ip_repr, payload } = packet;

        let segment = match tcp_packet::new_checked(payload) {
            Ok(segment) => segment,
            Err(err) => {
                net_debug!("tcp: dropping segment from {}: {}", ip_repr.src_addr, err);
                return;
            },
        };

        let repr = match TcpRepr::parse(segment) {
            Ok(repr) => repr,
            Err(err) => {
                net_debug!("tcp: dropping segment from {}: {}", ip_repr.src_addr, err);
                return;
            },
        };

        if repr.dst_port != self.server.port {
            net_debug!("tcp: dropping segment for port {}", repr.dst_port);
            return;
        }

        if handle.checksum().manual()
            && !segment.verify_checksum(ip_repr.src_addr, ip_repr.dst_addr)
        {
            net_debug!("tcp: dropping segment from {} with wrong checksum", ip_repr.src_addr);
            return;
        }

        let id = FourTuple {
            local: ip_repr.dst_addr,
            local_port: repr.dst_port,
            remote: ip_repr.src_addr,
            remote_port: repr.src_port,
        };
        net_trace!("tcp: {} recv {}", id, repr);

        if repr.flags.syn() {
            self.server.open(handle, id, &repr, &mut self.app, self.time);
        } else {
            self.server.process(handle, id, &repr, segment.payload_slice(), &mut self.app, self.time);
        }
    }
}

impl fmt::Display for FourTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}:{}", self.local, self.local_port, self.remote, self.remote_port)
    }
}
