//! A complete node, owning all layers.
//!
//! The layers can be wired together by hand, see [`layer`]. An [`Interface`] does that wiring
//! for the common case of a node with one tcp server:
//!
//! ```rust
//! use slipnet::config::Config;
//! use slipnet::iface::Interface;
//! use slipnet::layer::slip::Multiplexer;
//! use slipnet::nic::Capture;
//! use slipnet::time::Instant;
//!
//! let config = Config::new()
//!     .local_addr("10.0.0.1".parse().unwrap())
//!     .route("10.0.0.2/32=10.0.0.2".parse().unwrap());
//!
//! let mut lines = Multiplexer::new(config.checksum);
//! lines.add_line("10.0.0.2".parse().unwrap(), Capture::new());
//! let mut iface = Interface::new(lines, &config);
//!
//! // Bytes read from the line toward 10.0.0.2, and nobody listening.
//! iface.receive("10.0.0.2".parse().unwrap(), &[0xc0], Instant::from_millis(0), ());
//! iface.poll(Instant::from_millis(1));
//! ```
//!
//! [`layer`]: ../layer/index.html
//! [`Interface`]: struct.Interface.html
use crate::config::Config;
use crate::layer::{ip, slip, tcp, Result};
use crate::nic::Device;
use crate::time::{Expiration, Instant};
use crate::wire::{IpProtocol, Ipv4Address};

/// The lines, the ip endpoint and the tcp server of one node.
pub struct Interface<D> {
    link: slip::Multiplexer<D>,
    ip: ip::Endpoint,
    tcp: tcp::Server,
}

impl<D: Device> Interface<D> {
    /// Assemble a node from its lines and configuration.
    ///
    /// The checksum validation of the configuration replaces that of the multiplexer.
    pub fn new(mut link: slip::Multiplexer<D>, config: &Config) -> Self {
        link.set_checksum(config.checksum);
        let mut ip = ip::Endpoint::new(config.routing_table());
        if let Some(addr) = config.local_addr {
            ip.set_local_addr(addr);
        }

        Interface {
            link,
            ip,
            tcp: tcp::Server::new(config.port, config.tcp),
        }
    }

    /// Assemble a node with a given tcp server.
    pub fn with_server(link: slip::Multiplexer<D>, ip: ip::Endpoint, tcp: tcp::Server) -> Self {
        Interface { link, ip, tcp }
    }

    /// Process bytes read from the line toward `peer`.
    pub fn receive<A>(&mut self, peer: Ipv4Address, chunk: &[u8], time: Instant, app: A)
        where A: tcp::Accept + tcp::Recv,
    {
        let Interface { link, ip, tcp } = self;
        link.receive(peer, chunk, ip.recv(tcp.recv(app, time)));
    }

    /// Retransmit on all connections whose timer expired.
    pub fn poll(&mut self, time: Instant) {
        let handle = ip::Handle::new(&self.ip, self.link.handle());
        self.tcp.poll(handle, time);
    }

    /// When `poll` needs to be called next.
    pub fn next_deadline(&self) -> Expiration {
        self.tcp.next_deadline()
    }

    /// A socket of a connection, to send or close outside of callbacks.
    pub fn socket(&mut self, id: tcp::FourTuple, time: Instant) -> Option<tcp::Socket<'_>> {
        let handle = ip::Handle::new(&self.ip, self.link.handle());
        self.tcp.socket(id, handle, time)
    }

    /// Send a datagram originating at this node.
    pub fn send_datagram(&mut self, payload: &[u8], dst_addr: Ipv4Address, protocol: IpProtocol)
        -> Result<slip::Delivery>
    {
        self.ip.send(self.link.handle(), payload, dst_addr, protocol)
    }
}

impl<D> Interface<D> {
    /// The ip endpoint.
    pub fn ip(&self) -> &ip::Endpoint {
        &self.ip
    }

    /// The ip endpoint, to change address or routes.
    pub fn ip_mut(&mut self) -> &mut ip::Endpoint {
        &mut self.ip
    }

    /// The tcp server.
    pub fn server(&self) -> &tcp::Server {
        &self.tcp
    }

    /// The tcp server, to manage its connections.
    pub fn server_mut(&mut self) -> &mut tcp::Server {
        &mut self.tcp
    }

    /// The lines.
    pub fn lines(&self) -> &slip::Lines<D> {
        self.link.lines()
    }

    /// The lines, to add or remove devices.
    pub fn lines_mut(&mut self) -> &mut slip::Lines<D> {
        self.link.lines_mut()
    }

    /// The multiplexer, to add or remove lines along with their decoders.
    pub fn link_mut(&mut self) -> &mut slip::Multiplexer<D> {
        &mut self.link
    }
}
