//! Configuration of a whole stack.
//!
//! Collects the parameters that [`Interface::new`] distributes to the layers. Text forms of the
//! routing entries parse with `FromStr`, so a configuration can be assembled from command line
//! arguments or a simple file:
//!
//! ```rust
//! use slipnet::config::Config;
//!
//! let config = Config::new()
//!     .local_addr("10.0.0.1".parse().unwrap())
//!     .route("10.0.0.2/32=10.0.0.2".parse().unwrap())
//!     .route("0.0.0.0/0=10.0.0.2".parse().unwrap())
//!     .port(7);
//!
//! assert_eq!(config.routes.len(), 2);
//! ```
//!
//! [`Interface::new`]: ../iface/struct.Interface.html#method.new
use crate::layer::{ip, tcp};
use crate::wire::{Checksum, Ipv4Address};

pub use crate::layer::ip::ParseRouteError;

/// Parameters of a stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The address of this host, if it is one.
    ///
    /// Without it, the node only forwards.
    pub local_addr: Option<Ipv4Address>,

    /// The routing table, in order.
    pub routes: Vec<ip::Route>,

    /// The port of the tcp server.
    pub port: u16,

    /// Validation of received checksums.
    pub checksum: Checksum,

    /// Parameters of tcp connections.
    pub tcp: tcp::Config,
}

impl Config {
    /// A default configuration.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the local address.
    pub fn local_addr(mut self, addr: Ipv4Address) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Append a route.
    ///
    /// Routes are kept in order, which decides ties between routes of equal prefix length.
    pub fn route(mut self, route: ip::Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Set the listening port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the checksum validation.
    pub fn checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the tcp parameters.
    pub fn tcp(mut self, tcp: tcp::Config) -> Self {
        self.tcp = tcp;
        self
    }

    /// Parse and append routes of the form `network/prefix=next_hop`.
    pub fn parse_routes<'a, I>(mut self, routes: I) -> Result<Self, ParseRouteError>
        where I: IntoIterator<Item=&'a str>
    {
        for route in routes {
            self.routes.push(route.parse()?);
        }
        Ok(self)
    }

    /// The routing table.
    pub fn routing_table(&self) -> ip::Routes {
        self.routes.iter().cloned().collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            local_addr: None,
            routes: Vec::new(),
            port: 80,
            checksum: Checksum::Manual,
            tcp: tcp::Config::default(),
        }
    }
}
