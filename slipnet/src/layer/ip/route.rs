//! CIDR, relevant rfc1519, rfc4632.
//!
use core::fmt;
use core::str::FromStr;
use std::iter::FromIterator;

use crate::wire::{Ipv4Address, Ipv4Cidr, Ipv4Subnet};
use crate::wire::ipv4::ParseCidrError;

/// A prefix of addresses that should be routed via a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// The network routed through this route.
    pub net: Ipv4Subnet,

    /// Next hop for this network.
    ///
    /// This names the peer of a line, the datagram is written to that line.
    pub next_hop: Ipv4Address,
}

/// An immutable routing table.
///
/// # Examples
///
/// ```rust
/// use slipnet::layer::ip::{Route, Routes};
/// use slipnet::wire::Ipv4Address;
///
/// let routes: Routes = vec![
///     "10.0.0.0/8=10.0.0.1".parse::<Route>().unwrap(),
///     "0.0.0.0/0=10.0.0.2".parse::<Route>().unwrap(),
/// ].into_iter().collect();
///
/// assert_eq!(routes.lookup(Ipv4Address::new(10, 1, 1, 1)), Some(Ipv4Address::new(10, 0, 0, 1)));
/// assert_eq!(routes.lookup(Ipv4Address::new(1, 1, 1, 1)), Some(Ipv4Address::new(10, 0, 0, 2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routes {
    storage: Vec<Route>,
}

/// Error emitted when parsing a route of the form `network/prefix=next_hop` fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRouteError {
    kind: ParseRouteErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParseRouteErrorKind {
    NoNextHop,
    Network(ParseCidrError),
    NextHop,
}

impl Route {
    /// Route all addresses within `net` to the next hop.
    ///
    /// Host bits of the cidr address are cleared.
    pub fn new(net: Ipv4Cidr, next_hop: Ipv4Address) -> Self {
        Route {
            net: net.subnet(),
            next_hop,
        }
    }

    /// Returns a route match `0.0.0.0/0` via the `gateway`.
    ///
    /// This route is a worst match for all addresses so that it can be used as a sink, for
    /// example.
    pub fn new_gateway(gateway: Ipv4Address) -> Self {
        Route {
            net: Ipv4Subnet::ANY,
            next_hop: gateway,
        }
    }
}

impl Routes {
    /// Creates an empty routing table.
    pub fn new() -> Self {
        Routes::default()
    }

    /// Find the next hop toward an address.
    ///
    /// Among all routes containing the address the one with the longest prefix wins. Of several
    /// routes with equal prefix length the earliest in the table is chosen.
    pub fn lookup(&self, addr: Ipv4Address) -> Option<Ipv4Address> {
        // The rules say to find the subnet with longest prefix.
        let mut best_match = None;
        for route in self.storage.iter() {
            // Ignored routes with mismatching net.
            if !route.net.contains(addr) {
                continue;
            }

            let best = best_match.get_or_insert(route);
            // Prefer longest route, keep the first of equals.
            if best.net.prefix_len() < route.net.prefix_len() {
                *best = route;
            }
        }
        best_match.map(|route| route.next_hop)
    }

    /// Iterate over the routes in table order.
    pub fn iter(&self) -> impl Iterator<Item=&Route> + '_ {
        self.storage.iter()
    }

    /// The number of routes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Query if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl From<Vec<Route>> for Routes {
    fn from(storage: Vec<Route>) -> Self {
        Routes { storage }
    }
}

impl FromIterator<Route> for Routes {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item=Route>
    {
        Routes { storage: iter.into_iter().collect() }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.net, self.next_hop)
    }
}

impl fmt::Display for ParseRouteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParseRouteErrorKind::NoNextHop => f.write_str("missing `=` before the next hop"),
            ParseRouteErrorKind::Network(err) => write!(f, "invalid network: {}", err),
            ParseRouteErrorKind::NextHop => f.write_str("invalid next hop address"),
        }
    }
}

impl std::error::Error for ParseRouteError { }

impl FromStr for Route {
    type Err = ParseRouteError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseRouteError> {
        let eq = src.find('=')
            .ok_or(ParseRouteError {
                kind: ParseRouteErrorKind::NoNextHop,
            })?;
        let net: Ipv4Cidr = src[..eq].trim()
            .parse()
            .map_err(|err| ParseRouteError {
                kind: ParseRouteErrorKind::Network(err),
            })?;
        let next_hop: Ipv4Address = src[eq+1..].trim()
            .parse()
            .map_err(|_| ParseRouteError {
                kind: ParseRouteErrorKind::NextHop,
            })?;
        Ok(Route::new(net, next_hop))
    }
}
