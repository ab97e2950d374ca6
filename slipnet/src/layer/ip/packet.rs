use crate::layer::{slip, Result};
use crate::wire::{Checksum, IpProtocol, Ipv4Address, Ipv4Repr};

use super::Endpoint;

/// A handle to send datagrams, passed along with incoming packets.
pub struct Handle<'a> {
    endpoint: &'a Endpoint,
    link: slip::Handle<'a>,
}

/// An incoming datagram for this host.
pub struct In<'a> {
    /// A handle to answer.
    pub handle: Handle<'a>,

    /// The parsed header.
    pub repr: Ipv4Repr,

    /// The payload, without trailing octets beyond the total length.
    pub payload: &'a [u8],
}

impl<'a> Handle<'a> {
    /// Combine the endpoint with a handle to the lines.
    pub fn new(endpoint: &'a Endpoint, link: slip::Handle<'a>) -> Self {
        Handle { endpoint, link }
    }

    /// Reborrow the handle with a shorter lifetime.
    pub fn borrow_mut(&mut self) -> Handle<'_> {
        Handle {
            endpoint: self.endpoint,
            link: self.link.borrow_mut(),
        }
    }

    /// The configured local address.
    pub fn local_addr(&self) -> Option<Ipv4Address> {
        self.endpoint.local_addr()
    }

    /// Whether incoming checksums need to be validated.
    pub fn checksum(&self) -> Checksum {
        self.link.checksum()
    }

    /// Send a locally originated datagram.
    pub fn send(&mut self, payload: &[u8], dst_addr: Ipv4Address, protocol: IpProtocol)
        -> Result<slip::Delivery>
    {
        self.endpoint.send(self.link.borrow_mut(), payload, dst_addr, protocol)
    }
}

impl In<'_> {
    /// The source of the datagram.
    pub fn src_addr(&self) -> Ipv4Address {
        self.repr.src_addr
    }

    /// The destination of the datagram, the local address.
    pub fn dst_addr(&self) -> Ipv4Address {
        self.repr.dst_addr
    }
}
