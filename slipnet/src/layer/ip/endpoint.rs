use core::mem;

use crate::layer::{icmp, slip, Error, FnHandler, Result};
use crate::wire::{ipv4, ipv4_packet, IpProtocol, Ipv4Address, Ipv4Repr};

use super::Recv;
use super::packet::{Handle, In};
use super::route::Routes;

/// The largest payload of a single datagram.
const MAX_PAYLOAD: usize = u16::max_value() as usize - ipv4::HEADER_LEN;

/// The ip configuration of a node.
#[derive(Debug, Default)]
pub struct Endpoint {
    /// Our own address.
    ///
    /// Datagrams to any other destination are forwarded.
    addr: Option<Ipv4Address>,

    /// Routing information.
    routes: Routes,
}

/// An endpoint borrowed for receiving.
///
/// Dispatching to higher protocols is configured here, and not in the endpoint state.
pub struct Receiver<'a, H> {
    endpoint: &'a Endpoint,

    /// The upper protocol receiver.
    handler: H,
}

impl Endpoint {
    /// Create an endpoint without local address, forwarding with the given routes.
    pub fn new(routes: Routes) -> Self {
        Endpoint {
            addr: None,
            routes,
        }
    }

    /// Set the address of this host.
    pub fn set_local_addr(&mut self, addr: Ipv4Address) {
        self.addr = Some(addr);
    }

    /// The address of this host, if configured.
    pub fn local_addr(&self) -> Option<Ipv4Address> {
        self.addr
    }

    /// Install a new routing table, returning the previous one.
    pub fn set_routes(&mut self, routes: Routes) -> Routes {
        mem::replace(&mut self.routes, routes)
    }

    /// The current routing table.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Borrow the endpoint as a frame receiver.
    pub fn recv<H>(&self, handler: H) -> Receiver<'_, H> {
        Receiver { endpoint: self, handler, }
    }

    /// Borrow the endpoint as a frame receiver, handing datagrams to a closure.
    pub fn recv_with<H>(&self, handler: H) -> Receiver<'_, FnHandler<H>> {
        self.recv(FnHandler(handler))
    }

    /// Send a locally originated datagram.
    ///
    /// A destination without route is not an error, the datagram is dropped and the result is
    /// `Delivery::Unreachable`.
    pub fn send(
        &self,
        mut link: slip::Handle,
        payload: &[u8],
        dst_addr: Ipv4Address,
        protocol: IpProtocol,
    ) -> Result<slip::Delivery> {
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::BadSize);
        }

        let next_hop = match self.routes.lookup(dst_addr) {
            Some(next_hop) => next_hop,
            None => {
                net_debug!("ip: no route to {}, dropping {} datagram", dst_addr, protocol);
                return Ok(slip::Delivery::Unreachable);
            },
        };

        let repr = Ipv4Repr {
            src_addr: self.addr.unwrap_or(Ipv4Address::UNSPECIFIED),
            dst_addr,
            protocol,
            payload_len: payload.len(),
            hop_limit: ipv4::DEFAULT_HOP_LIMIT,
        };

        let header_len = repr.buffer_len();
        let mut datagram = vec![0; header_len + payload.len()];
        repr.emit(ipv4_packet::new_unchecked_mut(&mut datagram));
        datagram[header_len..].copy_from_slice(payload);

        net_trace!("ip: send {} via {}", repr, next_hop);
        link.transmit(&datagram, next_hop)
    }

    fn accepts(&self, dst_addr: Ipv4Address) -> bool {
        self.addr == Some(dst_addr)
    }

    /// Pass on a datagram that is not for us.
    fn forward(&self, mut link: slip::Handle, packet: &ipv4_packet, repr: Ipv4Repr)
        -> Result<()>
    {
        let hop_limit = repr.hop_limit.saturating_sub(1);

        if hop_limit == 0 {
            // Only answer if the answer can be delivered.
            if self.routes.lookup(repr.src_addr).is_none() {
                net_debug!("ip: ttl exceeded for {}, no route back to {}", repr.dst_addr, repr.src_addr);
                return Ok(());
            }

            net_debug!("ip: ttl exceeded for {}, notifying {}", repr.dst_addr, repr.src_addr);
            let message = icmp::time_exceeded(packet);
            self.send(link, &message, repr.src_addr, IpProtocol::Icmp)?;
            return Ok(());
        }

        let next_hop = match self.routes.lookup(repr.dst_addr) {
            Some(next_hop) => next_hop,
            None => {
                net_debug!("ip: no route to {}, dropping", repr.dst_addr);
                return Ok(());
            },
        };

        let mut datagram = packet.datagram().to_vec();
        {
            let packet = ipv4_packet::new_unchecked_mut(&mut datagram);
            packet.set_hop_limit(hop_limit);
            packet.fill_checksum();
        }

        net_trace!("ip: forward {} via {}", repr, next_hop);
        link.transmit(&datagram, next_hop)?;
        Ok(())
    }
}

impl<H: Recv> slip::Recv for Receiver<'_, H> {
    fn receive(&mut self, frame: slip::InFrame) -> Result<()> {
        let slip::InFrame { peer, mut handle, frame } = frame;
        let packet = ipv4_packet::new_checked(frame)?;
        let repr = Ipv4Repr::parse(packet, handle.checksum())?;
        net_trace!("ip: from {} got {}", peer, repr);

        if !self.endpoint.accepts(repr.dst_addr) {
            return self.endpoint.forward(handle, packet, repr);
        }

        if packet.more_frags() || packet.frag_offset() != 0 {
            net_debug!("ip: dropping fragment from {}", repr.src_addr);
            return Ok(());
        }

        if repr.protocol != IpProtocol::Tcp {
            net_debug!("ip: dropping {} datagram from {}", repr.protocol, repr.src_addr);
            return Ok(());
        }

        let handle = Handle::new(self.endpoint, handle.borrow_mut());
        self.handler.receive(In {
            handle,
            repr,
            payload: packet.payload_slice(),
        });
        Ok(())
    }
}
