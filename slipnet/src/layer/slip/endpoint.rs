use std::collections::HashMap;
use std::iter::FromIterator;

use crate::layer::{Error, Result};
use crate::nic::Device;
use crate::wire::{slip, Checksum, Ipv4Address};

use super::{Decoder, Recv};
use super::packet::{Delivery, Handle, In, Transmit};

/// The outgoing half of all lines, keyed by the peer address.
#[derive(Debug)]
pub struct Lines<D> {
    devices: HashMap<Ipv4Address, D>,

    /// Reused buffer for encoding.
    scratch: Vec<u8>,
}

/// All lines of a node, with their decoders.
///
/// Owns the policy for incoming checksums which all layers above consult through the frame
/// handle.
#[derive(Debug)]
pub struct Multiplexer<D> {
    decoders: HashMap<Ipv4Address, Decoder>,
    lines: Lines<D>,
    checksum: Checksum,
}

impl<D> Lines<D> {
    /// Create an empty set of lines.
    pub fn new() -> Self {
        Lines {
            devices: HashMap::new(),
            scratch: Vec::new(),
        }
    }

    /// Add or replace the device leading to `peer`.
    pub fn insert(&mut self, peer: Ipv4Address, device: D) -> Option<D> {
        self.devices.insert(peer, device)
    }

    /// Remove the device leading to `peer`.
    pub fn remove(&mut self, peer: Ipv4Address) -> Option<D> {
        self.devices.remove(&peer)
    }

    /// Get the device leading to `peer`.
    pub fn get(&self, peer: Ipv4Address) -> Option<&D> {
        self.devices.get(&peer)
    }

    /// Get the device leading to `peer` mutably.
    pub fn get_mut(&mut self, peer: Ipv4Address) -> Option<&mut D> {
        self.devices.get_mut(&peer)
    }

    /// Iterate over all peers with a line.
    pub fn peers(&self) -> impl Iterator<Item=Ipv4Address> + '_ {
        self.devices.keys().cloned()
    }

    /// The number of lines.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Query if there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<D> Default for Lines<D> {
    fn default() -> Self {
        Lines::new()
    }
}

impl<D> FromIterator<(Ipv4Address, D)> for Lines<D> {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item=(Ipv4Address, D)>
    {
        Lines {
            devices: iter.into_iter().collect(),
            scratch: Vec::new(),
        }
    }
}

impl<D: Device> Transmit for Lines<D> {
    fn transmit(&mut self, datagram: &[u8], next_hop: Ipv4Address) -> Result<Delivery> {
        let device = match self.devices.get_mut(&next_hop) {
            Some(device) => device,
            None => {
                net_debug!("slip: no line toward {}, dropping {} bytes", next_hop, datagram.len());
                return Ok(Delivery::Unreachable);
            },
        };

        self.scratch.clear();
        slip::encode(datagram, &mut self.scratch);

        match device.send(&self.scratch) {
            Ok(()) => {
                net_trace!("slip: sent {} bytes to {}", datagram.len(), next_hop);
                Ok(Delivery::Sent)
            },
            Err(err) => {
                net_debug!("slip: line toward {} failed: {}", next_hop, err);
                Err(Error::Device)
            },
        }
    }
}

impl<D> Multiplexer<D> {
    /// Create a multiplexer without any lines.
    pub fn new(checksum: Checksum) -> Self {
        Multiplexer {
            decoders: HashMap::new(),
            lines: Lines::new(),
            checksum,
        }
    }

    /// Add a line to a peer.
    ///
    /// Replacing an existing line also restarts its decoder, discarding a partial frame.
    pub fn add_line(&mut self, peer: Ipv4Address, device: D) -> Option<D> {
        self.decoders.insert(peer, Decoder::new());
        self.lines.insert(peer, device)
    }

    /// Remove the line to a peer.
    pub fn remove_line(&mut self, peer: Ipv4Address) -> Option<D> {
        self.decoders.remove(&peer);
        self.lines.remove(peer)
    }

    /// The checksum policy for incoming packets.
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Change the checksum policy for incoming packets.
    pub fn set_checksum(&mut self, checksum: Checksum) {
        self.checksum = checksum;
    }

    /// The outgoing lines.
    pub fn lines(&self) -> &Lines<D> {
        &self.lines
    }

    /// The outgoing lines, mutably.
    pub fn lines_mut(&mut self) -> &mut Lines<D> {
        &mut self.lines
    }
}

impl<D: Device> Multiplexer<D> {
    /// Process bytes read from the line to `peer`.
    ///
    /// Every completed frame is handed to `handler`. Bytes from a peer without a line are
    /// dropped.
    pub fn receive<H: Recv>(&mut self, peer: Ipv4Address, chunk: &[u8], mut handler: H) {
        let Multiplexer { decoders, lines, checksum } = self;
        let checksum = *checksum;

        let decoder = match decoders.get_mut(&peer) {
            Some(decoder) => decoder,
            None => {
                net_debug!("slip: {} bytes from unknown peer {}", chunk.len(), peer);
                return;
            },
        };

        decoder.feed(chunk, |frame| handler.receive(In {
            peer,
            handle: Handle::new(&mut *lines, checksum),
            frame,
        }));
    }

    /// A handle for sending datagrams that do not answer any received frame.
    pub fn handle(&mut self) -> Handle<'_> {
        Handle::new(&mut self.lines, self.checksum)
    }
}

impl<D> Default for Multiplexer<D> {
    fn default() -> Self {
        Multiplexer::new(Checksum::default())
    }
}

impl<D> FromIterator<(Ipv4Address, D)> for Multiplexer<D> {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item=(Ipv4Address, D)>
    {
        let mut multiplexer = Multiplexer::default();
        for (peer, device) in iter {
            multiplexer.add_line(peer, device);
        }
        multiplexer
    }
}
