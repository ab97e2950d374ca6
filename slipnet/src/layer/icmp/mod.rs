//! The ICMP layer.
//!
//! A router only ever originates one kind of message: time exceeded, when the time to live of a
//! forwarded datagram runs out. Incoming ICMP is not processed by this host.
use crate::wire::{icmpv4, ipv4_packet, Icmpv4Repr, Icmpv4TimeExceeded, icmpv4_packet};

/// Build a time exceeded message about a discarded datagram.
///
/// The message quotes the header of the datagram and the first eight octets of its payload, or
/// less if the datagram is shorter. The result is the payload of a new datagram with protocol
/// ICMP, addressed to the source of the original.
pub fn time_exceeded(original: &ipv4_packet) -> Vec<u8> {
    let datagram = original.datagram();
    let quote_len = datagram.len()
        .min(usize::from(original.header_len()) + icmpv4::QUOTED_PAYLOAD);
    let repr = Icmpv4Repr::TimeExceeded {
        reason: Icmpv4TimeExceeded::TtlExpired,
        quote_len,
    };

    let mut buffer = vec![0; repr.buffer_len()];
    let packet = icmpv4_packet::new_unchecked_mut(&mut buffer);
    packet.payload_mut_slice().copy_from_slice(&datagram[..quote_len]);
    repr.emit(packet);
    buffer
}
