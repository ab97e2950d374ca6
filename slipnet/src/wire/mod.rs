/*! Low-level packet access and construction.

# An overview over packet representations

The `wire` module deals with the packet *representation*. It provides two levels of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in the lowercase byte wrappers e.g. [`ipv4_packet`] or
   [`tcp_packet`].
 * Second, it provides a compact, high-level representation of header data that can be created
   from parsing and emitted into a sequence of octets. This happens through the `Repr` family of
   structs and enums, e.g. [`Ipv4Repr`] or [`TcpRepr`].

[`ipv4_packet`]: struct.ipv4_packet.html
[`tcp_packet`]: struct.tcp_packet.html
[`Ipv4Repr`]: struct.Ipv4Repr.html
[`TcpRepr`]: struct.TcpRepr.html

The byte wrappers guarantee that, if `check_len()` returned `Ok(())`, then no field accessor or
setter method will panic; however, the guarantee only holds while the length fields are not
mutated. The `new_checked` constructors combine the conversion with that check and must be used
for untrusted input.

In the `Repr` family of data structures, the `Repr::parse()` method never panics and the
`Repr::emit()` method never panics as long as the underlying buffer is exactly
`Repr::buffer_len()` octets long.

Framing on the serial line is not a header but a byte stuffing scheme. It lives in [`slip`] and
has only the encoding direction here, the stateful decoder belongs to the link layer.

[`slip`]: slip/index.html

# Examples

To emit an IP packet header into an octet buffer, and then parse it back:

```rust
use slipnet::wire::*;
let repr = Ipv4Repr {
    src_addr:    Ipv4Address::new(10, 0, 0, 1),
    dst_addr:    Ipv4Address::new(10, 0, 0, 2),
    protocol:    IpProtocol::Tcp,
    payload_len: 10,
    hop_limit:   64
};
let mut buffer = vec![0; repr.buffer_len() + repr.payload_len];
{ // emission
    let packet = ipv4_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet);
}
{ // parsing
    let packet = ipv4_packet::new_checked(&buffer)
        .expect("truncated packet");
    let parsed = Ipv4Repr::parse(packet, Checksum::Manual)
        .expect("malformed packet");
    assert_eq!(repr, parsed);
}
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//
// Applies to files in this folder unless otherwise noted. These are:
// * `error.rs`
// * `icmpv4.rs`
// * `ip.rs`
// * `ipv4.rs`
// * `mod.rs` (this file)
// * `tcp.rs`

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
}

mod error;
pub mod icmpv4;
pub mod ip;
/// Internet protocol version 4 headers and addresses.
pub mod ipv4;
pub mod slip;
/// Transmission control protocol segments and sequence numbers.
pub mod tcp;

pub use self::error::{Error, Result};

/// Describes how to handle checksums of received packets.
///
/// Outgoing packets always carry a correct checksum, this only controls validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// Checksum must be checked.
    Manual,

    /// The checksum field is not inspected.
    ///
    /// Useful for a line whose peer is known to emit bogus checksums, or for fuzzing.
    Ignored,
}

impl Checksum {
    /// Query if received checksums must be validated.
    pub fn manual(self) -> bool {
        self == Checksum::Manual
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::Manual
    }
}

pub use self::ip::Protocol as IpProtocol;

pub use self::ipv4::{
    Address as Ipv4Address,
    Cidr as Ipv4Cidr,
    Subnet as Ipv4Subnet,
    ipv4 as ipv4_packet,
    Repr as Ipv4Repr,
};

pub use self::icmpv4::{
    Message as Icmpv4Message,
    TimeExceeded as Icmpv4TimeExceeded,
    icmpv4 as icmpv4_packet,
    Repr as Icmpv4Repr,
};

pub use self::tcp::{
    Flags as TcpFlags,
    SeqNumber as TcpSeqNumber,
    tcp as tcp_packet,
    Repr as TcpRepr,
};
