use super::*;
use crate::layer::slip::{self, Decoder, Delivery, Multiplexer};
use crate::nic::Capture;
use crate::wire::{slip as framing, ip::checksum, Checksum, IpProtocol};
use crate::wire::{icmpv4_packet, ipv4_packet, Icmpv4Message, Ipv4Address, Ipv4Cidr, Ipv4Repr};

const LOCAL: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
const PEER_A: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);
const PEER_B: Ipv4Address = Ipv4Address::new(10, 0, 0, 3);
const FAR_A: Ipv4Address = Ipv4Address::new(172, 16, 5, 5);
const FAR_B: Ipv4Address = Ipv4Address::new(192, 168, 7, 7);
const NOWHERE: Ipv4Address = Ipv4Address::new(8, 8, 8, 8);

static PAYLOAD_BYTES: [u8; 12] =
    [0xaa, 0x00, 0x00, 0x00,
     0x11, 0x22, 0x33, 0x44,
     0x55, 0x66, 0x77, 0xff];

fn routes() -> Routes {
    vec![
        Route::new(Ipv4Cidr::new(PEER_A, 32), PEER_A),
        Route::new(Ipv4Cidr::new(PEER_B, 32), PEER_B),
        Route::new(Ipv4Cidr::new(FAR_A, 12), PEER_A),
        Route::new(Ipv4Cidr::new(FAR_B, 16), PEER_B),
    ].into_iter().collect()
}

fn endpoint() -> Endpoint {
    let mut ip = Endpoint::new(routes());
    ip.set_local_addr(LOCAL);
    ip
}

fn lines(checksum: Checksum) -> Multiplexer<Capture> {
    let mut mux = Multiplexer::new(checksum);
    mux.add_line(PEER_A, Capture::new());
    mux.add_line(PEER_B, Capture::new());
    mux
}

fn datagram(src_addr: Ipv4Address, dst_addr: Ipv4Address, protocol: IpProtocol, hop_limit: u8)
    -> Vec<u8>
{
    let repr = Ipv4Repr {
        src_addr,
        dst_addr,
        protocol,
        payload_len: PAYLOAD_BYTES.len(),
        hop_limit,
    };
    let mut buffer = vec![0; repr.buffer_len() + PAYLOAD_BYTES.len()];
    repr.emit(ipv4_packet::new_unchecked_mut(&mut buffer));
    buffer[repr.buffer_len()..].copy_from_slice(&PAYLOAD_BYTES);
    buffer
}

fn framed(datagram: &[u8]) -> Vec<u8> {
    let mut line = vec![];
    framing::encode(datagram, &mut line);
    line
}

/// Decode everything written to the line toward `peer`.
fn sent_to(mux: &mut Multiplexer<Capture>, peer: Ipv4Address) -> Vec<Vec<u8>> {
    let mut decoder = Decoder::new();
    let mut frames = vec![];
    let capture = mux.lines_mut().get_mut(peer).unwrap();
    for raw in capture.take() {
        decoder.feed(&raw, |frame| {
            frames.push(frame.to_vec());
            Ok(())
        });
    }
    frames
}

#[derive(Default)]
struct Collect {
    packets: Vec<(Ipv4Address, Vec<u8>)>,
}

impl Recv for Collect {
    fn receive(&mut self, packet: InPacket) {
        self.packets.push((packet.src_addr(), packet.payload.to_vec()));
    }
}

#[test]
fn deliver_local_tcp() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);
    let mut collect = Collect::default();

    let bytes = datagram(FAR_A, LOCAL, IpProtocol::Tcp, 3);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(&mut collect));

    assert_eq!(collect.packets, vec![(FAR_A, PAYLOAD_BYTES.to_vec())]);
    assert!(sent_to(&mut mux, PEER_A).is_empty());
    assert!(sent_to(&mut mux, PEER_B).is_empty());
}

#[test]
fn local_non_tcp_dropped() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);
    let mut collect = Collect::default();

    let icmp = datagram(FAR_A, LOCAL, IpProtocol::Icmp, 3);
    mux.receive(PEER_A, &framed(&icmp), ip.recv(&mut collect));
    let udp = datagram(FAR_A, LOCAL, IpProtocol::Udp, 3);
    mux.receive(PEER_A, &framed(&udp), ip.recv(&mut collect));

    assert!(collect.packets.is_empty());
}

#[test]
fn forward_decrements_ttl() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);
    let mut collect = Collect::default();

    let bytes = datagram(FAR_A, FAR_B, IpProtocol::Tcp, 5);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(&mut collect));

    assert!(collect.packets.is_empty());
    assert!(sent_to(&mut mux, PEER_A).is_empty());
    let out = sent_to(&mut mux, PEER_B);
    assert_eq!(out.len(), 1);

    let packet = ipv4_packet::new_checked(&out[0]).unwrap();
    assert_eq!(packet.hop_limit(), 4);
    assert!(packet.verify_checksum());
    assert_eq!(checksum::data(&out[0][..20]), !0);
    assert_eq!(packet.src_addr(), FAR_A);
    assert_eq!(packet.dst_addr(), FAR_B);
    assert_eq!(packet.payload_slice(), &PAYLOAD_BYTES[..]);
}

#[test]
fn forward_without_route_dropped() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let bytes = datagram(FAR_A, NOWHERE, IpProtocol::Tcp, 5);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(Collect::default()));

    assert!(sent_to(&mut mux, PEER_A).is_empty());
    assert!(sent_to(&mut mux, PEER_B).is_empty());
}

#[test]
fn ttl_exceeded_notifies_source() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let bytes = datagram(FAR_A, FAR_B, IpProtocol::Tcp, 1);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(Collect::default()));

    // Nothing continues toward the destination.
    assert!(sent_to(&mut mux, PEER_B).is_empty());
    let out = sent_to(&mut mux, PEER_A);
    assert_eq!(out.len(), 1);

    let packet = ipv4_packet::new_checked(&out[0]).unwrap();
    let repr = Ipv4Repr::parse(packet, Checksum::Manual).unwrap();
    assert_eq!(repr.src_addr, LOCAL);
    assert_eq!(repr.dst_addr, FAR_A);
    assert_eq!(repr.protocol, IpProtocol::Icmp);
    assert_eq!(repr.hop_limit, 64);

    let icmp = icmpv4_packet::new_checked(packet.payload_slice()).unwrap();
    assert_eq!(icmp.msg_type(), Icmpv4Message::TimeExceeded);
    assert_eq!(icmp.msg_code(), 0);
    assert!(icmp.verify_checksum());
    assert_eq!(icmp.payload_slice(), &bytes[..28]);
}

#[test]
fn ttl_zero_also_exceeded() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let bytes = datagram(FAR_A, FAR_B, IpProtocol::Tcp, 0);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(Collect::default()));

    assert!(sent_to(&mut mux, PEER_B).is_empty());
    assert_eq!(sent_to(&mut mux, PEER_A).len(), 1);
}

#[test]
fn ttl_exceeded_without_return_route() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let bytes = datagram(NOWHERE, FAR_B, IpProtocol::Tcp, 1);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(Collect::default()));

    assert!(sent_to(&mut mux, PEER_A).is_empty());
    assert!(sent_to(&mut mux, PEER_B).is_empty());
}

#[test]
fn bad_checksum() {
    let ip = endpoint();
    let mut bytes = datagram(FAR_A, LOCAL, IpProtocol::Tcp, 3);
    ipv4_packet::new_unchecked_mut(&mut bytes).set_checksum(0xbeef);

    let mut mux = lines(Checksum::Manual);
    let mut collect = Collect::default();
    mux.receive(PEER_A, &framed(&bytes), ip.recv(&mut collect));
    assert!(collect.packets.is_empty());

    let mut mux = lines(Checksum::Ignored);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(&mut collect));
    assert_eq!(collect.packets.len(), 1);
}

#[test]
fn garbage_rejected() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Ignored);
    let mut collect = Collect::default();

    mux.receive(PEER_A, &framed(&[0x45, 0x00, 0x00]), ip.recv(&mut collect));
    let mut v6 = datagram(FAR_A, LOCAL, IpProtocol::Tcp, 3);
    v6[0] = 0x65;
    mux.receive(PEER_A, &framed(&v6), ip.recv(&mut collect));
    // A valid datagram after the garbage still gets through.
    let good = datagram(FAR_A, LOCAL, IpProtocol::Tcp, 3);
    mux.receive(PEER_A, &framed(&good), ip.recv(&mut collect));

    assert_eq!(collect.packets.len(), 1);
}

#[test]
fn send_local() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let delivery = ip.send(mux.handle(), &PAYLOAD_BYTES, FAR_B, IpProtocol::Tcp);
    assert_eq!(delivery, Ok(Delivery::Sent));

    let out = sent_to(&mut mux, PEER_B);
    assert_eq!(out, vec![datagram(LOCAL, FAR_B, IpProtocol::Tcp, 64)]);
}

#[test]
fn send_without_route() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let delivery = ip.send(mux.handle(), &PAYLOAD_BYTES, NOWHERE, IpProtocol::Tcp);
    assert_eq!(delivery, Ok(Delivery::Unreachable));
    assert!(sent_to(&mut mux, PEER_A).is_empty());
    assert!(sent_to(&mut mux, PEER_B).is_empty());
}

#[test]
fn send_too_large() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);
    let payload = vec![0; 70_000];
    let delivery = ip.send(mux.handle(), &payload, FAR_B, IpProtocol::Tcp);
    assert_eq!(delivery, Err(crate::layer::Error::BadSize));
}

#[test]
fn send_unconfigured_source() {
    let ip = Endpoint::new(routes());
    let mut mux = lines(Checksum::Manual);

    ip.send(mux.handle(), &PAYLOAD_BYTES, FAR_A, IpProtocol::Tcp).unwrap();
    let out = sent_to(&mut mux, PEER_A);
    let packet = ipv4_packet::new_checked(&out[0]).unwrap();
    assert_eq!(packet.src_addr(), Ipv4Address::UNSPECIFIED);
}

#[test]
fn route_to_missing_line() {
    let mut ip = endpoint();
    let lonely = Ipv4Address::new(10, 0, 0, 9);
    ip.set_routes(vec![Route::new_gateway(lonely)].into());
    let mut mux = lines(Checksum::Manual);

    let delivery = ip.send(mux.handle(), &PAYLOAD_BYTES, FAR_B, IpProtocol::Tcp);
    assert_eq!(delivery, Ok(Delivery::Unreachable));
}

#[test]
fn swap_routes() {
    let mut ip = endpoint();
    let old = ip.set_routes(Routes::new());
    assert_eq!(old, routes());
    assert!(ip.routes().is_empty());

    let mut mux = lines(Checksum::Manual);
    let bytes = datagram(FAR_A, FAR_B, IpProtocol::Tcp, 5);
    mux.receive(PEER_A, &framed(&bytes), ip.recv(Collect::default()));
    assert!(sent_to(&mut mux, PEER_B).is_empty());
}

#[test]
fn answer_through_handle() {
    let ip = endpoint();
    let mut mux = lines(Checksum::Manual);

    let bytes = datagram(FAR_A, LOCAL, IpProtocol::Tcp, 3);
    mux.receive(PEER_A, &framed(&bytes), ip.recv_with(|mut packet: InPacket| {
        let src = packet.src_addr();
        assert_eq!(packet.handle.local_addr(), Some(LOCAL));
        assert_eq!(packet.handle.checksum(), Checksum::Manual);
        let answer = packet.payload.to_vec();
        assert_eq!(packet.handle.send(&answer, src, IpProtocol::Tcp), Ok(slip::Delivery::Sent));
    }));

    let out = sent_to(&mut mux, PEER_A);
    assert_eq!(out, vec![datagram(LOCAL, FAR_A, IpProtocol::Tcp, 64)]);
}
