use super::*;
use crate::layer::ip::{self, Endpoint, Route};
use crate::layer::slip::{Decoder, Multiplexer};
use crate::nic::Capture;
use crate::time::{Duration, Expiration, Instant};
use crate::wire::{slip as framing, Checksum, IpProtocol, Ipv4Address, Ipv4Cidr, Ipv4Repr};
use crate::wire::{ipv4_packet, tcp_packet, TcpFlags, TcpRepr, TcpSeqNumber};

const LOCAL: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
const PEER: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);
const PORT: u16 = 80;
const PEER_PORT: u16 = 49152;
const CLIENT_ISN: TcpSeqNumber = TcpSeqNumber(1000);

const ID: FourTuple = FourTuple {
    local: LOCAL,
    local_port: PORT,
    remote: PEER,
    remote_port: PEER_PORT,
};

const SYN: u16 = TcpFlags::SYN;
const FIN: u16 = TcpFlags::FIN;

fn at(millis: i64) -> Instant {
    Instant::from_millis(millis)
}

fn small_segments() -> Config {
    Config {
        mss: 100,
        ..Config::default()
    }
}

/// One host with a single line toward the peer.
struct Net {
    mux: Multiplexer<Capture>,
    ip: Endpoint,
    tcp: Server,
}

#[derive(Default)]
struct App {
    accepted: Vec<FourTuple>,
    received: Vec<Vec<u8>>,
    echo: bool,
    close_on_fin: bool,
}

impl Accept for App {
    fn accept(&mut self, socket: &mut Socket) {
        assert_eq!(socket.state(), State::SynReceived);
        self.accepted.push(socket.id());
    }
}

impl Recv for App {
    fn receive(&mut self, socket: &mut Socket, data: &[u8]) {
        self.received.push(data.to_vec());
        if self.echo && !data.is_empty() {
            socket.send(data);
        }
        if self.close_on_fin && data.is_empty() {
            socket.close();
        }
    }
}

impl Net {
    fn new(checksum: Checksum, config: Config) -> Self {
        let mut mux = Multiplexer::new(checksum);
        mux.add_line(PEER, Capture::new());

        let mut ip = Endpoint::new(vec![
            Route::new(Ipv4Cidr::new(PEER, 32), PEER),
        ].into_iter().collect());
        ip.set_local_addr(LOCAL);

        let tcp = Server::with_isn_generator(PORT, config, IsnGenerator::from_key(1, 2));
        Net { mux, ip, tcp }
    }

    fn with_config(config: Config) -> Self {
        Net::new(Checksum::Manual, config)
    }

    /// Deliver an encoded segment from the peer.
    fn deliver(&mut self, app: &mut App, segment: &[u8], time: Instant) {
        let repr = Ipv4Repr {
            src_addr: PEER,
            dst_addr: LOCAL,
            protocol: IpProtocol::Tcp,
            payload_len: segment.len(),
            hop_limit: 64,
        };
        let mut datagram = vec![0; repr.buffer_len() + segment.len()];
        repr.emit(ipv4_packet::new_unchecked_mut(&mut datagram));
        datagram[repr.buffer_len()..].copy_from_slice(segment);

        let mut line = vec![];
        framing::encode(&datagram, &mut line);

        let Net { mux, ip, tcp } = self;
        mux.receive(PEER, &line, ip.recv(tcp.recv(app, time)));
    }

    /// Deliver a segment from the peer port to `port`.
    fn segment_to(
        &mut self,
        app: &mut App,
        port: u16,
        flags: u16,
        seq_number: TcpSeqNumber,
        ack_number: Option<TcpSeqNumber>,
        payload: &[u8],
        time: Instant,
    ) {
        let bytes = encode(port, flags, seq_number, ack_number, payload);
        self.deliver(app, &bytes, time);
    }

    fn segment(
        &mut self,
        app: &mut App,
        flags: u16,
        seq_number: TcpSeqNumber,
        ack_number: Option<TcpSeqNumber>,
        payload: &[u8],
        time: Instant,
    ) {
        self.segment_to(app, PORT, flags, seq_number, ack_number, payload, time)
    }

    /// All segments sent to the peer since the last call.
    fn sent(&mut self) -> Vec<(TcpRepr, Vec<u8>)> {
        let mut decoder = Decoder::new();
        let mut frames = vec![];
        let capture = self.mux.lines_mut().get_mut(PEER).unwrap();
        for raw in capture.take() {
            decoder.feed(&raw, |frame| {
                frames.push(frame.to_vec());
                Ok(())
            });
        }

        frames.iter().map(|frame| {
            let packet = ipv4_packet::new_checked(frame).unwrap();
            let ip_repr = Ipv4Repr::parse(packet, Checksum::Manual).unwrap();
            assert_eq!(ip_repr.src_addr, LOCAL);
            assert_eq!(ip_repr.dst_addr, PEER);
            assert_eq!(ip_repr.protocol, IpProtocol::Tcp);

            let segment = tcp_packet::new_checked(packet.payload_slice()).unwrap();
            assert!(segment.verify_checksum(LOCAL, PEER));
            let repr = TcpRepr::parse(segment).unwrap();
            assert_eq!(repr.src_port, PORT);
            assert_eq!(repr.dst_port, PEER_PORT);
            (repr, segment.payload_slice().to_vec())
        }).collect()
    }

    /// Complete a handshake, returning the sequence number of our SYN.
    fn handshake(&mut self, app: &mut App, time: Instant) -> TcpSeqNumber {
        self.segment(app, SYN, CLIENT_ISN, None, &[], time);
        let out = self.sent();
        assert_eq!(out.len(), 1);
        let isn = out[0].0.seq_number;

        self.segment(app, 0, CLIENT_ISN + 1, Some(isn + 1), &[], time);
        assert!(self.sent().is_empty());
        assert_eq!(self.connection().state(), State::Established);
        isn
    }

    fn connection(&self) -> &Connection {
        self.tcp.registry().get(ID).unwrap()
    }

    fn socket(&mut self, time: Instant) -> Socket<'_> {
        let handle = ip::Handle::new(&self.ip, self.mux.handle());
        self.tcp.socket(ID, handle, time).unwrap()
    }

    fn poll(&mut self, time: Instant) {
        let handle = ip::Handle::new(&self.ip, self.mux.handle());
        self.tcp.poll(handle, time)
    }
}

fn encode(
    dst_port: u16,
    flags: u16,
    seq_number: TcpSeqNumber,
    ack_number: Option<TcpSeqNumber>,
    payload: &[u8],
) -> Vec<u8> {
    let repr = TcpRepr {
        src_port: PEER_PORT,
        dst_port,
        flags: TcpFlags::from_bits(flags),
        seq_number,
        ack_number,
        window_len: 4096,
        payload_len: payload.len(),
    };
    let mut bytes = vec![0; repr.buffer_len()];
    bytes[repr.header_len()..].copy_from_slice(payload);
    repr.emit(tcp_packet::new_unchecked_mut(&mut bytes), PEER, LOCAL);
    bytes
}

#[test]
fn handshake() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    net.segment(&mut app, SYN, CLIENT_ISN, None, &[], at(0));
    let out = net.sent();
    assert_eq!(out.len(), 1);
    let (syn_ack, payload) = &out[0];
    assert_eq!(syn_ack.flags, TcpFlags::from_bits(TcpFlags::SYN | TcpFlags::ACK));
    assert_eq!(syn_ack.ack_number, Some(CLIENT_ISN + 1));
    assert_eq!(syn_ack.window_len, 1024);
    assert!(payload.is_empty());
    assert_eq!(app.accepted, vec![ID]);

    let isn = syn_ack.seq_number;
    let connection = net.connection();
    assert_eq!(connection.state(), State::SynReceived);
    assert_eq!(connection.isn(), isn);
    assert_eq!(connection.send_next(), isn + 1);
    assert_eq!(connection.recv_next(), CLIENT_ISN + 1);
    assert_eq!(connection.congestion_window(), 1460);
    assert_eq!(connection.timeout(), Duration::from_secs(1));

    // An acknowledgment of anything else does not complete the handshake.
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 2), &[], at(1));
    assert_eq!(net.connection().state(), State::SynReceived);

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), &[], at(2));
    assert_eq!(net.connection().state(), State::Established);
    assert!(net.sent().is_empty());
    assert!(app.received.is_empty());
}

#[test]
fn wrong_port_dropped() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    net.segment_to(&mut app, PORT + 1, SYN, CLIENT_ISN, None, &[], at(0));
    assert!(net.sent().is_empty());
    assert!(net.tcp.registry().is_empty());
    assert!(app.accepted.is_empty());
}

#[test]
fn bad_checksum() {
    let mut bytes = encode(PORT, SYN, CLIENT_ISN, None, &[]);
    bytes[16] ^= 0xff;

    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    net.deliver(&mut app, &bytes, at(0));
    assert!(net.sent().is_empty());
    assert!(net.tcp.registry().is_empty());

    let mut net = Net::new(Checksum::Ignored, Config::default());
    net.deliver(&mut app, &bytes, at(0));
    assert_eq!(net.sent().len(), 1);
    assert_eq!(net.tcp.registry().len(), 1);
}

#[test]
fn truncated_segment_dropped() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    let bytes = encode(PORT, SYN, CLIENT_ISN, None, &[]);
    net.deliver(&mut app, &bytes[..12], at(0));
    assert!(net.sent().is_empty());
    assert!(net.tcp.registry().is_empty());
}

#[test]
fn unknown_connection_dropped() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    net.segment(&mut app, 0, CLIENT_ISN, Some(TcpSeqNumber(5)), b"data", at(0));
    assert!(net.sent().is_empty());
    assert!(net.tcp.registry().is_empty());
    assert!(app.received.is_empty());
}

#[test]
fn deliver_in_order() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), b"hello", at(10));
    assert_eq!(app.received, vec![b"hello".to_vec()]);

    let out = net.sent();
    assert_eq!(out.len(), 1);
    let (ack, payload) = &out[0];
    assert_eq!(ack.flags, TcpFlags::from_bits(TcpFlags::ACK));
    assert_eq!(ack.seq_number, isn + 1);
    assert_eq!(ack.ack_number, Some(CLIENT_ISN + 1 + 5));
    assert!(payload.is_empty());

    // A retransmission by the peer is not delivered again.
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), b"hello", at(20));
    assert_eq!(app.received.len(), 1);
    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.ack_number, Some(CLIENT_ISN + 6));
}

#[test]
fn out_of_order_duplicate_ack() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, 0, CLIENT_ISN + 4, Some(isn + 1), b"later", at(10));
    assert!(app.received.is_empty());

    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.ack_number, Some(CLIENT_ISN + 1));
    assert_eq!(net.connection().recv_next(), CLIENT_ISN + 1);
}

#[test]
fn bare_ack_not_answered() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), &[], at(10));
    assert!(net.sent().is_empty());
}

#[test]
fn sequence_wraps() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let client_isn = TcpSeqNumber(0xffff_fffd);

    net.segment(&mut app, SYN, client_isn, None, &[], at(0));
    let isn = net.sent()[0].0.seq_number;
    net.segment(&mut app, 0, client_isn + 1, Some(isn + 1), &[], at(0));
    assert_eq!(net.connection().state(), State::Established);

    net.segment(&mut app, 0, client_isn + 1, Some(isn + 1), b"hello", at(10));
    assert_eq!(app.received, vec![b"hello".to_vec()]);
    let out = net.sent();
    assert_eq!(out[0].0.ack_number, Some(TcpSeqNumber(3)));
}

#[test]
fn peer_fin() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, FIN, CLIENT_ISN + 1, Some(isn + 1), b"bye", at(10));
    assert_eq!(app.received, vec![b"bye".to_vec(), vec![]]);
    assert_eq!(net.connection().state(), State::CloseWait);

    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.ack_number, Some(CLIENT_ISN + 1 + 3 + 1));

    // Data after the FIN is not looked at.
    net.segment(&mut app, 0, CLIENT_ISN + 5, Some(isn + 1), b"more", at(20));
    assert_eq!(app.received.len(), 2);
    assert!(net.sent().is_empty());
}

#[test]
fn close_after_peer_fin() {
    let mut net = Net::with_config(Config::default());
    let mut app = App { close_on_fin: true, ..App::default() };
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, FIN, CLIENT_ISN + 1, Some(isn + 1), &[], at(10));
    assert_eq!(app.received, vec![Vec::<u8>::new()]);
    assert_eq!(net.connection().state(), State::LastAck);
    assert_eq!(net.connection().send_next(), isn + 2);

    let out = net.sent();
    assert_eq!(out.len(), 2);
    let (fin, _) = &out[0];
    assert_eq!(fin.flags, TcpFlags::from_bits(TcpFlags::FIN | TcpFlags::ACK));
    assert_eq!(fin.seq_number, isn + 1);
    assert_eq!(fin.ack_number, Some(CLIENT_ISN + 2));
    let (ack, _) = &out[1];
    assert_eq!(ack.flags, TcpFlags::from_bits(TcpFlags::ACK));
    assert_eq!(ack.seq_number, isn + 2);

    // The final acknowledgment of our FIN.
    net.segment(&mut app, 0, CLIENT_ISN + 2, Some(isn + 2), &[], at(20));
    assert_eq!(net.connection().send_unacked(), isn + 2);
    assert_eq!(net.connection().state(), State::LastAck);
    assert!(net.sent().is_empty());
}

#[test]
fn close_from_established() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(5)).close();
    assert_eq!(net.connection().state(), State::LastAck);
    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.flags, TcpFlags::from_bits(TcpFlags::FIN | TcpFlags::ACK));
    assert_eq!(out[0].0.seq_number, isn + 1);

    // Sending after close is ignored, as is a second close.
    net.socket(at(6)).send(b"late");
    net.socket(at(7)).close();
    assert!(net.sent().is_empty());
    assert_eq!(net.connection().pending_len(), 0);
    assert_eq!(net.connection().send_next(), isn + 2);
}

#[test]
fn close_before_established() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    net.segment(&mut app, SYN, CLIENT_ISN, None, &[], at(0));
    net.sent();
    net.socket(at(1)).close();
    assert_eq!(net.connection().state(), State::SynReceived);
    assert!(net.sent().is_empty());
}

#[test]
fn close_sends_pending_data_first() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(0)).send(&[5; 300]);
    net.socket(at(1)).close();
    assert_eq!(net.connection().state(), State::LastAck);
    assert!(!net.connection().fin_sent());
    assert_eq!(net.connection().pending_len(), 200);

    let mut out = net.sent();
    assert_eq!(out.len(), 1);

    let mut time = 10;
    while !net.connection().fin_sent() {
        let ack = net.connection().send_next();
        net.segment(&mut app, 0, CLIENT_ISN + 1, Some(ack), &[], at(time));
        out.extend(net.sent());
        time += 10;
        assert!(time < 100, "fin never sent");
    }

    let data: Vec<u8> = out.iter().flat_map(|(_, payload)| payload.iter().copied()).collect();
    assert_eq!(data, vec![5; 300]);

    let fins: Vec<_> = out.iter().filter(|(repr, _)| repr.flags.fin()).collect();
    assert_eq!(fins.len(), 1);
    let (fin, payload) = out.last().unwrap();
    assert!(fin.flags.fin());
    assert!(payload.is_empty());
    assert_eq!(fin.seq_number, isn + 301);
    assert_eq!(net.connection().send_next(), isn + 302);

    // Acknowledging the FIN leaves nothing to send or retransmit.
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 302), &[], at(time));
    assert!(net.sent().is_empty());
    assert_eq!(net.connection().outstanding_len(), 0);
    assert_eq!(net.connection().deadline(), Expiration::Never);
}

#[test]
fn send_wraps_own_sequence() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = TcpSeqNumber(0xffff_ff80);

    net.segment(&mut app, SYN, CLIENT_ISN, None, &[], at(0));
    net.sent();
    net.tcp.registry_mut().insert(Connection::new(ID, isn, CLIENT_ISN, small_segments()));
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), &[], at(0));
    assert_eq!(net.connection().state(), State::Established);

    net.socket(at(0)).send(&[9; 1000]);
    let mut out = net.sent();
    for round in 1..=3 {
        let ack = net.connection().send_next();
        net.segment(&mut app, 0, CLIENT_ISN + 1, Some(ack), &[], at(10 * round));
        out.extend(net.sent());
    }

    assert_eq!(out.len(), 10);
    let mut expected = isn + 1;
    for (repr, payload) in &out {
        assert_eq!(repr.seq_number, expected);
        expected += payload.len();
    }
    assert_eq!(expected, TcpSeqNumber(873));

    // The last window is still in flight and is acknowledged across the wrap.
    assert_eq!(net.connection().in_flight(), 400);
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(expected), &[], at(50));
    assert_eq!(net.connection().send_unacked(), TcpSeqNumber(873));
    assert_eq!(net.connection().in_flight(), 0);
    assert_eq!(net.connection().outstanding_len(), 0);
    assert_eq!(net.connection().congestion_window(), 500);
}

#[test]
fn echo_from_callback() {
    let mut net = Net::with_config(Config::default());
    let mut app = App { echo: true, ..App::default() };
    let isn = net.handshake(&mut app, at(0));

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 1), b"ping", at(10));
    let out = net.sent();
    assert_eq!(out.len(), 2);

    let (data, payload) = &out[0];
    assert_eq!(payload, b"ping");
    assert_eq!(data.seq_number, isn + 1);
    assert_eq!(data.ack_number, Some(CLIENT_ISN + 5));
    let (ack, _) = &out[1];
    assert_eq!(ack.seq_number, isn + 5);
    assert_eq!(ack.ack_number, Some(CLIENT_ISN + 5));

    assert_eq!(net.connection().in_flight(), 4);
    assert_eq!(net.tcp.next_deadline(), Expiration::When(at(10) + Duration::from_secs(1)));
}

#[test]
fn segments_limited_by_window() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(0)).send(&[7; 250]);
    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].1.len(), 100);
    assert_eq!(out[0].0.seq_number, isn + 1);
    assert_eq!(net.connection().pending_len(), 150);
    assert_eq!(net.connection().in_flight(), 100);

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 101), &[], at(10));
    assert_eq!(net.connection().congestion_window(), 200);
    let out = net.sent();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].0.seq_number, isn + 101);
    assert_eq!(out[0].1.len(), 100);
    assert_eq!(out[1].0.seq_number, isn + 201);
    assert_eq!(out[1].1.len(), 50);
    assert_eq!(net.connection().pending_len(), 0);
}

#[test]
fn congestion_window_grows_linearly() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    net.handshake(&mut app, at(0));

    net.socket(at(0)).send(&[1; 10_000]);
    assert_eq!(net.sent().len(), 1);

    for round in 1..=5 {
        let window = net.connection().congestion_window();
        assert_eq!(window, 100 * round);
        assert_eq!(net.connection().in_flight(), window);

        let ack = net.connection().send_next();
        net.segment(&mut app, 0, CLIENT_ISN + 1, Some(ack), &[], at(10 * round as i64));
        assert_eq!(net.connection().congestion_window(), window + 100);
        assert_eq!(net.sent().len(), round + 1);
    }

    assert_eq!(net.connection().congestion_window(), 600);
}

#[test]
fn ack_beyond_sent_ignored() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(0)).send(&[1; 50]);
    net.sent();

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 500), &[], at(10));
    assert_eq!(net.connection().send_unacked(), isn + 1);
    assert_eq!(net.connection().outstanding_len(), 1);
    assert_eq!(net.connection().congestion_window(), 100);
}

#[test]
fn partial_ack_keeps_segment() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(0)).send(&[1; 80]);
    net.sent();

    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 41), &[], at(10));
    assert_eq!(net.connection().send_unacked(), isn + 41);
    assert_eq!(net.connection().outstanding_len(), 1);
    assert_eq!(net.connection().in_flight(), 40);
    assert_eq!(net.tcp.next_deadline(), Expiration::When(at(10) + Duration::from_secs(1)));
}

#[test]
fn round_trip_samples() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));

    net.socket(at(1000)).send(&[1; 10]);
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 11), &[], at(1100));
    assert_eq!(net.connection().timeout(), Duration::from_millis(300));

    net.socket(at(2000)).send(&[2; 10]);
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 21), &[], at(2100));
    assert_eq!(net.connection().timeout(), Duration::from_millis(250));
    assert_eq!(net.tcp.next_deadline(), Expiration::Never);
}

#[test]
fn retransmit_oldest_only() {
    let mut net = Net::with_config(small_segments());
    let mut app = App::default();
    let isn = net.handshake(&mut app, at(0));
    let start = isn + 1;

    net.socket(at(0)).send(&[1; 100]);
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(start + 100), &[], at(100));
    assert_eq!(net.connection().timeout(), Duration::from_millis(300));
    assert_eq!(net.connection().congestion_window(), 200);
    assert_eq!(net.tcp.next_deadline(), Expiration::Never);
    net.sent();

    let mut data = vec![2u8; 100];
    data.extend_from_slice(&[3; 100]);
    net.socket(at(200)).send(&data);
    assert_eq!(net.sent().len(), 2);
    assert_eq!(net.tcp.next_deadline(), Expiration::When(at(500)));

    net.poll(at(499));
    assert!(net.sent().is_empty());

    net.poll(at(500));
    let out = net.sent();
    assert_eq!(out.len(), 1);
    let (segment, payload) = &out[0];
    assert_eq!(segment.seq_number, start + 100);
    assert_eq!(segment.ack_number, Some(CLIENT_ISN + 1));
    assert_eq!(payload, &vec![2; 100]);
    assert_eq!(net.connection().congestion_window(), 100);

    // Once per firing.
    net.poll(at(500));
    assert!(net.sent().is_empty());

    // The retransmission acknowledges what arrived in the meantime.
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(start + 100), b"xy", at(600));
    assert_eq!(net.sent().len(), 1);

    net.poll(at(800));
    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.seq_number, start + 100);
    assert_eq!(out[0].0.ack_number, Some(CLIENT_ISN + 3));
    assert_eq!(net.connection().congestion_window(), 100);

    // Retransmitted segments give no round trip sample.
    net.segment(&mut app, 0, CLIENT_ISN + 3, Some(start + 300), &[], at(900));
    let connection = net.connection();
    assert_eq!(connection.rtt().estimate(), Some(Duration::from_millis(100)));
    assert_eq!(connection.timeout(), Duration::from_millis(300));
    assert_eq!(connection.outstanding_len(), 0);
    assert_eq!(connection.congestion_window(), 200);
    assert_eq!(net.tcp.next_deadline(), Expiration::Never);
}

#[test]
fn send_before_established() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();

    net.segment(&mut app, SYN, CLIENT_ISN, None, &[], at(0));
    let isn = net.sent()[0].0.seq_number;

    net.socket(at(1)).send(b"early");
    let out = net.sent();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].0.seq_number, isn + 1);
    assert_eq!(out[0].1, b"early".to_vec());

    // The handshake ACK also acknowledges the data.
    net.segment(&mut app, 0, CLIENT_ISN + 1, Some(isn + 6), &[], at(50));
    assert_eq!(net.connection().state(), State::Established);
    assert_eq!(net.connection().outstanding_len(), 0);
}

#[test]
fn syn_replaces_connection() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    net.handshake(&mut app, at(0));

    let second = TcpSeqNumber(77_777);
    net.segment(&mut app, SYN, second, None, &[], at(100));
    assert_eq!(net.sent().len(), 1);
    assert_eq!(net.tcp.registry().len(), 1);
    assert_eq!(app.accepted, vec![ID, ID]);

    let connection = net.connection();
    assert_eq!(connection.state(), State::SynReceived);
    assert_eq!(connection.recv_next(), second + 1);
}

#[test]
fn registry_removal() {
    let mut net = Net::with_config(Config::default());
    let mut app = App::default();
    net.handshake(&mut app, at(0));

    assert!(net.tcp.registry_mut().remove(ID).is_some());
    assert!(net.tcp.registry().get(ID).is_none());
    assert!(net.tcp.socket(ID, ip::Handle::new(&net.ip, net.mux.handle()), at(1)).is_none());
}
