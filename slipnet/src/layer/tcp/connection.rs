use core::fmt;
use std::collections::VecDeque;

use crate::layer::ip;
use crate::time::{Duration, Expiration, Instant, Timer};
use crate::wire::{IpProtocol, Ipv4Address, TcpFlags, TcpRepr, TcpSeqNumber, tcp_packet};

use super::Config;
use super::endpoint::FourTuple;
use super::rtt::RttEstimator;

/// The states of a passively opened connection.
///
/// There is no closed state. A connection in `LastAck` stays in the registry until the owner
/// removes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// A SYN was received and answered.
    SynReceived,
    /// The handshake completed.
    Established,
    /// The peer closed its half.
    CloseWait,
    /// We closed. Our FIN follows the data still pending.
    LastAck,
}

/// The congestion window, in octets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Congestion {
    window: usize,
    /// Acknowledged octets not yet accounted for in the window.
    acked: usize,
    mss: usize,
}

/// A transmitted segment that was not yet acknowledged.
#[derive(Debug)]
struct Outstanding {
    /// The first sequence number.
    seq: TcpSeqNumber,
    /// The encoded segment, header included.
    segment: Vec<u8>,
    /// The payload length.
    len: usize,
    /// When it was last transmitted.
    sent_at: Instant,
    /// Whether its acknowledgment may be used as a round trip sample.
    rtt_eligible: bool,
}

#[derive(Clone, Copy, Debug)]
struct SendState {
    /// The oldest unacknowledged sequence number.
    unacked: TcpSeqNumber,
    /// The next sequence number to send.
    next: TcpSeqNumber,
}

/// How the receive path treated a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Incoming {
    /// Nothing to do.
    Ignored,
    /// The segment was not at the expected sequence number.
    Duplicate,
    /// The segment was accepted.
    InOrder {
        /// It carried a FIN.
        fin: bool,
    },
}

/// The state of one connection.
#[derive(Debug)]
pub struct Connection {
    id: FourTuple,
    state: State,
    isn: TcpSeqNumber,
    send: SendState,
    recv_next: TcpSeqNumber,
    pending: VecDeque<u8>,
    fin_sent: bool,
    outstanding: VecDeque<Outstanding>,
    congestion: Congestion,
    rtt: RttEstimator,
    timer: Timer,
    config: Config,
}

impl Congestion {
    /// A window of a single segment.
    pub fn new(mss: usize) -> Self {
        let mss = mss.max(1);
        Congestion {
            window: mss,
            acked: 0,
            mss,
        }
    }

    /// The current window.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Account for newly acknowledged octets.
    ///
    /// Every full window of acknowledged octets grows the window by one segment.
    pub fn on_ack(&mut self, octets: usize) {
        self.acked += octets;
        while self.acked >= self.window {
            self.acked -= self.window;
            self.window += self.mss;
        }
    }

    /// Halve the window after a loss, but never below one segment.
    pub fn on_timeout(&mut self) {
        self.window = (self.window / 2).max(self.mss);
        self.acked = 0;
    }
}

impl Outstanding {
    fn end(&self) -> TcpSeqNumber {
        self.seq + self.len
    }
}

impl Connection {
    /// The state after receiving a SYN.
    ///
    /// Nothing is sent yet, see `send_syn_ack`.
    pub(crate) fn new(
        id: FourTuple,
        isn: TcpSeqNumber,
        peer_seq: TcpSeqNumber,
        config: Config,
    ) -> Self {
        Connection {
            id,
            state: State::SynReceived,
            isn,
            send: SendState {
                unacked: isn + 1,
                next: isn + 1,
            },
            recv_next: peer_seq + 1,
            pending: VecDeque::new(),
            fin_sent: false,
            outstanding: VecDeque::new(),
            congestion: Congestion::new(config.mss),
            rtt: RttEstimator::new(&config),
            timer: Timer::default(),
            config,
        }
    }

    /// The identity of the connection.
    pub fn id(&self) -> FourTuple {
        self.id
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Our initial sequence number.
    pub fn isn(&self) -> TcpSeqNumber {
        self.isn
    }

    /// The next sequence number we will send.
    pub fn send_next(&self) -> TcpSeqNumber {
        self.send.next
    }

    /// The oldest sequence number not acknowledged by the peer.
    pub fn send_unacked(&self) -> TcpSeqNumber {
        self.send.unacked
    }

    /// The next sequence number expected from the peer.
    pub fn recv_next(&self) -> TcpSeqNumber {
        self.recv_next
    }

    /// The congestion window.
    pub fn congestion_window(&self) -> usize {
        self.congestion.window()
    }

    /// The number of sequence numbers sent but not acknowledged.
    pub fn in_flight(&self) -> usize {
        self.send.next.distance_from(self.send.unacked).unwrap_or(0)
    }

    /// The current retransmission timeout.
    pub fn timeout(&self) -> Duration {
        self.rtt.timeout()
    }

    /// The round trip estimator.
    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    /// The deadline of the retransmission timer.
    pub fn deadline(&self) -> Expiration {
        self.timer.deadline()
    }

    /// The number of unacknowledged segments.
    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    /// The number of octets waiting for the window to open.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queue data and send as much as the window allows.
    pub(crate) fn send(&mut self, handle: &mut ip::Handle, data: &[u8], time: Instant) {
        if self.state == State::LastAck {
            net_debug!("tcp: {} already closed, ignoring {} octets", self.id, data.len());
            return;
        }

        self.pending.extend(data.iter().copied());
        self.drain(handle, time);
    }

    /// Whether our FIN went out.
    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    /// Stop accepting data and send our FIN once the pending data is out.
    pub(crate) fn close(&mut self, handle: &mut ip::Handle, time: Instant) {
        match self.state {
            State::Established | State::CloseWait => (),
            state => {
                net_debug!("tcp: {} close in state {:?} has no effect", self.id, state);
                return;
            },
        }

        self.state = State::LastAck;
        net_debug!("tcp: {} closing with {} octets pending, now {:?}",
            self.id, self.pending.len(), self.state);
        self.drain(handle, time);
    }

    pub(crate) fn send_syn_ack(&mut self, handle: &mut ip::Handle) {
        let mut flags = TcpFlags::default();
        flags.set_syn(true);
        let segment = self.segment(flags, self.isn, &[]);
        transmit(handle, self.id.remote, &segment);
    }

    /// Acknowledge everything received so far.
    pub(crate) fn send_ack(&mut self, handle: &mut ip::Handle) {
        let segment = self.segment(TcpFlags::default(), self.send.next, &[]);
        transmit(handle, self.id.remote, &segment);
    }

    /// The acknowledgment part of an incoming segment.
    pub(crate) fn on_ack(&mut self, handle: &mut ip::Handle, repr: &TcpRepr, time: Instant) {
        let ack = match repr.ack_number {
            Some(ack) => ack,
            None => return,
        };

        if self.state == State::SynReceived && ack == self.send.next {
            self.state = State::Established;
            net_debug!("tcp: {} now {:?}", self.id, self.state);
        }

        if !ack.in_window(self.send.unacked, self.send.next) {
            return;
        }

        let sample = self.outstanding.iter()
            .take_while(|record| record.end() <= ack)
            .find(|record| record.rtt_eligible)
            .map(|record| time - record.sent_at);
        if let Some(rtt) = sample {
            self.rtt.sample(rtt);
            net_trace!("tcp: {} rtt sample {:?}, timeout {:?}", self.id, rtt, self.rtt.timeout());
        }

        self.timer.cancel();
        let mut acked = 0;
        while let Some(record) = self.outstanding.front() {
            if record.end() > ack {
                break;
            }
            acked += record.len;
            self.outstanding.pop_front();
        }

        self.send.unacked = ack;
        self.congestion.on_ack(acked);
        self.drain(handle, time);

        if !self.outstanding.is_empty() {
            self.timer.start(time, self.rtt.timeout());
        }
    }

    /// The receive part of an incoming segment.
    ///
    /// Advances the expected sequence number past accepted data. Delivery and acknowledgment are
    /// left to the caller.
    pub(crate) fn on_data(&mut self, repr: &TcpRepr) -> Incoming {
        match self.state {
            State::SynReceived | State::Established => (),
            State::CloseWait | State::LastAck => return Incoming::Ignored,
        }

        if repr.seq_number != self.recv_next {
            net_debug!("tcp: {} out of order seq={}, expected {}",
                self.id, repr.seq_number, self.recv_next);
            return Incoming::Duplicate;
        }

        let fin = repr.flags.fin();
        if repr.payload_len == 0 && !fin {
            return Incoming::Ignored;
        }

        self.recv_next += repr.payload_len;
        if fin {
            self.recv_next += 1;
            self.state = State::CloseWait;
            net_debug!("tcp: {} peer closed, now {:?}", self.id, self.state);
        }

        Incoming::InOrder { fin }
    }

    /// Retransmit the oldest segment if the timer expired.
    pub(crate) fn poll(&mut self, handle: &mut ip::Handle, time: Instant) {
        if !self.timer.poll(time) {
            return;
        }

        let record = match self.outstanding.front_mut() {
            Some(record) => record,
            None => return,
        };

        self.congestion.on_timeout();

        {
            let packet = tcp_packet::new_unchecked_mut(&mut record.segment);
            let mut flags = packet.flags();
            flags.set_ack(true);
            packet.set_flags(flags);
            packet.set_ack_number(self.recv_next);
            packet.fill_checksum(self.id.local, self.id.remote);
        }
        record.rtt_eligible = false;
        record.sent_at = time;

        self.timer.start(time, self.rtt.timeout());
        net_debug!("tcp: {} retransmit seq={}, window now {}",
            self.id, record.seq, self.congestion.window());
        transmit(handle, self.id.remote, &record.segment);
    }

    /// Send pending data while the window has room, then the FIN if we closed.
    fn drain(&mut self, handle: &mut ip::Handle, time: Instant) {
        loop {
            let available = self.congestion.window().saturating_sub(self.in_flight());
            let len = self.pending.len()
                .min(self.config.mss)
                .min(available);
            if len == 0 {
                break;
            }

            let payload: Vec<u8> = self.pending.drain(..len).collect();
            let seq = self.send.next;
            let segment = self.segment(TcpFlags::default(), seq, &payload);
            self.send.next += len;

            let rtt_eligible = self.outstanding.is_empty();
            self.outstanding.push_back(Outstanding {
                seq,
                segment,
                len,
                sent_at: time,
                rtt_eligible,
            });

            if !self.timer.is_running() {
                self.timer.start(time, self.rtt.timeout());
            }

            if let Some(record) = self.outstanding.back() {
                transmit(handle, self.id.remote, &record.segment);
            }
        }

        if self.state == State::LastAck && !self.fin_sent && self.pending.is_empty() {
            let mut flags = TcpFlags::default();
            flags.set_fin(true);
            let segment = self.segment(flags, self.send.next, &[]);
            self.send.next += 1;
            self.fin_sent = true;
            net_debug!("tcp: {} fin sent", self.id);
            transmit(handle, self.id.remote, &segment);
        }
    }

    /// Encode a segment acknowledging everything received so far.
    fn segment(&self, flags: TcpFlags, seq_number: TcpSeqNumber, payload: &[u8]) -> Vec<u8> {
        let repr = TcpRepr {
            src_port: self.id.local_port,
            dst_port: self.id.remote_port,
            flags,
            seq_number,
            ack_number: Some(self.recv_next),
            window_len: self.config.window_len,
            payload_len: payload.len(),
        };

        let header_len = repr.header_len();
        let mut buffer = vec![0; repr.buffer_len()];
        buffer[header_len..].copy_from_slice(payload);
        repr.emit(tcp_packet::new_unchecked_mut(&mut buffer), self.id.local, self.id.remote);
        net_trace!("tcp: {} send {}", self.id, repr);
        buffer
    }
}

fn transmit(handle: &mut ip::Handle, remote: Ipv4Address, segment: &[u8]) {
    match handle.send(segment, remote, IpProtocol::Tcp) {
        Ok(_) => (),
        Err(err) => net_debug!("tcp: segment to {} not sent: {}", remote, err),
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            State::SynReceived => "SYN-RECEIVED",
            State::Established => "ESTABLISHED",
            State::CloseWait => "CLOSE-WAIT",
            State::LastAck => "LAST-ACK",
        };
        f.write_str(name)
    }
}
