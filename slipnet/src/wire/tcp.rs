use core::{cmp, fmt, ops};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::ip::{checksum, Protocol};
use super::ipv4::Address;

/// A TCP sequence number.
///
/// A sequence number is a monotonically advancing integer modulo 2<sup>32</sup>.
/// Sequence numbers do not have a discontiguity when compared pairwise across a signed overflow.
/// Two numbers are ordered by the sign of their wrapping difference, so any number is 'before'
/// the 2<sup>31</sup> numbers following it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNumber(pub u32);

impl SeqNumber {
    /// The forward distance from `earlier` to `self`.
    ///
    /// Returns `None` if `earlier` is actually after `self`.
    pub fn distance_from(self, earlier: SeqNumber) -> Option<usize> {
        let diff = self.0.wrapping_sub(earlier.0) as i32;
        if diff < 0 {
            None
        } else {
            Some(diff as usize)
        }
    }

    /// Query if `self` lies in the half-open window `(after, until]`.
    pub fn in_window(self, after: SeqNumber, until: SeqNumber) -> bool {
        after < self && self <= until
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ops::Add<usize> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: usize) -> SeqNumber {
        SeqNumber(self.0.wrapping_add(rhs as u32))
    }
}

impl ops::AddAssign<usize> for SeqNumber {
    fn add_assign(&mut self, rhs: usize) {
        *self = *self + rhs;
    }
}

impl cmp::PartialOrd for SeqNumber {
    fn partial_cmp(&self, other: &SeqNumber) -> Option<cmp::Ordering> {
        Some((self.0.wrapping_sub(other.0) as i32).cmp(&0))
    }
}

/// The control bits of a segment.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct Flags(u16);

impl Flags {
    /// No more data from sender.
    pub const FIN: u16 = 0x001;
    /// Synchronize sequence numbers.
    pub const SYN: u16 = 0x002;
    /// Reset the connection.
    pub const RST: u16 = 0x004;
    /// Push function.
    pub const PSH: u16 = 0x008;
    /// Acknowledgment field significant.
    pub const ACK: u16 = 0x010;
    /// Urgent pointer field significant.
    pub const URG: u16 = 0x020;

    const ALL: u16 = 0x1ff;

    /// Construct flags from raw bits, ignoring reserved bits.
    pub fn from_bits(bits: u16) -> Self {
        Flags(bits & Self::ALL)
    }

    /// The raw control bits.
    pub fn bits(self) -> u16 {
        self.0
    }

    fn get(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    fn set(&mut self, bit: u16, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    /// Return the FIN flag.
    pub fn fin(self) -> bool { self.get(Self::FIN) }
    /// Return the SYN flag.
    pub fn syn(self) -> bool { self.get(Self::SYN) }
    /// Return the RST flag.
    pub fn rst(self) -> bool { self.get(Self::RST) }
    /// Return the PSH flag.
    pub fn psh(self) -> bool { self.get(Self::PSH) }
    /// Return the ACK flag.
    pub fn ack(self) -> bool { self.get(Self::ACK) }
    /// Return the URG flag.
    pub fn urg(self) -> bool { self.get(Self::URG) }

    /// Set the FIN flag.
    pub fn set_fin(&mut self, value: bool) { self.set(Self::FIN, value) }
    /// Set the SYN flag.
    pub fn set_syn(&mut self, value: bool) { self.set(Self::SYN, value) }
    /// Set the RST flag.
    pub fn set_rst(&mut self, value: bool) { self.set(Self::RST, value) }
    /// Set the PSH flag.
    pub fn set_psh(&mut self, value: bool) { self.set(Self::PSH, value) }
    /// Set the ACK flag.
    pub fn set_ack(&mut self, value: bool) { self.set(Self::ACK, value) }

    /// The sequence space consumed by the flags alone.
    ///
    /// Both SYN and FIN occupy one sequence number.
    pub fn sequence_len(self) -> usize {
        usize::from(self.syn()) + usize::from(self.fin())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (Self::SYN, "SYN"),
            (Self::ACK, "ACK"),
            (Self::FIN, "FIN"),
            (Self::RST, "RST"),
            (Self::PSH, "PSH"),
            (Self::URG, "URG"),
        ];
        let mut first = true;
        for &(bit, name) in names.iter() {
            if self.get(bit) {
                if !first { f.write_str("|")?; }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}

byte_wrapper! {
    /// A byte sequence representing a TCP segment.
    #[derive(Debug, PartialEq, Eq)]
    pub struct tcp([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const SEQ_NUM:  Field = 4..8;
    pub(crate) const ACK_NUM:  Field = 8..12;
    pub(crate) const FLAGS:    Field = 12..14;
    pub(crate) const WIN_SIZE: Field = 14..16;
    pub(crate) const CHECKSUM: Field = 16..18;
    pub(crate) const URGENT:   Field = 18..20;
}

/// The length of a header without options.
pub const HEADER_LEN: usize = field::URGENT.end;

impl tcp {
    /// Imbue a raw octet buffer with TCP packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &tcp {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with TCP packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut tcp {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&tcp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwrap the packet as a mutable raw byte slice.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    /// Returns `Err(Error::Malformed)` if the data offset points into the fixed header.
    ///
    /// The result of this check is invalidated by calling [set_header_len].
    ///
    /// [set_header_len]: #method.set_header_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            Err(Error::Truncated)
        } else {
            let header_len = self.header_len() as usize;
            if header_len < HEADER_LEN {
                Err(Error::Malformed)
            } else if len < header_len {
                Err(Error::Truncated)
            } else {
                Ok(())
            }
        }
    }

    /// Return the source port field.
    #[inline]
    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SRC_PORT])
    }

    /// Return the destination port field.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::DST_PORT])
    }

    /// Return the sequence number field.
    #[inline]
    pub fn seq_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_u32(&self.0[field::SEQ_NUM]))
    }

    /// Return the acknowledgement number field.
    #[inline]
    pub fn ack_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_u32(&self.0[field::ACK_NUM]))
    }

    /// Return the control flags.
    #[inline]
    pub fn flags(&self) -> Flags {
        Flags::from_bits(NetworkEndian::read_u16(&self.0[field::FLAGS]))
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        ((raw >> 12) * 4) as u8
    }

    /// Return the window size field.
    #[inline]
    pub fn window_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::WIN_SIZE])
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the urgent pointer field.
    #[inline]
    pub fn urgent_at(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::URGENT])
    }

    /// Return the length of the segment, in terms of sequence space.
    pub fn segment_len(&self) -> usize {
        self.payload_slice().len() + self.flags().sequence_len()
    }

    /// Validate the segment checksum against the pseudo header.
    pub fn verify_checksum(&self, src_addr: Address, dst_addr: Address) -> bool {
        checksum::combine(&[
            checksum::pseudo_header(src_addr, dst_addr, Protocol::Tcp, self.0.len() as u32),
            checksum::data(&self.0),
        ]) == !0
    }

    /// Return the payload as a byte slice.
    ///
    /// Options, if any, are skipped.
    pub fn payload_slice(&self) -> &[u8] {
        let header_len = self.header_len() as usize;
        &self.0[header_len..]
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let header_len = self.header_len() as usize;
        &mut self.0[header_len..]
    }

    /// Set the source port field.
    #[inline]
    pub fn set_src_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::SRC_PORT], value)
    }

    /// Set the destination port field.
    #[inline]
    pub fn set_dst_port(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::DST_PORT], value)
    }

    /// Set the sequence number field.
    #[inline]
    pub fn set_seq_number(&mut self, value: SeqNumber) {
        NetworkEndian::write_u32(&mut self.0[field::SEQ_NUM], value.0)
    }

    /// Set the acknowledgement number field.
    #[inline]
    pub fn set_ack_number(&mut self, value: SeqNumber) {
        NetworkEndian::write_u32(&mut self.0[field::ACK_NUM], value.0)
    }

    /// Set the control flags, keeping the data offset.
    #[inline]
    pub fn set_flags(&mut self, value: Flags) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        let raw = (raw & !0x0fff) | value.bits();
        NetworkEndian::write_u16(&mut self.0[field::FLAGS], raw)
    }

    /// Set the header length, in octets.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        let raw = (raw & !0xf000) | (u16::from(value) / 4) << 12;
        NetworkEndian::write_u16(&mut self.0[field::FLAGS], raw)
    }

    /// Set the window size field.
    #[inline]
    pub fn set_window_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::WIN_SIZE], value)
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Set the urgent pointer field.
    #[inline]
    pub fn set_urgent_at(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::URGENT], value)
    }

    /// Compute and fill in the checksum over pseudo header, header and payload.
    pub fn fill_checksum(&mut self, src_addr: Address, dst_addr: Address) {
        self.set_checksum(0);
        let checksum = {
            !checksum::combine(&[
                checksum::pseudo_header(src_addr, dst_addr, Protocol::Tcp, self.0.len() as u32),
                checksum::data(&self.0),
            ])
        };
        self.set_checksum(checksum)
    }
}

impl AsRef<[u8]> for tcp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for tcp {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// A high-level representation of a Transmission Control Protocol segment header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    /// The source port.
    pub src_port:    u16,
    /// The destination port.
    pub dst_port:    u16,
    /// The control flags, except ACK which follows `ack_number`.
    pub flags:       Flags,
    /// The sequence number of the first octet.
    pub seq_number:  SeqNumber,
    /// The acknowledged sequence number, if ACK is set.
    pub ack_number:  Option<SeqNumber>,
    /// The advertised receive window.
    pub window_len:  u16,
    /// The length of the segment data.
    pub payload_len: usize,
}

impl Repr {
    /// Parse a Transmission Control Protocol segment and return a high-level representation.
    ///
    /// The checksum is not inspected, it depends on the addresses of the enclosing datagram. See
    /// [`tcp::verify_checksum`]. Options are skipped.
    ///
    /// [`tcp::verify_checksum`]: struct.tcp.html#method.verify_checksum
    pub fn parse(packet: &tcp) -> Result<Repr> {
        packet.check_len()?;

        let flags = packet.flags();
        let ack_number = if flags.ack() {
            Some(packet.ack_number())
        } else {
            None
        };

        Ok(Repr {
            src_port:    packet.src_port(),
            dst_port:    packet.dst_port(),
            flags,
            seq_number:  packet.seq_number(),
            ack_number,
            window_len:  packet.window_len(),
            payload_len: packet.payload_slice().len(),
        })
    }

    /// Return the length of the header that will be emitted from this high-level representation.
    ///
    /// No options are ever emitted.
    pub fn header_len(&self) -> usize {
        HEADER_LEN
    }

    /// Return the length of a segment that will be emitted from this high-level representation.
    pub fn buffer_len(&self) -> usize {
        self.header_len() + self.payload_len
    }

    /// Return the length of the segment, in terms of sequence space.
    pub fn sequence_len(&self) -> usize {
        self.payload_len + self.flags.sequence_len()
    }

    /// Emit a high-level representation into a Transmission Control Protocol segment.
    ///
    /// The payload must already be in place since the checksum is filled last.
    pub fn emit(&self, packet: &mut tcp, src_addr: Address, dst_addr: Address) {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_seq_number(self.seq_number);
        packet.set_ack_number(self.ack_number.unwrap_or(SeqNumber(0)));
        packet.set_header_len(HEADER_LEN as u8);
        let mut flags = self.flags;
        flags.set_ack(self.ack_number.is_some());
        packet.set_flags(flags);
        packet.set_window_len(self.window_len);
        packet.set_urgent_at(0);
        packet.fill_checksum(src_addr, dst_addr);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TCP src={} dst={} {} seq={}",
               self.src_port, self.dst_port, self.flags, self.seq_number)?;
        if let Some(ack) = self.ack_number {
            write!(f, " ack={}", ack)?;
        }
        write!(f, " win={} len={}", self.window_len, self.payload_len)
    }
}
