//! Initial sequence number generation, as recommended by rfc6528.
//!
//! A keyed SipHash-2-4 over the connection identity replaces the hash of identity and appended
//! secret key. The key setup of SipHash is computed once per generator.
use super::endpoint::FourTuple;
use crate::time::Instant;
use crate::wire::TcpSeqNumber;

/// An initial sequence number generator based on SipHash-2-4.
///
/// > ISN = M + SipHash-2-4(secretkey, localip, localport, remoteip, remoteport)
///
/// where `M` is a clock ticking every four milliseconds. Two connections with the same identity
/// opened in close succession get nearby but different sequence numbers, connections with
/// different identities get unrelated ones.
pub struct IsnGenerator {
    keys: (u64, u64),
}

// The initial values, as ASCII text.
const IV: [&[u8; 8]; 4] = [
    b"somepseu",
    b"dorandom",
    b"lygenera",
    b"tedbytes"];

struct State {
    v0: u64,
    v1: u64,
    v2: u64,
    v3: u64,
}

impl IsnGenerator {
    /// Create a generator by deriving a key from the standard `RandomState`.
    ///
    /// The numbers `0u64` and `1u64` are each hashed with a clone of one fresh hasher. The two
    /// tags form the key.
    pub fn from_std_hash() -> Self {
        use std::hash::{Hasher, BuildHasher};
        use std::collections::hash_map::RandomState;

        let hash = RandomState::new().build_hasher();
        let x0 = {
            let mut hash = hash.clone();
            hash.write_u64(0);
            hash.finish()
        };
        let x1 = {
            let mut hash = hash.clone();
            hash.write_u64(1);
            hash.finish()
        };

        IsnGenerator {
            keys: (x0, x1),
        }
    }

    /// Create a generator with some pre-defined secret key.
    ///
    /// Useful for reproducible sequence numbers. The key should otherwise come from a
    /// cryptographic random source.
    pub fn from_secret_key_bytes(bytes: [u8; 16]) -> Self {
        let mut a = [0; 8];
        let mut b = [0; 8];
        a.copy_from_slice(&bytes[..8]);
        b.copy_from_slice(&bytes[8..]);
        IsnGenerator {
            keys: (u64::from_le_bytes(a), u64::from_le_bytes(b)),
        }
    }

    /// Create a generator with a pre-defined key.
    #[cfg(test)]
    pub(crate) fn from_key(a: u64, b: u64) -> Self {
        IsnGenerator { keys: (a, b), }
    }

    /// Get the initial sequence number for a connection.
    ///
    /// The value varies every 4ms or when the underlying secret key is updated.
    pub fn get_isn(&self, connection: FourTuple, time: Instant) -> TcpSeqNumber {
        let mut state = State::init(self.keys.0, self.keys.1);

        let m = u64::from(connection.local.to_network_integer())
            | u64::from(connection.remote.to_network_integer()) << 32;
        let p = u64::from(connection.local_port)
            | u64::from(connection.remote_port) << 16
            // Message length = 12
            | 12_u64 << 56;
        state.absorb(m);
        state.absorb(p);
        let num = state.finalize();

        let clock = (time.total_millis() / 4) as u32;
        TcpSeqNumber((num as u32).wrapping_add(clock))
    }
}

impl State {
    const SIP_C: usize = 2;
    const SIP_D: usize = 4;

    fn init(k0: u64, k1: u64) -> Self {
        State {
            v0: u64::from_be_bytes(*IV[0]) ^ k0,
            v1: u64::from_be_bytes(*IV[1]) ^ k1,
            v2: u64::from_be_bytes(*IV[2]) ^ k0,
            v3: u64::from_be_bytes(*IV[3]) ^ k1,
        }
    }

    fn round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(13);
        self.v1 ^= self.v0;
        self.v0 = self.v0.rotate_left(32);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(16);
        self.v3 ^= self.v2;
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(21);
        self.v3 ^= self.v0;
        self.v2 = self.v2.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(17);
        self.v1 ^= self.v2;
        self.v2 = self.v2.rotate_left(32);
    }

    /// Process one eight octet block of the message.
    ///
    /// The caller absorbs the length block itself. All inputs are whole blocks, so the length
    /// block is a constant.
    fn absorb(&mut self, m: u64) {
        self.v3 ^= m;
        (0..Self::SIP_C).for_each(|_| self.round());
        self.v0 ^= m;
    }

    fn finalize(mut self) -> u64 {
        self.v2 ^= 0xff;
        (0..Self::SIP_D).for_each(|_| self.round());
        self.v0 ^ self.v1 ^ self.v2 ^ self.v3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Ipv4Address;

    fn tuple(remote_port: u16) -> FourTuple {
        FourTuple {
            local: Ipv4Address::new(10, 0, 0, 1),
            local_port: 80,
            remote: Ipv4Address::new(10, 0, 0, 2),
            remote_port,
        }
    }

    /// The vector of appendix A of the SipHash paper.
    #[test]
    fn paper_test_vector() {
        let k0 = u64::from_le_bytes(0x0001020304050607_u64.to_be_bytes());
        let k1 = u64::from_le_bytes(0x08090a0b0c0d0e0f_u64.to_be_bytes());

        let mut state = State::init(k0, k1);
        let m0 = u64::from_le_bytes(0x0001020304050607_u64.to_be_bytes());
        state.absorb(m0);
        let m1 = u64::from_le_bytes(0x08090a0b0c0d0e0f_u64.to_be_bytes());
        state.absorb(m1);

        assert_eq!(state.finalize(), 0xa129ca6149be45e5);
    }

    #[test]
    fn clock_advances_every_four_millis() {
        let isn = IsnGenerator::from_key(0x1234, 0x5678);
        let start = Instant::from_millis(1000);
        let base = isn.get_isn(tuple(4000), start);

        assert_eq!(isn.get_isn(tuple(4000), start), base);
        assert_eq!(isn.get_isn(tuple(4000), Instant::from_millis(1003)), base);
        assert_eq!(isn.get_isn(tuple(4000), Instant::from_millis(1004)), base + 1);
        assert_eq!(isn.get_isn(tuple(4000), Instant::from_millis(1400)), base + 100);
    }

    #[test]
    fn identity_and_key_matter() {
        let time = Instant::from_millis(0);
        let isn = IsnGenerator::from_key(0x1234, 0x5678);
        assert_ne!(isn.get_isn(tuple(4000), time), isn.get_isn(tuple(4001), time));

        let other = IsnGenerator::from_secret_key_bytes([7; 16]);
        assert_ne!(isn.get_isn(tuple(4000), time), other.get_isn(tuple(4000), time));
    }
}
