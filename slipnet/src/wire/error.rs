use core::fmt;

/// The error type for parsing of the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// An incoming packet could not be parsed because it was shorter than assumed.
    ///
    /// The packet may be shorter than the minimum length specified, or claim a size longer than
    /// the actual data it arrived with.
    Truncated,

    /// An incoming packet had an incorrect checksum and was dropped.
    ///
    /// Checksum validation can be switched off for the whole stack, see `Checksum::Ignored`.
    WrongChecksum,

    /// An incoming packet could not be recognized and was dropped.
    ///
    /// E.g. an ICMP message of a type that this implementation does not know about.
    Unrecognized,

    /// An incoming packet was recognized but was self-contradictory.
    ///
    /// Examples: an IP header claiming a total length smaller than itself; a TCP header with a
    /// data offset pointing into its own fixed fields.
    Malformed,

    /// Parsing depends on information derived from a non-implemented feature.
    ///
    /// Similar to `Unrecognized` but in contrast we know that our implementation is incomplete,
    /// for example for fragmented datagrams.
    Unsupported,
}

/// The result type for the networking stack.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated     => write!(f, "truncated packet"),
            Error::WrongChecksum => write!(f, "checksum error"),
            Error::Unrecognized  => write!(f, "unrecognized packet"),
            Error::Unsupported   => write!(f, "unsupported option"),
            Error::Malformed     => write!(f, "malformed packet"),
        }
    }
}

impl std::error::Error for Error { }
