//! A miniature TCP/IP stack for serial lines.
//!
//! ## Table of contents
//!
//! 1. [Design](#design-and-relevant-core-concepts)
//! 2. [The wire module](wire/index.html)
//! 3. [The layers](layer/index.html)
//!    1. [Slip framing](layer/slip/index.html)
//!    1. [Ip forwarding](layer/ip/index.html)
//!    1. [Icmp](layer/icmp/index.html)
//!    1. [Tcp](layer/tcp/index.html)
//! 4. [Line devices](nic/index.html)
//! 5. [Putting it together](iface/index.html)
//!
//! ## Design and relevant core concepts
//!
//! Raw bytes arrive on one of several point-to-point lines, each leading to a single peer. The
//! link layer cuts them into frames, the ip layer either delivers a frame to the local host or
//! forwards it along the longest matching route, and the tcp layer demultiplexes segments onto
//! passively opened connections. Everything above that is an application behind the observer
//! traits of the tcp layer.
//!
//! All processing is synchronous and driven by the caller. Each entry point gets the current
//! [`Instant`] explicitely, nothing inside the stack reads a clock on its own. Retransmission is
//! therefore not a background task but a deadline that the caller must [`poll`] when it expires.
//! This makes the whole stack deterministic under test, where time is simply a number.
//!
//! Errors below the application are absorbed. A datagram that can not be parsed, routed or
//! delivered is dropped and the reason is logged (with the `log` feature) but never surfaces to
//! the application as a failure.
//!
//! [`Instant`]: time/struct.Instant.html
//! [`poll`]: iface/struct.Interface.html#method.poll
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use] mod macros;
pub mod config;
pub mod iface;
pub mod layer;
pub mod nic;
pub mod time;
pub mod wire;
