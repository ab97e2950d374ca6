//! An echo server on a single serial line.
//!
//! # Usage
//!
//! The example opens a character device, for example one end of a pseudo terminal pair or a real
//! serial port, and speaks SLIP on it. Every tcp connection to the given port gets its data sent
//! back and is closed when the peer closes.
//!
//! 1. Create a pair of connected pseudo terminals:
//!
//!   > $ socat -d -d pty,raw,echo=0 pty,raw,echo=0
//! 2. Attach the kernel to one end (likely requires root):
//!
//!   > $ slattach -p slip -s 115200 /dev/pts/3 &
//!   > $ ip addr add 10.0.0.2 peer 10.0.0.1 dev sl0 && ip link set up dev sl0
//! 3. Start the example on the other end:
//!
//!   > $ cargo run --example slip_echo -- /dev/pts/4 10.0.0.1 10.0.0.2 7
//! 4. Talk to it.
//!
//!   > $ nc 10.0.0.1 7
//!
//! Reads block, so retransmissions are only sent when the line is active. This is good enough for
//! an interactive demo.
use std::fs::OpenOptions;
use std::io::Read;
use structopt::StructOpt;

use slipnet::config::Config;
use slipnet::iface::Interface;
use slipnet::layer::ip::Route;
use slipnet::layer::slip::Multiplexer;
use slipnet::layer::tcp::{Accept, Recv, Socket};
use slipnet::nic::Stream;
use slipnet::time::Instant;
use slipnet::wire::{Checksum, Ipv4Address, Ipv4Cidr};

fn main() {
    let Options {
        line,
        host,
        peer,
        port,
        routes,
        ignore_checksums,
    } = Options::from_args();

    let mut reader = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&line)
        .expect("Couldn't open the line");
    let writer = reader.try_clone()
        .expect("Couldn't duplicate the line handle");

    let checksum = if ignore_checksums { Checksum::Ignored } else { Checksum::Manual };
    let config = routes.into_iter()
        .fold(Config::new(), Config::route)
        .route(Route::new(Ipv4Cidr::new(peer, 32), peer))
        .local_addr(host)
        .port(port)
        .checksum(checksum);

    let mut lines = Multiplexer::new(checksum);
    lines.add_line(peer, Stream::new(writer));
    let mut iface = Interface::new(lines, &config);

    println!("Echo on {}:{} via {}", host, port, line);

    let mut buffer = vec![0; 1 << 12];
    let mut echo = Echo;
    loop {
        let len = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(len) => len,
            Err(err) => panic!("Error reading from the line: {}", err),
        };

        let now = Instant::now();
        iface.receive(peer, &buffer[..len], now, &mut echo);
        iface.poll(now);
    }
}

struct Echo;

impl Accept for Echo {
    fn accept(&mut self, socket: &mut Socket) {
        println!("Connection from {}", socket.id());
    }
}

impl Recv for Echo {
    fn receive(&mut self, socket: &mut Socket, data: &[u8]) {
        if data.is_empty() {
            println!("Closing {}", socket.id());
            socket.close();
        } else {
            socket.send(data);
        }
    }
}

#[derive(StructOpt)]
struct Options {
    /// The character device of the line.
    line: String,
    /// Our address.
    host: Ipv4Address,
    /// The address of the peer on the line.
    peer: Ipv4Address,
    /// The port to echo on.
    port: u16,
    /// Additional routes, as `network/prefix=next_hop`.
    #[structopt(long = "route")]
    routes: Vec<Route>,
    /// Accept datagrams and segments with wrong checksums.
    #[structopt(long = "ignore-checksums")]
    ignore_checksums: bool,
}
