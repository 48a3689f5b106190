// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-ovh.
//
// gelf-ovh is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-ovh is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-ovh.  If not,
// see <http://www.gnu.org/licenses/>.

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, along with
//! the TCP, TLS & UDP implementations, and [`deliver`], which puts an encoded payload on a
//! [`Transport`] according to the [`Framing`] its [`Protocol`] calls for.
//!
//! Connections are not pooled: each send opens one, writes, and drops it.
//!
//! # Examples
//!
//! To send a payload over UDP to a collector listening on port 12201 on localhost:
//!
//! ```no_run
//! use gelf_ovh::transport::{connect, deliver, Endpoint, Protocol};
//! let endpoint = Endpoint::new("localhost").with_port(12201);
//! let mut conn = connect(Protocol::Udp, &endpoint, None).unwrap();
//! deliver(b"{\"version\":\"1.1\"}", Protocol::Udp.framing(), conn.as_mut()).unwrap();
//! ```

use crate::{
    chunk::{chunks, MessageId, UDP_CHUNK_MAX_SIZE},
    error::{Error, Result},
};

use backtrace::Backtrace;
use rustls::{pki_types::ServerName, ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, trace};

use std::{
    io::Write,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    sync::Arc,
    time::Duration,
};

type StdResult<T, E> = std::result::Result<T, E>;

/// OVH Logs Data Platform collector
pub const DEFAULT_HOST: &str = "gra1.logs.ovh.com";
/// GELF over TCP & UDP
pub const DEFAULT_PORT: u16 = 2202;
/// GELF over TLS
pub const DEFAULT_TLS_PORT: u16 = 12202;
/// Bound on establishing a connection (or, for UDP, on each datagram write)
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Bound on each individual TLS socket read or write once connected (not on a send as a whole)
pub const TLS_IO_DEADLINE: Duration = Duration::from_secs(10);

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       protocols & framing                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// How a [`Protocol`] delimits payloads on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// The whole payload in a single write; the connection delimits it
    Stream,
    /// One datagram per payload, or per chunk for payloads that don't fit in one
    Datagram,
}

/// The ways in which we can reach a collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Tls,
    #[default]
    Udp,
}

impl Protocol {
    pub fn framing(&self) -> Framing {
        match self {
            Protocol::Tcp | Protocol::Tls => Framing::Stream,
            Protocol::Udp => Framing::Datagram,
        }
    }
    /// The port on `endpoint` that speaks this protocol
    pub fn port(&self, endpoint: &Endpoint) -> u16 {
        match self {
            Protocol::Tcp | Protocol::Udp => endpoint.port,
            Protocol::Tls => endpoint.tls_port,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Protocol::Tcp => "GelfTCP",
                Protocol::Tls => "GelfTLS",
                Protocol::Udp => "GelfUDP",
            }
        )
    }
}

impl std::str::FromStr for Protocol {
    type Err = Error;
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" | "gelftcp" => Ok(Protocol::Tcp),
            "tls" | "gelftls" => Ok(Protocol::Tls),
            "udp" | "gelfudp" => Ok(Protocol::Udp),
            _ => Err(Error::UnsupportedProtocol {
                name: s.to_owned(),
                back: Backtrace::new(),
            }),
        }
    }
}

/// Where the collector lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    /// TCP & UDP
    pub port: u16,
    pub tls_port: u16,
}

impl std::default::Default for Endpoint {
    fn default() -> Self {
        Endpoint::new(DEFAULT_HOST)
    }
}

impl Endpoint {
    /// `host` on the standard ports
    pub fn new<H: Into<String>>(host: H) -> Endpoint {
        Endpoint {
            host: host.into(),
            port: DEFAULT_PORT,
            tls_port: DEFAULT_TLS_PORT,
        }
    }
    pub fn with_port(mut self, port: u16) -> Endpoint {
        self.port = port;
        self
    }
    pub fn with_tls_port(mut self, tls_port: u16) -> Endpoint {
        self.tls_port = tls_port;
        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Make exactly one attempt at writing `buf`, returning the number of bytes the transport
    /// accepted. Callers decide what a short count means.
    fn send(&mut self, buf: &[u8]) -> Result<usize>;
}

fn connect_error<E: std::error::Error + Send + Sync + 'static>(
    host: &str,
    port: u16,
    err: E,
) -> Error {
    Error::Connect {
        addr: format!("{}:{}", host, port),
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|err| connect_error(host, port, err))?
        .collect();
    if addrs.is_empty() {
        return Err(connect_error(
            host,
            port,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        ));
    }
    Ok(addrs)
}

/// Try each address `host` resolves to, in turn, until one accepts a connection.
fn connect_tcp(host: &str, port: u16) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in resolve(host, port)? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(sock) => return Ok(sock),
            Err(err) => last_err = Some(err),
        }
    }
    Err(connect_error(
        host,
        port,
        last_err.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::NotConnected)),
    ))
}

/// Sending GELF payloads via TCP streams
pub struct TcpTransport {
    socket: TcpStream,
}

impl TcpTransport {
    /// Connect to `host`:`port`, giving up after [`CONNECT_TIMEOUT`].
    pub fn new(host: &str, port: u16) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: connect_tcp(host, port)?,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.socket.write(buf).map_err(Error::io)?;
        self.socket.flush().map_err(Error::io)?;
        Ok(n)
    }
}

/// A [`ClientConfig`] trusting the platform's root certificates.
///
/// Certificates the platform store holds but that can't be parsed are skipped.
pub fn default_tls_config() -> Arc<ClientConfig> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(added, ignored, "loaded platform trust roots");
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

/// Sending GELF payloads via TLS over TCP
pub struct TlsTransport {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsTransport {
    /// Connect to `host`:`port` & complete the TLS handshake.
    ///
    /// Once the TCP connection is up, each read & each write on the socket (including those of the
    /// handshake) is bounded by [`TLS_IO_DEADLINE`]. The bound is per operation, not a total: a
    /// peer that keeps accepting a trickle of bytes can stretch one send past it.
    pub fn new(host: &str, port: u16, config: Arc<ClientConfig>) -> Result<TlsTransport> {
        let server_name =
            ServerName::try_from(host.to_owned()).map_err(|err| Error::TlsHandshake {
                source: Box::new(err),
                back: Backtrace::new(),
            })?;
        let mut sock = connect_tcp(host, port)?;
        sock.set_read_timeout(Some(TLS_IO_DEADLINE))
            .and_then(|_| sock.set_write_timeout(Some(TLS_IO_DEADLINE)))
            .map_err(|err| connect_error(host, port, err))?;

        let mut conn = ClientConnection::new(config, server_name).map_err(|err| {
            Error::TlsHandshake {
                source: Box::new(err),
                back: Backtrace::new(),
            }
        })?;
        // Accept the whole payload in a single write, however large
        conn.set_buffer_limit(None);
        while conn.is_handshaking() {
            conn.complete_io(&mut sock)
                .map_err(|err| Error::TlsHandshake {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })?;
        }
        Ok(TlsTransport {
            stream: StreamOwned::new(conn, sock),
        })
    }
}

impl Transport for TlsTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.stream.write(buf).map_err(Error::io)?;
        self.stream.flush().map_err(Error::io)?;
        Ok(n)
    }
}

/// Sending GELF payloads via UDP datagrams.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Fix the destination of an ephemeral UDP socket to `host`:`port`.
    ///
    /// Nothing goes over the wire, so success says nothing about whether anyone is listening.
    pub fn new(host: &str, port: u16) -> Result<UdpTransport> {
        let mut last_err = None;
        for addr in resolve(host, port)? {
            // Bind to any available port on the matching address family...
            let local: SocketAddr = match addr {
                SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
                SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
            };
            // and connect to the collector at `addr`:
            let attempt = UdpSocket::bind(local).and_then(|socket| {
                socket.set_write_timeout(Some(CONNECT_TIMEOUT))?;
                socket.connect(addr)?;
                Ok(socket)
            });
            match attempt {
                Ok(socket) => return Ok(UdpTransport { socket }),
                Err(err) => last_err = Some(err),
            }
        }
        Err(connect_error(
            host,
            port,
            last_err.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::NotConnected)),
        ))
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(Error::io)
    }
}

/// Open a connection to `endpoint` speaking `protocol`.
///
/// `tls` is only consulted for [`Protocol::Tls`]; if it's `None`, the platform trust roots are
/// loaded afresh.
pub fn connect(
    protocol: Protocol,
    endpoint: &Endpoint,
    tls: Option<&Arc<ClientConfig>>,
) -> Result<Box<dyn Transport>> {
    let host = endpoint.host.as_str();
    let port = protocol.port(endpoint);
    let conn: Box<dyn Transport> = match protocol {
        Protocol::Tcp => Box::new(TcpTransport::new(host, port)?),
        Protocol::Tls => Box::new(TlsTransport::new(
            host,
            port,
            tls.cloned().unwrap_or_else(default_tls_config),
        )?),
        Protocol::Udp => Box::new(UdpTransport::new(host, port)?),
    };
    debug!(%protocol, host, port, "connected to collector");
    Ok(conn)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            delivery                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

fn send_all_or_fail(transport: &mut dyn Transport, buf: &[u8]) -> Result<()> {
    let written = transport.send(buf)?;
    if written != buf.len() {
        return Err(Error::ShortWrite {
            written,
            expected: buf.len(),
            back: Backtrace::new(),
        });
    }
    Ok(())
}

/// Put `payload` on `transport`.
///
/// Stream framing, and datagram framing for payloads under [`UDP_CHUNK_MAX_SIZE`], write the
/// payload once. Larger datagram payloads are chunked under a fresh [`MessageId`] & each chunk
/// written as its own datagram. The first error (including a short write) ends the send; chunks
/// already written stay written.
pub fn deliver(payload: &[u8], framing: Framing, transport: &mut dyn Transport) -> Result<()> {
    match framing {
        Framing::Datagram if payload.len() >= UDP_CHUNK_MAX_SIZE => {
            let id = MessageId::generate()?;
            let frames = chunks(payload, id)?;
            trace!(len = payload.len(), chunks = frames.total(), "chunking payload");
            for frame in frames {
                send_all_or_fail(transport, &frame)?;
            }
            Ok(())
        }
        _ => {
            trace!(len = payload.len(), ?framing, "sending payload");
            send_all_or_fail(transport, payload)
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::chunk::{parse_frame, UDP_CHUNK_MAX_DATA_SIZE};

    use std::{io::Read, net::TcpListener, thread};

    /// Records everything it's handed; optionally comes up short on the `short_on`-th send.
    #[derive(Default)]
    struct Recorder {
        sent: Vec<Vec<u8>>,
        short_on: Option<usize>,
    }

    impl Transport for Recorder {
        fn send(&mut self, buf: &[u8]) -> Result<usize> {
            let n = if self.short_on == Some(self.sent.len()) {
                buf.len() - 1
            } else {
                buf.len()
            };
            self.sent.push(buf[..n].to_vec());
            Ok(n)
        }
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 253) as u8).collect()
    }

    #[test]
    fn protocols() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("GelfTLS".parse::<Protocol>().unwrap(), Protocol::Tls);
        assert_eq!("UDP".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!(matches!(
            "http".parse::<Protocol>(),
            Err(Error::UnsupportedProtocol { .. })
        ));
        let ep = Endpoint::default();
        assert_eq!(ep.host, "gra1.logs.ovh.com");
        assert_eq!(Protocol::Tcp.port(&ep), 2202);
        assert_eq!(Protocol::Udp.port(&ep), 2202);
        assert_eq!(Protocol::Tls.port(&ep), 12202);
        assert_eq!(Protocol::Tls.framing(), Framing::Stream);
        assert_eq!(Protocol::Udp.framing(), Framing::Datagram);
    }

    #[test]
    fn single_datagram_threshold() {
        let mut rec = Recorder::default();
        let data = payload(UDP_CHUNK_MAX_SIZE - 1);
        deliver(&data, Framing::Datagram, &mut rec).unwrap();
        assert_eq!(rec.sent, vec![data]);

        let mut rec = Recorder::default();
        let data = payload(UDP_CHUNK_MAX_SIZE);
        deliver(&data, Framing::Datagram, &mut rec).unwrap();
        assert_eq!(rec.sent.len(), 2);
        let first = parse_frame(&rec.sent[0]).unwrap();
        let second = parse_frame(&rec.sent[1]).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!((first.seq, first.total), (0, 2));
        assert_eq!((second.seq, second.total), (1, 2));
        assert_eq!(first.data, &data[..UDP_CHUNK_MAX_DATA_SIZE]);
        assert_eq!(second.data, &data[UDP_CHUNK_MAX_DATA_SIZE..]);
    }

    #[test]
    fn streams_are_never_chunked() {
        let mut rec = Recorder::default();
        let data = payload(100_000);
        deliver(&data, Framing::Stream, &mut rec).unwrap();
        assert_eq!(rec.sent, vec![data]);
    }

    #[test]
    fn fresh_id_per_send() {
        let data = payload(3 * UDP_CHUNK_MAX_DATA_SIZE);
        let mut a = Recorder::default();
        let mut b = Recorder::default();
        deliver(&data, Framing::Datagram, &mut a).unwrap();
        deliver(&data, Framing::Datagram, &mut b).unwrap();
        assert_ne!(
            parse_frame(&a.sent[0]).unwrap().id,
            parse_frame(&b.sent[0]).unwrap().id
        );
    }

    #[test]
    fn short_writes_abort() {
        let mut rec = Recorder {
            short_on: Some(0),
            ..Default::default()
        };
        match deliver(b"hello", Framing::Stream, &mut rec) {
            Err(Error::ShortWrite {
                written, expected, ..
            }) => assert_eq!((written, expected), (4, 5)),
            _ => panic!("expected a short write"),
        }

        // A short write on the second of four chunks means the last two are never sent
        let mut rec = Recorder {
            short_on: Some(1),
            ..Default::default()
        };
        let data = payload(4 * UDP_CHUNK_MAX_DATA_SIZE);
        assert!(matches!(
            deliver(&data, Framing::Datagram, &mut rec),
            Err(Error::ShortWrite { .. })
        ));
        assert_eq!(rec.sent.len(), 2);
    }

    #[test]
    fn oversized_payloads_send_nothing() {
        let mut rec = Recorder::default();
        let data = payload(128 * UDP_CHUNK_MAX_DATA_SIZE + 1);
        assert!(matches!(
            deliver(&data, Framing::Datagram, &mut rec),
            Err(Error::PayloadTooLarge { .. })
        ));
        assert!(rec.sent.is_empty());
    }

    #[test]
    fn tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            sock.read_to_end(&mut buf).unwrap();
            buf
        });

        let data = payload(50_000);
        {
            let ep = Endpoint::new("127.0.0.1").with_port(port);
            let mut conn = connect(Protocol::Tcp, &ep, None).unwrap();
            deliver(&data, Protocol::Tcp.framing(), conn.as_mut()).unwrap();
            // dropping `conn` closes the connection
        }
        assert_eq!(server.join().unwrap(), data);
    }

    #[test]
    fn udp_round_trip() {
        let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
        collector
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let port = collector.local_addr().unwrap().port();
        let ep = Endpoint::new("127.0.0.1").with_port(port);

        let small = payload(200);
        let mut conn = connect(Protocol::Udp, &ep, None).unwrap();
        deliver(&small, Framing::Datagram, conn.as_mut()).unwrap();
        let mut buf = [0u8; 2048];
        let n = collector.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], &small[..]);

        let large = payload(3000);
        let mut conn = connect(Protocol::Udp, &ep, None).unwrap();
        deliver(&large, Framing::Datagram, conn.as_mut()).unwrap();
        let mut out = Vec::new();
        for seq in 0..3u8 {
            let n = collector.recv(&mut buf).unwrap();
            assert!(n <= UDP_CHUNK_MAX_SIZE);
            let frame = parse_frame(&buf[..n]).unwrap();
            // Loopback preserves ordering
            assert_eq!((frame.seq, frame.total), (seq, 3));
            out.extend_from_slice(frame.data);
        }
        assert_eq!(out, large);
    }

    #[test]
    fn connection_refused() {
        // Grab a free port, then let it go
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let ep = Endpoint::new("127.0.0.1").with_port(port);
        assert!(matches!(
            connect(Protocol::Tcp, &ep, None),
            Err(Error::Connect { .. })
        ));
    }

    #[test]
    fn tls_handshake_failure() {
        // A "collector" that hangs up without saying anything
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (sock, _) = listener.accept().unwrap();
            drop(sock);
        });
        let ep = Endpoint::new("localhost").with_tls_port(port);
        let config = Arc::new(
            ClientConfig::builder()
                .with_root_certificates(RootCertStore::empty())
                .with_no_client_auth(),
        );
        match connect(Protocol::Tls, &ep, Some(&config)) {
            Err(Error::TlsHandshake { .. }) => (),
            Err(err) => panic!("expected a handshake failure, got {}", err),
            Ok(_) => panic!("expected a handshake failure"),
        }
        server.join().unwrap();
    }
}
