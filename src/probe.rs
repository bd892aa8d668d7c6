//! TLS connection and certificate chain retrieval.
//!
//! Peer verification is off: the probe describes whatever the server
//! presents, including self-signed, expired or mismatched certificates. Trust
//! is never evaluated here.

use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use openssl::ssl::{Ssl, SslContext, SslMethod, SslStream, SslVerifyMode};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::ProbeError;

/// Certificates exactly as presented during the handshake, leaf first, DER
/// encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerChain {
    certificates: Vec<Vec<u8>>,
}

impl PeerChain {
    pub fn new(certificates: Vec<Vec<u8>>) -> Self {
        PeerChain { certificates }
    }

    /// The end-entity certificate, if any was presented.
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certificates.first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.certificates.iter().map(Vec::as_slice)
    }
}

/// Connects to `endpoint` and returns the certificate chain it presents.
///
/// `timeout` bounds the whole exchange: every dial attempt and every
/// handshake read or write only gets what is left of it. The connection is
/// closed before this function returns, whatever the outcome. There are no
/// retries.
///
/// # Errors
///
/// Returns `ProbeError::Connection` when the port is missing or invalid, the
/// host cannot be resolved or reached, the handshake fails or times out, or
/// the peer sends no certificate.
pub fn fetch_chain(endpoint: &Endpoint, timeout: Duration) -> Result<PeerChain, ProbeError> {
    let address = endpoint.address();

    if endpoint.port.is_empty() {
        return Err(ProbeError::connection(&address, "missing port in address"));
    }
    let port: u16 = endpoint
        .port
        .parse()
        .map_err(|_| ProbeError::connection(&address, format!("invalid port {:?}", endpoint.port)))?;

    let deadline = Instant::now()
        .checked_add(timeout)
        .ok_or_else(|| ProbeError::connection(&address, format!("timeout {:?} is too large", timeout)))?;
    let tcp_stream = DeadlineStream {
        inner: connect(&endpoint.host, port, &address, deadline)?,
        deadline,
    };

    let mut context =
        SslContext::builder(SslMethod::tls()).map_err(|e| ProbeError::connection(&address, e))?;
    context.set_verify(SslVerifyMode::NONE);
    let context = context.build();

    let mut connector = Ssl::new(&context).map_err(|e| ProbeError::connection(&address, e))?;
    // SNI carries DNS names only.
    if endpoint.host.parse::<IpAddr>().is_err() {
        connector
            .set_hostname(&endpoint.host)
            .map_err(|e| ProbeError::connection(&address, e))?;
    }

    let mut stream = connector
        .connect(tcp_stream)
        .map_err(|e| ProbeError::connection(&address, format!("TLS handshake failed: {}", e)))?;

    let chain = peer_chain(&stream).map_err(|reason| ProbeError::connection(&address, reason));

    // Best effort; dropping the stream closes the socket either way.
    if let Err(e) = stream.shutdown() {
        debug!(%address, error = %e, "close_notify not delivered");
    }

    let chain = chain?;
    debug!(%address, certificates = chain.len(), "handshake complete");
    Ok(chain)
}

fn connect(
    host: &str,
    port: u16,
    address: &str,
    deadline: Instant,
) -> Result<TcpStream, ProbeError> {
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| ProbeError::connection(address, e))?
        .collect();

    let mut last_error = None;
    for socket_addr in candidates {
        let left = match remaining(deadline) {
            Ok(left) => left,
            Err(e) => {
                last_error = Some(e);
                break;
            }
        };
        debug!(%address, %socket_addr, ?left, "dialing");
        match TcpStream::connect_timeout(&socket_addr, left) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => ProbeError::connection(address, e),
        None => ProbeError::connection(address, "no addresses found for host"),
    })
}

/// Time left before `deadline`, or `TimedOut` once it has passed.
fn remaining(deadline: Instant) -> io::Result<Duration> {
    match deadline.checked_duration_since(Instant::now()) {
        Some(left) if !left.is_zero() => Ok(left),
        _ => Err(io::Error::new(io::ErrorKind::TimedOut, "probe deadline exceeded")),
    }
}

/// A TCP stream whose every read and write is limited to the time left
/// before a fixed deadline.
#[derive(Debug)]
struct DeadlineStream {
    inner: TcpStream,
    deadline: Instant,
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.set_read_timeout(Some(remaining(self.deadline)?))?;
        self.inner.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.set_write_timeout(Some(remaining(self.deadline)?))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn peer_chain<S>(stream: &SslStream<S>) -> Result<PeerChain, String> {
    let ssl = stream.ssl();

    // On the client side OpenSSL includes the leaf in the peer chain.
    let mut certificates = Vec::new();
    if let Some(chain) = ssl.peer_cert_chain() {
        for cert in chain {
            certificates.push(cert.to_der().map_err(|e| e.to_string())?);
        }
    }

    if certificates.is_empty() {
        let leaf = ssl
            .peer_certificate()
            .ok_or_else(|| "peer presented no certificate".to_string())?;
        certificates.push(leaf.to_der().map_err(|e| e.to_string())?);
    }

    Ok(PeerChain::new(certificates))
}
