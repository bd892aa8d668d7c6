//! certprobe - inspect the TLS certificates presented by remote endpoints.
//!
//! A probe opens a TLS connection with peer verification disabled, captures the
//! certificate chain exactly as the server sends it and reports the leaf's
//! details, the chain and whether the leaf matches the requested host. Every
//! probe ends in a [`ResultEnvelope`] holding either the report or the error.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let document = certprobe::check_json("https://example.com", Duration::from_secs(10));
//! println!("{}", document);
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod logging;
pub mod probe;
pub mod report;
pub mod tui;

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info_span};

pub use endpoint::Endpoint;
pub use error::ProbeError;
pub use probe::PeerChain;
pub use report::{CertificateReport, ChainEntry, ResultEnvelope};

/// Resolves, probes and extracts one endpoint.
///
/// # Errors
///
/// `MalformedEndpoint` before any connection is attempted, `Connection` when
/// the endpoint cannot be reached or the handshake fails, `Certificate` when
/// the presented certificates cannot be decoded.
pub fn inspect(endpoint: &str, timeout: Duration) -> Result<CertificateReport, ProbeError> {
    let _span = info_span!("inspect", %endpoint).entered();

    let endpoint = Endpoint::parse(endpoint)?;
    let chain = probe::fetch_chain(&endpoint, timeout)?;
    extract::build_report(&chain, &endpoint.host)
}

/// Runs one full probe cycle and wraps the outcome.
pub fn check(endpoint: &str, timeout: Duration) -> ResultEnvelope {
    let envelope = ResultEnvelope::from_result(inspect(endpoint, timeout));
    debug!(%endpoint, failed = envelope.is_error(), "probe cycle finished");
    envelope
}

/// Runs one full probe cycle and returns the serialized document.
pub fn check_json(endpoint: &str, timeout: Duration) -> String {
    check(endpoint, timeout).render()
}

/// Checks every endpoint in order, writing one document per endpoint.
///
/// Probe failures become error documents; only a failing `out` stops the run.
pub fn run_oneshot<W: Write>(endpoints: &[String], timeout: Duration, out: &mut W) -> std::io::Result<()> {
    for endpoint in endpoints {
        writeln!(out, "{}", check_json(endpoint, timeout))?;
    }
    Ok(())
}
