//! Endpoint parsing.
//!
//! Endpoints are given as `scheme://host[:port]`. Only `https` carries an
//! implicit port; any other scheme needs an explicit one, and a missing port
//! is left empty so that the probe fails when dialing.

use std::fmt;
use std::str::FromStr;

use url::{Host, Url};

use crate::error::ProbeError;

/// Port used for `https` endpoints that do not name one.
pub const DEFAULT_HTTPS_PORT: &str = "443";

/// A resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw: String,
    /// URI scheme, lower-cased by the parser
    pub scheme: String,
    /// Host name or IP literal, without IPv6 brackets
    pub host: String,
    /// Port as text; empty when none was given and the scheme has no default
    pub port: String,
}

impl Endpoint {
    /// Parses an endpoint string into host and port.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::MalformedEndpoint` when the string is not an
    /// absolute URI or has no host. A URI that parses but names no host, such
    /// as `file:///x` or `mailto:a@b`, counts as malformed and is never
    /// dialed.
    ///
    /// # Example
    ///
    /// ```
    /// # use certprobe::Endpoint;
    /// let endpoint = Endpoint::parse("https://example.com").unwrap();
    /// assert_eq!(endpoint.host, "example.com");
    /// assert_eq!(endpoint.port, "443");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let malformed = |reason: String| ProbeError::MalformedEndpoint {
            endpoint: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| malformed(e.to_string()))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(malformed("missing host".to_string())),
        };
        if host.is_empty() {
            return Err(malformed("missing host".to_string()));
        }

        // `Url::port` hides a port equal to the scheme default, which for
        // https is exactly the fallback below.
        let port = match url.port() {
            Some(port) => port.to_string(),
            None if url.scheme() == "https" => DEFAULT_HTTPS_PORT.to_string(),
            None => String::new(),
        };

        Ok(Endpoint {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    /// The `host:port` string used for dialing, with IPv6 hosts bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The endpoint exactly as it was given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Endpoint {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
