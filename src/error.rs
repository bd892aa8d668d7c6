//! Error types for endpoint probing.
//!
//! This module defines the errors that can occur while resolving an endpoint,
//! connecting to it and turning the presented certificates into a report.
//! A hostname mismatch is absent: it is reported as a flag on a
//! successful report, never as an error.

use thiserror::Error;

/// Error type for a failed probe cycle.
///
/// Every variant ends up as the `error` field of a result envelope; nothing
/// here is fatal to the process.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The endpoint string is not a parseable `scheme://host[:port]` URI
    #[error("Malformed endpoint '{endpoint}': {reason}")]
    MalformedEndpoint {
        /// The endpoint as given by the caller
        endpoint: String,
        /// Why it could not be parsed
        reason: String,
    },

    /// DNS resolution, TCP connect, TLS handshake or a timeout failed
    #[error("Connection to {address} failed: {reason}")]
    Connection {
        /// The `host:port` that was dialed
        address: String,
        /// The underlying cause
        reason: String,
    },

    /// A certificate presented by the peer could not be decoded
    #[error("Certificate error: {reason}")]
    Certificate {
        /// Description of what went wrong
        reason: String,
    },

    /// The result envelope could not be serialized
    #[error("Serialization error: {reason}")]
    Serialization {
        /// The underlying encoder message
        reason: String,
    },
}

impl ProbeError {
    pub(crate) fn connection(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::MalformedEndpoint {
            endpoint: "::nope".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed endpoint '::nope': relative URL without a base"
        );
    }

    #[test]
    fn test_connection_helper() {
        let err = ProbeError::connection("localhost:1", "Connection refused");
        assert_eq!(
            err.to_string(),
            "Connection to localhost:1 failed: Connection refused"
        );
    }
}
