//! Report and result envelope types.
//!
//! A probe cycle always ends in a [`ResultEnvelope`]: either the extracted
//! [`CertificateReport`] or the error message, never both. Serialization is
//! deterministic: keys follow declaration order and indentation is fixed.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::error;

use crate::error::ProbeError;

/// Indentation of serialized documents.
const INDENT: &[u8] = b"    ";

/// Diagnostic fields of one probed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateReport {
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    pub serial_number: String,
    pub public_key_algorithm: String,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<String>,
    /// False only when explicit hostname verification against the leaf failed
    pub is_valid_hostname: bool,
    /// Presented certificates, leaf first, in handshake order
    pub chain: Vec<ChainEntry>,
}

/// One certificate of the presented chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEntry {
    #[serde(rename = "isCA")]
    pub is_ca: bool,
    pub issuer: String,
    /// Common name of the issuer
    pub common_name: String,
    pub expiration: String,
}

/// Outcome of one probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultEnvelope {
    Data(CertificateReport),
    Error(String),
}

impl ResultEnvelope {
    pub fn from_result(result: Result<CertificateReport, ProbeError>) -> Self {
        match result {
            Ok(report) => ResultEnvelope::Data(report),
            Err(e) => ResultEnvelope::Error(e.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultEnvelope::Error(_))
    }

    pub fn data(&self) -> Option<&CertificateReport> {
        match self {
            ResultEnvelope::Data(report) => Some(report),
            ResultEnvelope::Error(_) => None,
        }
    }

    /// Serializes the envelope as pretty JSON with a four-space indent.
    pub fn to_json(&self) -> Result<String, ProbeError> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
        self.serialize(&mut serializer)?;

        String::from_utf8(buffer).map_err(|e| ProbeError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Like [`to_json`](Self::to_json), but a failure is logged and turned
    /// into an error document so callers always get something to show.
    pub fn render(&self) -> String {
        match self.to_json() {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "Can not encode certificate info");
                error_document(e.to_string())
            }
        }
    }
}

fn error_document(message: String) -> String {
    match ResultEnvelope::Error(message.clone()).to_json() {
        Ok(document) => document,
        Err(_) => serde_json::json!({ "error": message }).to_string(),
    }
}

impl From<Result<CertificateReport, ProbeError>> for ResultEnvelope {
    fn from(result: Result<CertificateReport, ProbeError>) -> Self {
        ResultEnvelope::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> CertificateReport {
        CertificateReport {
            subject: "CN=example.com,O=Example".to_string(),
            issuer: "CN=Example CA".to_string(),
            not_before: "2024-January-02".to_string(),
            not_after: "2025-February-03".to_string(),
            serial_number: "4096".to_string(),
            public_key_algorithm: "ECDSA".to_string(),
            dns_names: vec!["example.com".to_string()],
            ip_addresses: vec![],
            is_valid_hostname: true,
            chain: vec![ChainEntry {
                is_ca: false,
                issuer: "CN=Example CA".to_string(),
                common_name: "Example CA".to_string(),
                expiration: "2025-February-03".to_string(),
            }],
        }
    }

    #[test]
    fn test_data_envelope_layout() {
        let json = ResultEnvelope::Data(sample_report()).to_json().unwrap();
        let expected = r#"{
    "data": {
        "subject": "CN=example.com,O=Example",
        "issuer": "CN=Example CA",
        "notBefore": "2024-January-02",
        "notAfter": "2025-February-03",
        "serialNumber": "4096",
        "publicKeyAlgorithm": "ECDSA",
        "dnsNames": [
            "example.com"
        ],
        "ipAddresses": [],
        "isValidHostname": true,
        "chain": [
            {
                "isCA": false,
                "issuer": "CN=Example CA",
                "commonName": "Example CA",
                "expiration": "2025-February-03"
            }
        ]
    }
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let envelope = ResultEnvelope::from_result(Err(ProbeError::Connection {
            address: "localhost:1".to_string(),
            reason: "Connection refused".to_string(),
        }));
        assert!(envelope.is_error());
        assert!(envelope.data().is_none());

        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(
            object["error"],
            "Connection to localhost:1 failed: Connection refused"
        );
    }

    #[test]
    fn test_serialization_is_stable() {
        let envelope = ResultEnvelope::Data(sample_report());
        assert_eq!(envelope.to_json().unwrap(), envelope.to_json().unwrap());
        assert_eq!(envelope.render(), envelope.to_json().unwrap());
    }

    #[test]
    fn test_error_document_escapes_control_characters() {
        let message = "bad \u{1b}[31mname\" \\ tab\t".to_string();
        let document = error_document(message.clone());

        let value: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(value["error"], message.as_str());
        assert!(document.contains("\\u001b"));
    }

    #[test]
    fn test_envelope_round_trips_through_json() {
        let envelope = ResultEnvelope::Data(sample_report());
        let parsed: ResultEnvelope = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }
}
