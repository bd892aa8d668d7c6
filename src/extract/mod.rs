//! Certificate field extraction.
//!
//! Maps the raw chain returned by the probe into a [`CertificateReport`].
//! Leaf fields come from the first certificate; every certificate, leaf
//! included, becomes one [`ChainEntry`] in presentation order.

pub mod hostname;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::DateTime;
use tracing::debug;
use x509_parser::prelude::*;

use crate::error::ProbeError;
use crate::probe::PeerChain;
use crate::report::{CertificateReport, ChainEntry};

/// Calendar format used for every date in a report, e.g. `2024-January-02`.
pub const DATE_FORMAT: &str = "%Y-%B-%d";

/// Builds the report for `chain`, verifying `host` against the leaf.
///
/// # Errors
///
/// Returns `ProbeError::Certificate` when the chain is empty or one of its
/// certificates cannot be decoded. A hostname mismatch is not an error.
pub fn build_report(chain: &PeerChain, host: &str) -> Result<CertificateReport, ProbeError> {
    let leaf_der = chain.leaf().ok_or_else(|| ProbeError::Certificate {
        reason: "empty certificate chain".to_string(),
    })?;
    let leaf = parse(leaf_der)?;

    let is_valid_hostname = match hostname::verify(&leaf, host) {
        Ok(()) => true,
        Err(mismatch) => {
            debug!(%mismatch, "hostname verification failed");
            false
        }
    };

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Ok(Some(san)) = leaf.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                GeneralName::IPAddress(bytes) => ip_addresses.push(format_ip(bytes)),
                _ => {}
            }
        }
    }

    let entries = chain
        .iter()
        .map(|der| parse(der).map(|cert| chain_entry(&cert)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CertificateReport {
        subject: format_dn(leaf.subject()),
        issuer: format_dn(leaf.issuer()),
        not_before: format_time(&leaf.validity().not_before),
        not_after: format_time(&leaf.validity().not_after),
        serial_number: leaf.tbs_certificate.serial.to_str_radix(10),
        public_key_algorithm: public_key_algorithm(&leaf).to_string(),
        dns_names,
        ip_addresses,
        is_valid_hostname,
        chain: entries,
    })
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>, ProbeError> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| ProbeError::Certificate {
            reason: format!("failed to parse certificate: {}", e),
        })
}

fn chain_entry(cert: &X509Certificate<'_>) -> ChainEntry {
    let is_ca = cert
        .basic_constraints()
        .ok()
        .flatten()
        .map(|bc| bc.value.ca)
        .unwrap_or(false);

    let common_name = cert
        .issuer()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    ChainEntry {
        is_ca,
        issuer: format_dn(cert.issuer()),
        common_name,
        expiration: format_time(&cert.validity().not_after),
    }
}

fn public_key_algorithm(cert: &X509Certificate<'_>) -> &'static str {
    match cert.public_key().algorithm.algorithm.to_id_string().as_str() {
        "1.2.840.113549.1.1.1" => "RSA",
        "1.2.840.10045.2.1" => "ECDSA",
        "1.3.101.112" => "Ed25519",
        "1.2.840.10040.4.1" => "DSA",
        _ => "Unknown",
    }
}

/// Renders a distinguished name in RFC 4514 form: most specific RDN first,
/// `,` between RDNs and `+` inside multi-valued ones.
pub fn format_dn(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let oid = attr.attr_type().to_id_string();
                    let value = match attr.as_str() {
                        Ok(value) => escape_dn_value(value),
                        Err(_) => format!("#{}", hex(attr.attr_value().as_bytes())),
                    };
                    match attribute_name(&oid) {
                        Some(short) => format!("{}={}", short, value),
                        None => format!("{}={}", oid, value),
                    }
                })
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();

    rdns.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn attribute_name(oid: &str) -> Option<&'static str> {
    let name = match oid {
        "2.5.4.3" => "CN",
        "2.5.4.5" => "SERIALNUMBER",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "2.5.4.17" => "POSTALCODE",
        "0.9.2342.19200300.100.1.1" => "UID",
        "0.9.2342.19200300.100.1.25" => "DC",
        _ => return None,
    };
    Some(name)
}

pub(crate) fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == ' ' || c == '#'))
            || (i == last && c == ' ');
        if special {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn format_time(time: &ASN1Time) -> String {
    match DateTime::from_timestamp(time.timestamp(), 0) {
        Some(datetime) => datetime.format(DATE_FORMAT).to_string(),
        None => time.to_string(),
    }
}

pub(crate) fn san_ip(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

fn format_ip(bytes: &[u8]) -> String {
    san_ip(bytes)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| hex(bytes))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
