//! Hostname verification against a leaf certificate.
//!
//! Only Subject Alternative Names are consulted. DNS hosts match `dNSName`
//! entries exactly or through a wildcard that covers the whole left-most
//! label; IP hosts match `iPAddress` entries.

use std::net::IpAddr;

use thiserror::Error;
use x509_parser::prelude::*;

use super::san_ip;

/// The requested host is not covered by the leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("certificate is not valid for {host}")]
pub struct HostnameMismatch {
    pub host: String,
}

/// Checks `host` against the names of `leaf`.
pub fn verify(leaf: &X509Certificate<'_>, host: &str) -> Result<(), HostnameMismatch> {
    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Ok(Some(san)) = leaf.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push(*dns),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = san_ip(bytes) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    if matches_names(&dns_names, &ip_addresses, host) {
        Ok(())
    } else {
        Err(HostnameMismatch {
            host: host.to_string(),
        })
    }
}

pub(crate) fn matches_names(dns_names: &[&str], ip_addresses: &[IpAddr], host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip_addresses.contains(&ip);
    }

    dns_names
        .iter()
        .any(|pattern| matches_dns_name(pattern, host))
}

/// Matches one SAN pattern against a DNS host name.
///
/// A `*` is honoured only as the entire left-most label and stands for
/// exactly one non-empty label.
pub(crate) fn matches_dns_name(pattern: &str, host: &str) -> bool {
    let pattern = normalize(pattern);
    let host = normalize(host);
    if pattern.is_empty() || host.is_empty() {
        return false;
    }

    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = host.split('.').collect();
    if pattern_labels.len() != host_labels.len() {
        return false;
    }

    pattern_labels
        .iter()
        .zip(&host_labels)
        .enumerate()
        .all(|(i, (pattern_label, host_label))| {
            if host_label.is_empty() {
                false
            } else if i == 0 && *pattern_label == "*" {
                true
            } else {
                pattern_label == host_label
            }
        })
}

fn normalize(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case_and_trailing_dot() {
        assert!(matches_dns_name("example.com", "example.com"));
        assert!(matches_dns_name("Example.COM", "example.com"));
        assert!(matches_dns_name("example.com", "example.com."));
        assert!(!matches_dns_name("example.com", "example.org"));
    }

    #[test]
    fn test_wildcard_covers_one_label() {
        assert!(matches_dns_name("*.example.com", "www.example.com"));
        assert!(!matches_dns_name("*.example.com", "example.com"));
        assert!(!matches_dns_name("*.example.com", "a.b.example.com"));
        assert!(!matches_dns_name("www.*.com", "www.example.com"));
        assert!(!matches_dns_name("w*.example.com", "www.example.com"));
    }

    #[test]
    fn test_empty_labels_never_match() {
        assert!(!matches_dns_name("", "example.com"));
        assert!(!matches_dns_name("*.example.com", ".example.com"));
    }

    #[test]
    fn test_ip_host_uses_ip_entries_only() {
        let ips: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        assert!(matches_names(&["localhost"], &ips, "127.0.0.1"));
        assert!(matches_names(&[], &ips, "::1"));
        assert!(matches_names(&[], &ips, "[::1]"));
        assert!(!matches_names(&["127.0.0.2"], &ips, "127.0.0.2"));
    }

    #[test]
    fn test_dns_host_against_san_list() {
        let names = ["example.com", "*.example.net"];
        assert!(matches_names(&names, &[], "api.example.net"));
        assert!(!matches_names(&names, &[], "example.org"));
        assert!(!matches_names(&[], &[], "example.com"));
    }
}
