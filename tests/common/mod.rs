//! Test certificates and a local TLS server.

#![allow(dead_code)]

use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509};

pub const ORGANIZATION: &str = "certprobe tests";

pub struct Identity {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// What goes into a generated certificate.
pub struct Template<'a> {
    pub common_name: &'a str,
    pub dns_names: &'a [&'a str],
    pub ip_addresses: &'a [&'a str],
    pub serial: u32,
    pub is_ca: bool,
    pub not_before: Asn1Time,
    pub not_after: Asn1Time,
}

impl<'a> Template<'a> {
    pub fn new(common_name: &'a str) -> Self {
        Template {
            common_name,
            dns_names: &[],
            ip_addresses: &[],
            serial: 1,
            is_ca: false,
            not_before: Asn1Time::days_from_now(0).unwrap(),
            not_after: Asn1Time::days_from_now(30).unwrap(),
        }
    }
}

fn generate_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(common_name: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder
        .append_entry_by_nid(Nid::ORGANIZATIONNAME, ORGANIZATION)
        .unwrap();
    builder
        .append_entry_by_nid(Nid::COMMONNAME, common_name)
        .unwrap();
    builder.build()
}

fn build(template: &Template<'_>, key: &PKey<Private>, issuer: Option<&Identity>) -> X509 {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(template.serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();

    let subject = name(template.common_name);
    builder.set_subject_name(&subject).unwrap();
    match issuer {
        Some(issuer) => builder.set_issuer_name(issuer.cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&subject).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&template.not_before).unwrap();
    builder.set_not_after(&template.not_after).unwrap();

    if template.is_ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }

    if !template.dns_names.is_empty() || !template.ip_addresses.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in template.dns_names {
            san.dns(dns);
        }
        for ip in template.ip_addresses {
            san.ip(ip);
        }
        let extension = san
            .build(&builder.x509v3_context(issuer.map(|i| &*i.cert), None))
            .unwrap();
        builder.append_extension(extension).unwrap();
    }

    let signing_key = issuer.map(|i| &i.key).unwrap_or(key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn self_signed(template: Template<'_>) -> Identity {
    let key = generate_key();
    let cert = build(&template, &key, None);
    Identity { cert, key }
}

pub fn issued_by(template: Template<'_>, issuer: &Identity) -> Identity {
    let key = generate_key();
    let cert = build(&template, &key, Some(issuer));
    Identity { cert, key }
}

pub fn past(days_ago: i64) -> Asn1Time {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    Asn1Time::from_unix(now - days_ago * 86_400).unwrap()
}

pub fn date_of(time: &Asn1TimeRef) -> String {
    let epoch = Asn1Time::from_unix(0).unwrap();
    let diff = epoch.diff(time).unwrap();
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    chrono::DateTime::from_timestamp(seconds, 0)
        .unwrap()
        .format("%Y-%B-%d")
        .to_string()
}

/// Serves `leaf` followed by `extra` on an ephemeral localhost port, accepting
/// connections until the test process exits. Returns the port.
pub fn serve(leaf: &Identity, extra: &[&X509]) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&leaf.key).unwrap();
    acceptor.set_certificate(&leaf.cert).unwrap();
    for cert in extra {
        acceptor.add_extra_chain_cert((*cert).clone()).unwrap();
    }
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            if let Ok(mut tls) = acceptor.accept(stream) {
                let _ = tls.shutdown();
            }
        }
    });

    port
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A listener that completes TCP connects but never answers the handshake.
pub fn silent_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A listener that starts a TLS record announcing 200 bytes, then sends one
/// byte every 150ms, so no single read ever times out.
pub fn trickle_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            thread::spawn(move || {
                if stream.write_all(&[0x16, 0x03, 0x03, 0x00, 0xc8]).is_err() {
                    return;
                }
                for _ in 0..200 {
                    thread::sleep(Duration::from_millis(150));
                    if stream.write_all(&[0]).is_err() {
                        return;
                    }
                }
            });
        }
    });

    port
}
