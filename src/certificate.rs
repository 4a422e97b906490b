//! Certificate metadata and the provider that fetches it.
//!
//! [`OpensslProvider`] connects to the target, completes a TLS handshake with
//! verification disabled so expired or self-signed certificates can still be
//! inspected, and reads the peer's leaf certificate.

use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::ssl::{Ssl, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::{X509NameRef, X509Ref};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::NetViewerError;

static TIMEOUT: u64 = 30;
static DEFAULT_PORT: u16 = 443;

/// Certificate metadata as shown by the lookup view.
///
/// Every field is optional; the view renders a missing one as `Unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    /// ISO-8601, UTC with a `Z` suffix
    pub not_before: Option<String>,
    /// ISO-8601, UTC with a `Z` suffix
    pub not_after: Option<String>,
    pub days_until_expiry: Option<i64>,
    pub version: Option<String>,
    pub serial_number: Option<String>,
}

impl CertificateInfo {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.issuer.is_none()
            && self.not_before.is_none()
            && self.not_after.is_none()
            && self.days_until_expiry.is_none()
            && self.version.is_none()
            && self.serial_number.is_none()
    }

    /// Extracts the displayed fields from a parsed certificate.
    pub fn from_x509(cert: &X509Ref, now: DateTime<Utc>) -> CertificateInfo {
        let not_after = asn1_to_utc(cert.not_after());
        CertificateInfo {
            subject: format_name(cert.subject_name()),
            issuer: format_name(cert.issuer_name()),
            not_before: asn1_to_utc(cert.not_before()).map(to_iso),
            not_after: not_after.map(to_iso),
            days_until_expiry: not_after.map(|expiry| (expiry - now).num_days()),
            version: Some((cert.version() + 1).to_string()),
            serial_number: cert
                .serial_number()
                .to_bn()
                .and_then(|bn| bn.to_hex_str().map(|hex| hex.to_string()))
                .ok()
                .map(|hex| colon_hex(&hex)),
        }
    }
}

/// Something that can fetch certificate metadata for a domain.
///
/// `Ok(None)` means the provider answered without data; callers treat it the
/// same as an error.
pub trait CertificateProvider: Send {
    fn check_certificate(&self, domain: &str) -> Result<Option<CertificateInfo>, NetViewerError>;
}

impl<F> CertificateProvider for F
where
    F: Fn(&str) -> Result<Option<CertificateInfo>, NetViewerError> + Send,
{
    fn check_certificate(&self, domain: &str) -> Result<Option<CertificateInfo>, NetViewerError> {
        self(domain)
    }
}

/// Host and port a lookup connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Accepts `host`, `host:port` or a URL. Scheme and path are dropped.
    pub fn parse(input: &str, default_port: u16) -> Result<Target, NetViewerError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(NetViewerError::InvalidInput {
                field: "domain".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };
        let url = Url::parse(&with_scheme).map_err(|e| NetViewerError::InvalidInput {
            field: "domain".to_string(),
            reason: e.to_string(),
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| NetViewerError::InvalidInput {
                field: "domain".to_string(),
                reason: "missing host".to_string(),
            })?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        Ok(Target {
            host,
            port: url.port().unwrap_or(default_port),
        })
    }

    fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Fetches certificates over a live TLS connection using OpenSSL.
#[derive(Debug, Clone)]
pub struct OpensslProvider {
    port: u16,
    timeout: Duration,
}

impl Default for OpensslProvider {
    fn default() -> Self {
        OpensslProvider {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(TIMEOUT),
        }
    }
}

impl OpensslProvider {
    pub fn new(port: u16, timeout: Duration) -> Self {
        OpensslProvider { port, timeout }
    }

    fn connect(&self, target: &Target) -> Result<CertificateInfo, NetViewerError> {
        let address = target.address();
        let socket_addr = address
            .to_socket_addrs()
            .map_err(|source| NetViewerError::DnsResolution {
                hostname: target.host.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| NetViewerError::DnsResolution {
                hostname: target.host.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            })?;

        debug!(%address, %socket_addr, "connecting");
        let tcp_stream = TcpStream::connect_timeout(&socket_addr, self.timeout).map_err(|source| {
            NetViewerError::ConnectionFailed {
                address: address.clone(),
                source,
            }
        })?;
        tcp_stream.set_read_timeout(Some(self.timeout))?;
        tcp_stream.set_write_timeout(Some(self.timeout))?;

        let mut context = SslContext::builder(SslMethod::tls())?;
        context.set_verify(SslVerifyMode::empty());
        let context = context.build();

        let mut connector = Ssl::new(&context)?;
        if target.host.parse::<IpAddr>().is_err() {
            connector.set_hostname(&target.host)?;
        }
        let stream = connector.connect(tcp_stream)?;

        let cert = stream
            .ssl()
            .peer_certificate()
            .ok_or_else(|| NetViewerError::CertificateError {
                reason: "Certificate not found".to_string(),
            })?;
        Ok(CertificateInfo::from_x509(&cert, Utc::now()))
    }
}

impl CertificateProvider for OpensslProvider {
    #[instrument(skip(self))]
    fn check_certificate(&self, domain: &str) -> Result<Option<CertificateInfo>, NetViewerError> {
        let target = Target::parse(domain, self.port)?;
        let info = self.connect(&target)?;
        Ok(if info.is_empty() { None } else { Some(info) })
    }
}

fn format_name(name: &X509NameRef) -> Option<String> {
    let parts: Vec<String> = name
        .entries()
        .filter_map(|entry| {
            let key = entry.object().nid().short_name().ok()?;
            let value = entry.data().to_string().ok()?;
            Some(format!("{}={}", key, value))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Option<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0).ok()?;
    let diff = epoch.diff(time).ok()?;
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);
    DateTime::from_timestamp(seconds, 0)
}

fn to_iso(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn colon_hex(hex: &str) -> String {
    let padded = if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else {
        hex.to_string()
    };
    padded
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_uppercase())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use openssl::bn::BigNum;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::PKey;
    use openssl::x509::{X509Builder, X509NameBuilder, X509};

    fn self_signed(common_name: &str, serial_hex: &str) -> X509 {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example Inc").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_hex_str(serial_hex).unwrap();
        builder
            .set_serial_number(&serial.to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder
            .set_not_before(&Asn1Time::from_str("20240101000000Z").unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_str("20250101000000Z").unwrap())
            .unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        builder.build()
    }

    #[test]
    fn test_from_x509_fields() {
        let cert = self_signed("example.com", "04A1B2");
        let now = Utc.with_ymd_and_hms(2024, 11, 17, 0, 0, 0).unwrap();
        let info = CertificateInfo::from_x509(&cert, now);

        assert_eq!(info.subject.as_deref(), Some("CN=example.com, O=Example Inc"));
        assert_eq!(info.issuer, info.subject);
        assert_eq!(info.not_before.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(info.not_after.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(info.days_until_expiry, Some(45));
        assert_eq!(info.version.as_deref(), Some("3"));
        assert_eq!(info.serial_number.as_deref(), Some("04:A1:B2"));
        assert!(!info.is_empty());
    }

    #[test]
    fn test_expired_certificate_has_negative_days() {
        let cert = self_signed("old.example", "01");
        let now = Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap();
        let info = CertificateInfo::from_x509(&cert, now);
        assert_eq!(info.days_until_expiry, Some(-10));
    }

    #[test]
    fn test_colon_hex_pads_odd_length() {
        assert_eq!(colon_hex("ABC"), "0A:BC");
        assert_eq!(colon_hex("04a1b2"), "04:A1:B2");
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            Target::parse("example.com", 443).unwrap(),
            Target {
                host: "example.com".to_string(),
                port: 443
            }
        );
        assert_eq!(Target::parse("example.com:8443", 443).unwrap().port, 8443);

        let target = Target::parse("https://secure.example.com:9443/path?q=1", 443).unwrap();
        assert_eq!(target.host, "secure.example.com");
        assert_eq!(target.port, 9443);

        let target = Target::parse("[::1]:8443", 443).unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.address(), "[::1]:8443");
    }

    #[test]
    fn test_target_rejects_blank() {
        assert!(matches!(
            Target::parse("   ", 443),
            Err(NetViewerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_default_certificate_info_is_empty() {
        assert!(CertificateInfo::default().is_empty());
    }
}
