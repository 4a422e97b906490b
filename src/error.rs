//! Error types for NetViewer.
//!
//! Every fallible operation in the crate returns [`NetViewerError`]. The view
//! and the reminder builder contain these errors at their own boundary, so
//! they never escape a user action.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for certificate lookups, favicon fetches and reminder creation.
#[derive(Debug)]
pub enum NetViewerError {
    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// Certificate could not be read from the peer
    CertificateError {
        /// Description of what went wrong
        reason: String,
    },

    /// The provider answered without any usable certificate data
    NoCertificateData,

    /// Network operation timeout
    Timeout {
        /// Description of which operation timed out
        operation: String,
    },

    /// Invalid input provided to the API
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// HTTP request failed or answered with an unexpected status
    Http {
        /// What went wrong
        details: String,
    },

    /// Image payload could not be decoded
    ImageDecode {
        /// Decoder message
        details: String,
    },

    /// Calendar event could not be serialized or written
    Calendar {
        /// What went wrong
        reason: String,
    },

    /// The operating system refused to open a file
    OpenFailed {
        /// File that was handed off
        path: PathBuf,
        /// Why the handoff failed
        reason: String,
    },

    /// OpenSSL error occurred
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },

    /// A generic error with a custom message
    Other {
        /// Error message
        message: String,
    },
}

impl fmt::Display for NetViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { hostname, .. } => {
                write!(f, "Failed to resolve hostname: {}", hostname)
            }
            Self::ConnectionFailed { address, .. } => {
                write!(f, "Connection failed to: {}", address)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::CertificateError { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::NoCertificateData => {
                write!(f, "Failed to retrieve certificate information")
            }
            Self::Timeout { operation } => {
                write!(f, "Operation timed out: {}", operation)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::Http { details } => {
                write!(f, "HTTP error: {}", details)
            }
            Self::ImageDecode { details } => {
                write!(f, "Image decode error: {}", details)
            }
            Self::Calendar { reason } => {
                write!(f, "Calendar error: {}", reason)
            }
            Self::OpenFailed { path, reason } => {
                write!(f, "Failed to open {}: {}", path.display(), reason)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
            Self::Other { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for NetViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for NetViewerError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout {
                operation: e.to_string(),
            },
            _ => Self::IoError { source: e },
        }
    }
}

impl From<&str> for NetViewerError {
    fn from(s: &str) -> Self {
        Self::Other {
            message: s.to_string(),
        }
    }
}

impl From<String> for NetViewerError {
    fn from(s: String) -> Self {
        Self::Other { message: s }
    }
}

impl From<openssl::error::ErrorStack> for NetViewerError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl<S: std::fmt::Debug> From<openssl::ssl::HandshakeError<S>> for NetViewerError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: format!("{}", e),
        }
    }
}

impl From<reqwest::Error> for NetViewerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                operation: "favicon request".to_string(),
            }
        } else {
            Self::Http {
                details: e.to_string(),
            }
        }
    }
}

impl From<image::ImageError> for NetViewerError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageDecode {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetViewerError::InvalidInput {
            field: "domain".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid input for 'domain': cannot be empty");
    }

    #[test]
    fn test_no_data_message() {
        assert_eq!(
            NetViewerError::NoCertificateData.to_string(),
            "Failed to retrieve certificate information"
        );
    }

    #[test]
    fn test_error_from_str() {
        let err: NetViewerError = "test error".into();
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_timed_out_io_maps_to_timeout() {
        let err: NetViewerError = io::Error::new(io::ErrorKind::TimedOut, "read").into();
        assert!(matches!(err, NetViewerError::Timeout { .. }));
    }

    #[test]
    fn test_handshake_error_maps_to_handshake_failed() {
        let setup: openssl::ssl::HandshakeError<std::net::TcpStream> =
            openssl::ssl::HandshakeError::SetupFailure(openssl::error::ErrorStack::get());
        let err: NetViewerError = setup.into();
        assert!(matches!(
            &err,
            NetViewerError::HandshakeFailed { details } if details.starts_with("stream setup failed")
        ));
        assert!(err.to_string().starts_with("TLS handshake failed: "));
    }
}
