//! Error types for dial_jail.

use std::io;
use std::net::IpAddr;

use thiserror::Error;

use crate::check::CheckError;

/// Errors that can occur while dialing through a [`RestrictedDialer`](crate::RestrictedDialer).
#[derive(Debug, Error)]
pub enum Error {
    /// The target is not a valid "host:port" string.
    #[error("address {address}: {reason}")]
    InvalidAddress { address: String, reason: &'static str },

    /// The resolver failed to translate the host name.
    #[error("lookup {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// The resolver succeeded but returned no address.
    #[error("lookup {host} on {network}: no addresses returned by the resolver")]
    NoAddresses { network: String, host: String },

    /// An address check rejected the resolved address.
    #[error("{op} {network} {ip}: address {address}: {source}")]
    Unauthorized {
        op: &'static str,
        network: String,
        ip: IpAddr,
        address: String,
        #[source]
        source: CheckError,
    },

    /// The underlying connect primitive failed.
    #[error(transparent)]
    Connect(io::Error),

    /// A policy file could not be parsed.
    #[error("invalid dial policy: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid_address(address: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason,
        }
    }

    pub(crate) fn unauthorized(
        network: impl Into<String>,
        ip: IpAddr,
        address: impl Into<String>,
        source: CheckError,
    ) -> Self {
        Self::Unauthorized {
            op: "dial",
            network: network.into(),
            ip,
            address: address.into(),
            source,
        }
    }

    /// Whether this error is a policy rejection rather than an
    /// infrastructure failure (bad input, DNS, connect).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The rule violation behind a policy rejection.
    pub fn check_error(&self) -> Option<&CheckError> {
        match self {
            Self::Unauthorized { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Connect(e) | Error::Resolve { source: e, .. } => e,
            Error::InvalidAddress { .. } | Error::Config(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            Error::NoAddresses { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            Error::Unauthorized { .. } => io::Error::new(io::ErrorKind::PermissionDenied, err),
        }
    }
}
