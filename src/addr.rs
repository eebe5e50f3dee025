//! Dial-style network addresses.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::Error;

const MISSING_PORT: &str = "missing port in address";
const TOO_MANY_COLONS: &str = "too many colons in address";

/// A network address as seen by an address check.
///
/// Checks only care about the IP, but the address keeps the shape it was
/// dialed with so that rejection messages name what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetAddr {
    /// A TCP endpoint.
    Tcp(SocketAddr),
    /// A UDP endpoint.
    Udp(SocketAddr),
    /// A bare IP address, as produced by name resolution.
    Ip(IpAddr),
    /// A Unix domain socket path. Carries no IP.
    Unix(PathBuf),
}

impl NetAddr {
    /// The IP address of this network address, if it has one.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Self::Tcp(addr) | Self::Udp(addr) => Some(addr.ip()),
            Self::Ip(ip) => Some(*ip),
            Self::Unix(_) => None,
        }
    }
}

impl From<IpAddr> for NetAddr {
    fn from(ip: IpAddr) -> Self {
        Self::Ip(ip)
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) | Self::Udp(addr) => write!(f, "{}", addr),
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Split a "host:port", "[host]:port" or "[host%zone]:port" string into
/// host and port.
///
/// The port is not interpreted; it is carried through to the connect
/// primitive as written.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the input is not of that shape.
pub fn split_host_port(address: &str) -> Result<(&str, &str), Error> {
    let invalid = |reason| Error::invalid_address(address, reason);

    let Some(colon) = address.rfind(':') else {
        return Err(invalid(MISSING_PORT));
    };

    // Byte offsets after which '[' and ']' must no longer appear.
    let (host, open_from, close_from) = if address.starts_with('[') {
        let Some(end) = address.find(']') else {
            return Err(invalid("missing ']' in address"));
        };
        if end + 1 == address.len() {
            return Err(invalid(MISSING_PORT));
        }
        if end + 1 != colon {
            return Err(if address.as_bytes()[end + 1] == b':' {
                invalid(TOO_MANY_COLONS)
            } else {
                invalid(MISSING_PORT)
            });
        }
        (&address[1..end], 1, end + 1)
    } else {
        let host = &address[..colon];
        if host.contains(':') {
            return Err(invalid(TOO_MANY_COLONS));
        }
        (host, 0, 0)
    };

    if address[open_from..].contains('[') {
        return Err(invalid("unexpected '[' in address"));
    }
    if address[close_from..].contains(']') {
        return Err(invalid("unexpected ']' in address"));
    }

    Ok((host, &address[colon + 1..]))
}

/// Parse `host` as an IP literal, splitting off the zone of a scoped IPv6
/// address (`fe80::1%eth0`).
///
/// Returns `None` for anything that has to go through name resolution.
pub(crate) fn parse_ip_literal(host: &str) -> Option<(IpAddr, Option<&str>)> {
    match host.split_once('%') {
        Some((ip, zone)) if !zone.is_empty() => {
            let ip: Ipv6Addr = ip.parse().ok()?;
            Some((IpAddr::V6(ip), Some(zone)))
        }
        Some(_) => None,
        None => host.parse().ok().map(|ip| (ip, None)),
    }
}

/// Join a host and a port into "host:port", bracketing hosts that contain
/// a colon (IPv6 literals).
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
