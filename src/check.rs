//! Address checks: allow and deny lists of IP networks.
//!
//! A check is a pure function of the address it is given and the networks
//! it was built with. Checks never change after construction, so a single
//! check can be shared by every concurrent dial.
//!
//! IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are matched as the IPv4
//! address they embed, so `::ffff:127.0.0.1` falls in `127.0.0.0/8`.

use ipnet::IpNet;
use thiserror::Error;

use crate::addr::NetAddr;
use crate::networks::PRIVATE_IP_NETWORKS;

/// Why an address check rejected an address.
///
/// Every message starts with `"unauthorized "`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The address is in none of the networks of an allow list.
    #[error("unauthorized attempt to connect to an address not in an allowed network ({addr})")]
    NotAllowed { addr: NetAddr },

    /// The address is in one of the networks of a deny list.
    #[error("unauthorized attempt to connect to an address in a denied network ({addr} in {network})")]
    Denied { addr: NetAddr, network: IpNet },
}

/// A validation rule applied to the address a dialer is about to connect to.
///
/// # Example
///
/// ```rust
/// use dial_jail::{cidr, AddrCheck};
///
/// let check = AddrCheck::allowlist([cidr("10.0.0.0/8")]);
///
/// assert!(check.check(&"10.1.2.3".parse::<std::net::IpAddr>().unwrap().into()).is_ok());
/// assert!(check.check(&"8.8.8.8".parse::<std::net::IpAddr>().unwrap().into()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrCheck {
    /// Passes addresses contained in at least one of the networks.
    Allowlist(Vec<IpNet>),
    /// Passes addresses contained in none of the networks.
    Denylist(Vec<IpNet>),
}

impl AddrCheck {
    /// Build an allow list from a set of networks.
    pub fn allowlist(networks: impl IntoIterator<Item = IpNet>) -> Self {
        Self::Allowlist(networks.into_iter().collect())
    }

    /// Build a deny list from a set of networks.
    pub fn denylist(networks: impl IntoIterator<Item = IpNet>) -> Self {
        Self::Denylist(networks.into_iter().collect())
    }

    /// A deny list of [`PRIVATE_IP_NETWORKS`].
    pub fn deny_private() -> Self {
        Self::denylist(PRIVATE_IP_NETWORKS.iter().copied())
    }

    /// The networks this check matches against.
    pub fn networks(&self) -> &[IpNet] {
        match self {
            Self::Allowlist(nets) | Self::Denylist(nets) => nets,
        }
    }

    /// Validate `addr`.
    ///
    /// An address without an IP (a Unix socket path) matches no network:
    /// allow lists reject it and deny lists let it through.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] describing the violated rule.
    pub fn check(&self, addr: &NetAddr) -> Result<(), CheckError> {
        let ip = addr.ip().map(|ip| ip.to_canonical());
        let matching = |nets: &[IpNet]| -> Option<IpNet> {
            let ip = ip?;
            nets.iter().find(|net| net.contains(&ip)).copied()
        };

        match self {
            Self::Allowlist(nets) => match matching(nets) {
                Some(_) => Ok(()),
                None => Err(CheckError::NotAllowed { addr: addr.clone() }),
            },
            Self::Denylist(nets) => match matching(nets) {
                Some(network) => Err(CheckError::Denied {
                    addr: addr.clone(),
                    network,
                }),
                None => Ok(()),
            },
        }
    }
}

/// Shorthand for [`AddrCheck::allowlist`].
pub fn allowlist(networks: impl IntoIterator<Item = IpNet>) -> AddrCheck {
    AddrCheck::allowlist(networks)
}

/// Shorthand for [`AddrCheck::denylist`].
pub fn denylist(networks: impl IntoIterator<Item = IpNet>) -> AddrCheck {
    AddrCheck::denylist(networks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::cidr;

    fn ip(s: &str) -> NetAddr {
        NetAddr::Ip(s.parse().unwrap())
    }

    #[test]
    fn test_allowlist_passes_member() {
        let check = allowlist([cidr("10.0.0.0/8")]);
        assert!(check.check(&ip("10.1.2.3")).is_ok());
    }

    #[test]
    fn test_allowlist_rejects_non_member() {
        let check = allowlist([cidr("10.0.0.0/8")]);
        let err = check.check(&ip("8.8.8.8")).unwrap_err();
        assert_eq!(
            err,
            CheckError::NotAllowed {
                addr: ip("8.8.8.8")
            }
        );
        assert!(err.to_string().starts_with("unauthorized "));
        assert!(err.to_string().contains("not in an allowed network"));
    }

    #[test]
    fn test_allowlist_any_network_matches() {
        let check = allowlist([cidr("10.0.0.0/8"), cidr("2001:db8::/32")]);
        assert!(check.check(&ip("2001:db8::1")).is_ok());
        assert!(check.check(&ip("10.0.0.1")).is_ok());
        assert!(check.check(&ip("192.168.0.1")).is_err());
    }

    #[test]
    fn test_empty_allowlist_rejects_everything() {
        let check = allowlist([]);
        assert!(check.check(&ip("8.8.8.8")).is_err());
    }

    #[test]
    fn test_allowlist_rejects_address_without_ip() {
        let check = allowlist([cidr("0.0.0.0/0"), cidr("::/0")]);
        let unix = NetAddr::Unix("/run/app.sock".into());
        assert!(matches!(
            check.check(&unix),
            Err(CheckError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_denylist_rejects_member() {
        let check = AddrCheck::deny_private();
        let err = check.check(&ip("127.0.0.1")).unwrap_err();
        assert_eq!(
            err,
            CheckError::Denied {
                addr: ip("127.0.0.1"),
                network: cidr("127.0.0.0/8"),
            }
        );
        assert!(err.to_string().starts_with("unauthorized "));
        assert!(err.to_string().contains("in a denied network"));
        assert!(err.to_string().contains("127.0.0.0/8"));
    }

    #[test]
    fn test_denylist_passes_non_member() {
        let check = AddrCheck::deny_private();
        assert!(check.check(&ip("93.184.216.34")).is_ok());
        assert!(check.check(&ip("2600:1901:0:94b6::")).is_ok());
    }

    #[test]
    fn test_denylist_passes_address_without_ip() {
        let check = AddrCheck::deny_private();
        assert!(check.check(&NetAddr::Unix("/run/app.sock".into())).is_ok());
    }

    #[test]
    fn test_ipv4_mapped_ipv6_matches_ipv4_network() {
        let check = AddrCheck::deny_private();
        assert!(check.check(&ip("::ffff:127.0.0.1")).is_err());
        assert!(check.check(&ip("::ffff:192.168.1.1")).is_err());
        assert!(check.check(&ip("::ffff:93.184.216.34")).is_ok());

        let allow = allowlist([cidr("10.0.0.0/8")]);
        assert!(allow.check(&ip("::ffff:10.0.0.1")).is_ok());
    }

    #[test]
    fn test_socket_addresses_are_checked_by_ip() {
        let check = AddrCheck::deny_private();
        let tcp = NetAddr::Tcp("10.0.0.1:443".parse().unwrap());
        let udp = NetAddr::Udp("[fe80::1]:53".parse().unwrap());
        assert!(check.check(&tcp).is_err());
        assert!(check.check(&udp).is_err());
        assert!(check
            .check(&NetAddr::Tcp("8.8.8.8:53".parse().unwrap()))
            .is_ok());
    }

    #[test]
    fn test_check_is_deterministic() {
        let check = AddrCheck::deny_private();
        let addr = ip("172.16.42.1");
        let first = check.check(&addr);
        for _ in 0..10 {
            assert_eq!(check.check(&addr), first);
        }
    }

    #[test]
    fn test_networks_accessor() {
        let check = denylist([cidr("10.0.0.0/8")]);
        assert_eq!(check.networks(), &[cidr("10.0.0.0/8")]);
    }
}
