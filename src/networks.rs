//! Well-known IP networks.

use std::sync::LazyLock;

use ipnet::IpNet;

/// Standard IP networks used for private, loopback, link-local and
/// carrier-grade NAT addressing, plus the IPv4 unspecified address.
///
/// This is the usual argument to [`AddrCheck::denylist`](crate::AddrCheck::denylist)
/// when protecting a service against SSRF:
///
/// ```rust
/// use dial_jail::{AddrCheck, PRIVATE_IP_NETWORKS};
///
/// let check = AddrCheck::denylist(PRIVATE_IP_NETWORKS.iter().copied());
/// assert!(check.check(&"10.1.2.3".parse::<std::net::IpAddr>().unwrap().into()).is_err());
/// ```
pub static PRIVATE_IP_NETWORKS: LazyLock<Vec<IpNet>> = LazyLock::new(|| {
    [
        "0.0.0.0/32",
        "10.0.0.0/8",
        "100.64.0.0/10",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "fc00::/7",
        "fd00::/8",
        "fe80::/10",
        "::1/128",
    ]
    .into_iter()
    .map(cidr)
    .collect()
});

/// Parse a CIDR literal, panicking if it is malformed.
///
/// Meant for building constant network lists; use `str::parse` for input
/// that comes from outside the program.
///
/// # Panics
///
/// Panics if `s` is not a valid CIDR.
pub fn cidr(s: &str) -> IpNet {
    match s.parse() {
        Ok(net) => net,
        Err(e) => panic!("invalid CIDR {:?}: {}", s, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn is_private(ip: &str) -> bool {
        let ip: IpAddr = ip.parse().unwrap();
        PRIVATE_IP_NETWORKS.iter().any(|net| net.contains(&ip))
    }

    #[test]
    fn test_private_networks_count() {
        assert_eq!(PRIVATE_IP_NETWORKS.len(), 11);
    }

    #[test]
    fn test_private_networks_cover_defaults() {
        for ip in [
            "0.0.0.0",
            "10.10.10.10",
            "100.64.0.1",
            "127.0.0.1",
            "169.254.169.254",
            "172.16.42.1",
            "192.168.0.1",
            "::1",
            "fc00::1",
            "fd12:3456::1",
            "fe80::1",
        ] {
            assert!(is_private(ip), "{} should be private", ip);
        }
    }

    #[test]
    fn test_private_networks_boundaries() {
        assert!(!is_private("0.0.0.1"));
        assert!(!is_private("9.255.255.255"));
        assert!(!is_private("11.0.0.0"));
        assert!(!is_private("100.63.255.255"));
        assert!(is_private("100.127.255.255"));
        assert!(!is_private("100.128.0.0"));
        assert!(!is_private("172.15.255.255"));
        assert!(!is_private("172.32.0.0"));
        assert!(!is_private("192.169.0.0"));
        assert!(!is_private("fec0::1"));
    }

    #[test]
    fn test_public_addresses_not_private() {
        assert!(!is_private("93.184.216.34"));
        assert!(!is_private("8.8.8.8"));
        assert!(!is_private("2600:1901:0:94b6::"));
        assert!(!is_private("2001:4860:4860::8888"));
    }

    #[test]
    fn test_cidr_parses() {
        let net = cidr("10.0.0.0/8");
        assert_eq!(net.prefix_len(), 8);
    }

    #[test]
    #[should_panic(expected = "invalid CIDR")]
    fn test_cidr_panics_on_garbage() {
        cidr("not-a-cidr");
    }
}
