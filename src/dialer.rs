//! The restricted dialer: resolve, validate, then connect.

use std::io;
use std::net::IpAddr;

use futures::future::BoxFuture;

use crate::addr::{join_host_port, parse_ip_literal, split_host_port, NetAddr};
use crate::check::AddrCheck;
use crate::config::DialPolicy;
use crate::connect::Connect;
use crate::context::DialContext;
use crate::error::Error;
use crate::resolve::{Resolve, SystemResolver};

/// A connect primitive that validates the address it connects to.
///
/// Dialing `"host:port"`:
/// 1. Splits the target into host and port.
/// 2. Uses the host directly if it is an IP literal (IPv6 literals may carry
///    a `%zone`), otherwise resolves it and keeps the first address returned.
/// 3. Runs every check against that address, in order, unless the context
///    carries a bypass.
/// 4. Calls the underlying connect primitive with the *validated* IP and the
///    original port.
///
/// Step 4 is what makes the dialer safe against DNS rebinding: the host name
/// is never handed to the connect primitive, so it cannot re-resolve to a
/// different address between validation and connection. This holds under
/// bypass too.
///
/// A dialer holds no mutable state and can be shared by any number of
/// concurrent dials.
///
/// # Example
///
/// ```rust,no_run
/// use dial_jail::{restricted_dial, AddrCheck, DialContext, TcpConnector};
///
/// # async fn example() -> Result<(), dial_jail::Error> {
/// let dialer = restricted_dial(TcpConnector, [AddrCheck::deny_private()]);
///
/// let _stream = dialer.dial(&DialContext::new(), "tcp", "example.com:443").await?;
///
/// // Fails: loopback is in a denied network.
/// let err = dialer.dial(&DialContext::new(), "tcp", "127.0.0.1:443").await.unwrap_err();
/// assert!(err.is_unauthorized());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestrictedDialer<C, R = SystemResolver> {
    connector: C,
    checks: Vec<AddrCheck>,
    resolver: R,
}

/// Wrap `connector` so that it only connects to addresses passing every
/// one of `checks`.
///
/// Host names are resolved with the platform resolver; use
/// [`RestrictedDialer::builder`] to pick another one.
pub fn restricted_dial<C: Connect>(
    connector: C,
    checks: impl IntoIterator<Item = AddrCheck>,
) -> RestrictedDialer<C> {
    RestrictedDialer::new(connector, checks)
}

impl<C: Connect> RestrictedDialer<C> {
    /// Same as [`restricted_dial`].
    pub fn new(connector: C, checks: impl IntoIterator<Item = AddrCheck>) -> Self {
        Self {
            connector,
            checks: checks.into_iter().collect(),
            resolver: SystemResolver,
        }
    }

    /// Start building a dialer around `connector`.
    pub fn builder(connector: C) -> RestrictedDialerBuilder<C> {
        RestrictedDialerBuilder {
            connector,
            checks: Vec::new(),
            resolver: SystemResolver,
        }
    }
}

impl<C: Connect, R: Resolve> RestrictedDialer<C, R> {
    /// The checks applied to every dial, in evaluation order.
    pub fn checks(&self) -> &[AddrCheck] {
        &self.checks
    }

    /// Connect to `address` ("host:port") on `network` after validating the
    /// address it resolves to.
    ///
    /// `cx` is passed unchanged to the resolver and the connect primitive.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `address` is not "host:port"
    /// - [`Error::Resolve`] or [`Error::NoAddresses`] if name resolution fails
    /// - [`Error::Unauthorized`] if a check rejects the address (not under bypass)
    /// - [`Error::Connect`] with the connect primitive's own error
    pub async fn dial(
        &self,
        cx: &DialContext,
        network: &str,
        address: &str,
    ) -> Result<C::Conn, Error> {
        let (host, port) = split_host_port(address)?;

        let (ip, zone) = match parse_ip_literal(host) {
            Some(literal) => literal,
            None => (self.resolve(cx, network, host).await?, None),
        };

        self.authorize(cx, network, address, ip)?;

        let target = match zone {
            Some(zone) => join_host_port(&format!("{}%{}", ip, zone), port),
            None => join_host_port(&ip.to_string(), port),
        };
        tracing::debug!(network, address, target = %target, "dialing validated address");

        self.connector
            .connect(cx, network, &target)
            .await
            .map_err(Error::Connect)
    }

    async fn resolve(&self, cx: &DialContext, network: &str, host: &str) -> Result<IpAddr, Error> {
        let ips = self.resolver.lookup_ip(cx, host).await.map_err(|source| {
            tracing::debug!(host, error = %source, "lookup failed");
            Error::Resolve {
                host: host.to_string(),
                source,
            }
        })?;

        let Some(&ip) = ips.first() else {
            return Err(Error::NoAddresses {
                network: network.to_string(),
                host: host.to_string(),
            });
        };

        tracing::debug!(host, %ip, count = ips.len(), "resolved");
        Ok(ip)
    }

    fn authorize(
        &self,
        cx: &DialContext,
        network: &str,
        address: &str,
        ip: IpAddr,
    ) -> Result<(), Error> {
        let addr = NetAddr::Ip(ip);
        for check in &self.checks {
            let Err(reason) = check.check(&addr) else {
                continue;
            };

            if cx.has_bypass() {
                tracing::debug!(network, address, %ip, %reason, "address check bypassed");
                continue;
            }

            tracing::warn!(network, address, %ip, %reason, "dial rejected by address check");
            return Err(Error::unauthorized(network, ip, address, reason));
        }
        Ok(())
    }
}

/// A restricted dialer is itself a connect primitive, so it can be used
/// anywhere one is expected.
///
/// Policy rejections surface as [`io::ErrorKind::PermissionDenied`]; errors
/// from the wrapped primitive and the resolver are returned as they are.
impl<C: Connect, R: Resolve> Connect for RestrictedDialer<C, R> {
    type Conn = C::Conn;

    fn connect<'a>(
        &'a self,
        cx: &'a DialContext,
        network: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, io::Result<C::Conn>> {
        Box::pin(async move { Ok(self.dial(cx, network, address).await?) })
    }
}

/// Builder for [`RestrictedDialer`].
///
/// # Example
///
/// ```rust
/// use dial_jail::{cidr, AddrCheck, RestrictedDialer, StaticResolver, TcpConnector};
///
/// let dialer = RestrictedDialer::builder(TcpConnector)
///     .check(AddrCheck::deny_private())
///     .check(AddrCheck::denylist([cidr("198.51.100.0/24")]))
///     .resolver(StaticResolver::new().with_host("api.test", ["203.0.113.7".parse().unwrap()]))
///     .build();
///
/// assert_eq!(dialer.checks().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RestrictedDialerBuilder<C, R = SystemResolver> {
    connector: C,
    checks: Vec<AddrCheck>,
    resolver: R,
}

impl<C: Connect, R: Resolve> RestrictedDialerBuilder<C, R> {
    /// Append a check.
    pub fn check(mut self, check: AddrCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Append several checks.
    pub fn checks(mut self, checks: impl IntoIterator<Item = AddrCheck>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Append the checks of a configured policy.
    pub fn policy(self, policy: &DialPolicy) -> Self {
        self.checks(policy.checks())
    }

    /// Resolve host names with `resolver` instead of the platform resolver.
    pub fn resolver<R2: Resolve>(self, resolver: R2) -> RestrictedDialerBuilder<C, R2> {
        RestrictedDialerBuilder {
            connector: self.connector,
            checks: self.checks,
            resolver,
        }
    }

    /// Build the dialer. It cannot be modified afterwards.
    pub fn build(self) -> RestrictedDialer<C, R> {
        RestrictedDialer {
            connector: self.connector,
            checks: self.checks,
            resolver: self.resolver,
        }
    }
}
