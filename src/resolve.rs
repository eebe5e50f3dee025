//! Name resolution for the restricted dialer.
//!
//! The dialer only needs one capability from a resolver: turn a host name
//! into an ordered list of IP addresses, within the limits of the caller's
//! [`DialContext`]. The dialer connects to the first address returned.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};

use futures::future::BoxFuture;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;

use crate::context::DialContext;

/// Translates host names into IP addresses.
///
/// Implementations must honor the deadline carried by `cx` (see
/// [`DialContext::run`]). Dropping the returned future cancels the lookup.
pub trait Resolve: Send + Sync {
    /// Look up the IP addresses of `host`, in preference order.
    fn lookup_ip<'a>(
        &'a self,
        cx: &'a DialContext,
        host: &'a str,
    ) -> BoxFuture<'a, io::Result<Vec<IpAddr>>>;
}

impl<T: Resolve + ?Sized> Resolve for Arc<T> {
    fn lookup_ip<'a>(
        &'a self,
        cx: &'a DialContext,
        host: &'a str,
    ) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        (**self).lookup_ip(cx, host)
    }
}

/// The platform resolver (`getaddrinfo`), run on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn lookup_ip<'a>(
        &'a self,
        cx: &'a DialContext,
        host: &'a str,
    ) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        Box::pin(async move {
            tracing::debug!(host = %host, "resolving via getaddrinfo");
            let addrs = cx.run(tokio::net::lookup_host((host, 0))).await?;
            let mut ips: Vec<IpAddr> = Vec::new();
            for addr in addrs {
                if !ips.contains(&addr.ip()) {
                    ips.push(addr.ip());
                }
            }
            Ok(ips)
        })
    }
}

/// An asynchronous resolver backed by hickory-dns.
///
/// All instances share one underlying resolver, built lazily from the
/// system DNS configuration, falling back to hickory's defaults when the
/// system configuration cannot be read.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: &'static LazyLock<TokioResolver>,
}

impl HickoryResolver {
    pub fn new() -> Self {
        static RESOLVER: LazyLock<TokioResolver> = LazyLock::new(|| {
            match TokioResolver::builder_tokio() {
                Ok(builder) => builder.build(),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read system DNS config, using defaults");
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                    .build()
                }
            }
        });

        Self {
            resolver: &RESOLVER,
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn lookup_ip<'a>(
        &'a self,
        cx: &'a DialContext,
        host: &'a str,
    ) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        Box::pin(async move {
            tracing::debug!(host = %host, "resolving via hickory-dns");
            let lookup = cx
                .run(async {
                    self.resolver
                        .lookup_ip(host)
                        .await
                        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))
                })
                .await?;
            Ok(lookup.iter().collect())
        })
    }
}

/// A fixed table of host names and their addresses.
///
/// Addresses are returned in the order they were inserted, which makes
/// "first address wins" deterministic. Unknown hosts fail with
/// [`io::ErrorKind::NotFound`].
///
/// ```rust
/// use dial_jail::StaticResolver;
///
/// let resolver = StaticResolver::new()
///     .with_host("api.internal", ["10.0.0.7".parse().unwrap()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the addresses of `host`. Host names are matched
    /// case-insensitively.
    pub fn with_host(mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.hosts
            .insert(host.to_lowercase(), ips.into_iter().collect());
        self
    }
}

impl Resolve for StaticResolver {
    fn lookup_ip<'a>(
        &'a self,
        _cx: &'a DialContext,
        host: &'a str,
    ) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        let result = self
            .hosts
            .get(&host.to_lowercase())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such host {}", host)));
        Box::pin(async move { result })
    }
}
