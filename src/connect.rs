//! Connect primitives: the functions that actually open connections.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use futures::future::BoxFuture;
use tokio::net::TcpStream;

use crate::context::DialContext;

/// Opens a connection to `address` on `network`.
///
/// `address` is a "host:port" string. When called by a
/// [`RestrictedDialer`](crate::RestrictedDialer) the host is always an IP
/// literal. Implementations must honor the deadline carried by `cx`.
///
/// Closures of the shape `Fn(DialContext, String, String) -> impl Future`
/// implement this trait:
///
/// ```rust
/// use dial_jail::{Connect, DialContext};
///
/// fn assert_connect<C: Connect>(_: &C) {}
///
/// let connect = |_cx: DialContext, _network: String, address: String| async move {
///     Ok::<_, std::io::Error>(address)
/// };
/// assert_connect(&connect);
/// ```
pub trait Connect: Send + Sync {
    /// The connection type produced.
    type Conn;

    fn connect<'a>(
        &'a self,
        cx: &'a DialContext,
        network: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, io::Result<Self::Conn>>;
}

impl<F, Fut, C> Connect for F
where
    F: Fn(DialContext, String, String) -> Fut + Send + Sync,
    Fut: Future<Output = io::Result<C>> + Send + 'static,
{
    type Conn = C;

    fn connect<'a>(
        &'a self,
        cx: &'a DialContext,
        network: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, io::Result<C>> {
        Box::pin(self(cx.clone(), network.to_owned(), address.to_owned()))
    }
}

/// Opens TCP connections with tokio.
///
/// Accepts the networks `"tcp"`, `"tcp4"` and `"tcp6"`; the address must be
/// an IP literal with a numeric port. The family suffix restricts which IP
/// version is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    fn target(network: &str, address: &str) -> io::Result<SocketAddr> {
        let addr: SocketAddr = address.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: not an IP address with port", address),
            )
        })?;

        let family_ok = match network {
            "tcp" => true,
            "tcp4" => addr.is_ipv4(),
            "tcp6" => addr.is_ipv6(),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown network {}", network),
                ))
            }
        };
        if !family_ok {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: address family does not match network {}", address, network),
            ));
        }

        Ok(addr)
    }
}

impl Connect for TcpConnector {
    type Conn = TcpStream;

    fn connect<'a>(
        &'a self,
        cx: &'a DialContext,
        network: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, io::Result<TcpStream>> {
        Box::pin(async move {
            let addr = Self::target(network, address)?;
            cx.run(TcpStream::connect(addr)).await
        })
    }
}
