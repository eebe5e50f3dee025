//! # dial_jail
//!
//! SSRF and DNS-rebinding safe connections.
//!
//! `dial_jail` wraps a connect primitive (anything that opens a connection
//! from a network name and a "host:port" string) with address validation.
//! The wrapped primitive resolves the host, checks the resolved IP against a
//! list of [`AddrCheck`]s, and then connects to *that IP*: the host name is
//! never passed down, so it cannot re-resolve to another address between
//! the check and the connection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dial_jail::{restricted_dial, AddrCheck, DialContext, TcpConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dialer = restricted_dial(TcpConnector, [AddrCheck::deny_private()]);
//!
//! let stream = dialer.dial(&DialContext::new(), "tcp", "example.com:443").await?;
//! println!("connected to {}", stream.peer_addr()?);
//!
//! // Trusted call sites can skip the checks for a single call.
//! let cx = DialContext::new().with_bypass();
//! let _metrics = dialer.dial(&cx, "tcp", "127.0.0.1:9090").await?;
//! # Ok(())
//! # }
//! ```

mod addr;
mod check;
mod config;
mod connect;
mod context;
mod dialer;
mod error;
mod networks;
mod resolve;

pub use addr::{join_host_port, split_host_port, NetAddr};
pub use check::{allowlist, denylist, AddrCheck, CheckError};
pub use config::DialPolicy;
pub use connect::{Connect, TcpConnector};
pub use context::{has_bypass, with_bypass, DialContext};
pub use dialer::{restricted_dial, RestrictedDialer, RestrictedDialerBuilder};
pub use error::Error;
pub use networks::{cidr, PRIVATE_IP_NETWORKS};
pub use resolve::{HickoryResolver, Resolve, StaticResolver, SystemResolver};
