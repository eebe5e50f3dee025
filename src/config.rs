//! Dial policies loaded from configuration.
//!
//! A [`DialPolicy`] is the serializable form of a list of address checks:
//!
//! ```toml
//! deny_private = true
//! deny = ["198.51.100.0/24"]
//! allow = []
//! ```
//!
//! Every list that is set becomes one check and all checks must pass.
//! An empty `allow` list means "no allow list", not "allow nothing".

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::check::AddrCheck;
use crate::error::Error;

/// The address checks a restricted dialer should apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialPolicy {
    /// Deny [`PRIVATE_IP_NETWORKS`](crate::PRIVATE_IP_NETWORKS).
    pub deny_private: bool,

    /// Additional networks to deny.
    pub deny: Vec<IpNet>,

    /// If non-empty, only these networks may be dialed.
    pub allow: Vec<IpNet>,
}

impl Default for DialPolicy {
    fn default() -> Self {
        Self {
            deny_private: true,
            deny: Vec::new(),
            allow: Vec::new(),
        }
    }
}

impl DialPolicy {
    /// Parse a policy from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML, unknown keys, or
    /// invalid CIDRs.
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    /// The checks this policy stands for: the private-network deny list
    /// first, then `deny`, then `allow`.
    pub fn checks(&self) -> Vec<AddrCheck> {
        let mut checks = Vec::new();
        if self.deny_private {
            checks.push(AddrCheck::deny_private());
        }
        if !self.deny.is_empty() {
            checks.push(AddrCheck::denylist(self.deny.iter().copied()));
        }
        if !self.allow.is_empty() {
            checks.push(AddrCheck::allowlist(self.allow.iter().copied()));
        }
        checks
    }
}
