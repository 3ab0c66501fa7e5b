//! Host address allocation inside the overlay prefix.
//!
//! Peers receive single-host addresses from the server's IPv4 prefix. The
//! scan walks the last octet of the network base from `.2` to `.254` and
//! hands out the lowest free value, so the same snapshot of used addresses
//! always yields the same answer.
//!
//! ```text
//! 10.0.0.1/24     - server address (host part of the configured prefix)
//! 10.0.0.2 - .254 - peer pool, lowest free first
//! 10.0.0.255      - never issued
//! ```

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnet::{IpNet, Ipv4Net};

/// Lowest last-octet host identifier handed to peers.
pub const FIRST_HOST: u8 = 2;

/// Highest last-octet host identifier handed to peers.
pub const LAST_HOST: u8 = 254;

/// Suffix stored with every allocated peer address.
pub const HOST_MASK_SUFFIX: &str = "/32";

/// Errors that can occur during address allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// Every candidate in the scan range is taken.
    #[error("no available addresses in {prefix}")]
    Exhausted {
        /// The prefix that ran out.
        prefix: String,
    },
    /// Only IPv4 prefixes are supported.
    #[error("unsupported address family: {prefix}")]
    UnsupportedFamily {
        /// The offending prefix.
        prefix: String,
    },
    /// The prefix is not valid CIDR notation.
    #[error("invalid CIDR: {message}")]
    InvalidCidr {
        /// Description of the error.
        message: String,
    },
}

/// A parsed IPv4 prefix that peer addresses are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPool {
    prefix: String,
    net: Ipv4Net,
}

impl AddressPool {
    /// Parses a prefix such as `10.0.0.1/24`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidCidr`] for malformed input and
    /// [`AllocationError::UnsupportedFamily`] for IPv6 prefixes.
    pub fn parse(prefix: &str) -> Result<Self, AllocationError> {
        let net: IpNet = prefix
            .trim()
            .parse()
            .map_err(|e| AllocationError::InvalidCidr {
                message: format!("{prefix}: {e}"),
            })?;
        match net {
            IpNet::V4(net) => Ok(Self {
                prefix: prefix.to_string(),
                net,
            }),
            IpNet::V6(_) => Err(AllocationError::UnsupportedFamily {
                prefix: prefix.to_string(),
            }),
        }
    }

    /// The address named by the prefix itself, i.e. the server's address.
    #[must_use]
    pub fn server_address(&self) -> Ipv4Addr {
        self.net.addr()
    }

    /// The network the prefix describes.
    #[must_use]
    pub fn network(&self) -> Ipv4Net {
        self.net.trunc()
    }

    /// Candidate peer addresses in scan order.
    ///
    /// Only hosts of the network qualify: its own address, its broadcast
    /// address and the server address are never candidates.
    pub fn candidates(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        let network = self.network();
        let [a, b, c, _] = network.network().octets();
        let excluded = [network.network(), network.broadcast(), self.server_address()];
        (FIRST_HOST..=LAST_HOST)
            .map(move |host| Ipv4Addr::new(a, b, c, host))
            .filter(move |ip| network.contains(ip) && !excluded.contains(ip))
    }

    /// Returns the lowest candidate not present in `used`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Exhausted`] when every candidate is taken.
    pub fn allocate(&self, used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr, AllocationError> {
        self.candidates()
            .find(|ip| !used.contains(ip))
            .ok_or_else(|| AllocationError::Exhausted {
                prefix: self.prefix.clone(),
            })
    }

    /// Number of addresses peers can ever receive from this pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.candidates().count()
    }
}

/// Picks the next free host address in `prefix`.
///
/// # Errors
///
/// See [`AddressPool::parse`] and [`AddressPool::allocate`].
pub fn allocate_address(prefix: &str, used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr, AllocationError> {
    AddressPool::parse(prefix)?.allocate(used)
}

/// Formats an allocated address the way it is stored: `a.b.c.d/32`.
#[must_use]
pub fn to_host_cidr(ip: Ipv4Addr) -> String {
    format!("{ip}{HOST_MASK_SUFFIX}")
}

/// Strips the single-host suffix from a stored address.
#[must_use]
pub fn strip_host_mask(allowed_ip: &str) -> &str {
    allowed_ip
        .strip_suffix(HOST_MASK_SUFFIX)
        .unwrap_or(allowed_ip)
}

/// Parses a stored address (with or without `/32`).
#[must_use]
pub fn parse_allocated(allowed_ip: &str) -> Option<Ipv4Addr> {
    strip_host_mask(allowed_ip.trim()).parse().ok()
}
