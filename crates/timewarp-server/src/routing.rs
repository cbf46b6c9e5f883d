// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The routing table mapping client networks to timers.
//!
//! Routes are kept in insertion order; lookups scan in reverse so that when
//! several prefixes cover a client address, the most recently inserted route
//! wins. The table guarantees at least the three default covers installed at
//! bootstrap (`0.0.0.0/0`, `127.0.0.0/24`, `::/120`), which may be
//! retargeted but never removed.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use log::debug;

use crate::error::RoutingError;

/// An IP network (address + prefix length) for route matching.
///
/// Supports both IPv4 and IPv6 addresses. Prefix lengths are bounded to
/// the address type's maximum (32 for IPv4, 128 for IPv6), and the stored
/// address is normalized to the network address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IpNet {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpNet {
    /// Create a new IP network.
    ///
    /// The prefix length is clamped to the maximum for the address type and
    /// the address is masked down to its network address.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Self {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let prefix_len = prefix_len.min(max);
        IpNet {
            addr: mask_addr(&addr, prefix_len),
            prefix_len,
        }
    }

    /// The network address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Check whether masking `ip` with this network's prefix yields exactly
    /// the stored network address. Always false across address families.
    pub fn masked_matches(&self, ip: &IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask_addr(ip, self.prefix_len) == self.addr
            }
            _ => false,
        }
    }

    /// Check whether the given IP address falls within this network.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        // The stored address is normalized, so containment and masked
        // equality coincide.
        self.masked_matches(ip)
    }

    /// Whether this network is one of the default covers: the unspecified
    /// (zero) network, a loopback network, or a link-local network.
    pub fn is_default_cover(&self) -> bool {
        match self.addr {
            IpAddr::V4(v4) => v4.is_unspecified() || v4.is_loopback() || v4.is_link_local(),
            IpAddr::V6(v6) => {
                v6.is_unspecified() || v6.is_loopback() || (v6.segments()[0] & 0xffc0) == 0xfe80
            }
        }
    }
}

fn mask_addr(addr: &IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let mask = match prefix_len {
                0 => 0,
                len => u32::MAX << (32 - len as u32),
            };
            IpAddr::V4((u32::from(*v4) & mask).into())
        }
        IpAddr::V6(v6) => {
            let mask = match prefix_len {
                0 => 0,
                len => u128::MAX << (128 - len as u32),
            };
            IpAddr::V6((u128::from(*v6) & mask).into())
        }
    }
}

impl fmt::Display for IpNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// Error returned when parsing a CIDR string fails.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidCidr {
    /// The string that failed to parse.
    pub input: String,
}

impl fmt::Display for InvalidCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cidr network: {}", self.input)
    }
}

impl std::error::Error for InvalidCidr {}

impl FromStr for IpNet {
    type Err = InvalidCidr;

    /// Parse CIDR notation, e.g. `10.0.0.0/8` or `fe80::/64`. A bare
    /// address is treated as a host network (`/32` or `/128`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCidr {
            input: s.to_string(),
        };
        match s.split_once('/') {
            Some((addr, len)) => {
                let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
                let len: u8 = len.parse().map_err(|_| invalid())?;
                let max = match addr {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                if len > max {
                    return Err(invalid());
                }
                Ok(IpNet::new(addr, len))
            }
            None => {
                let addr: IpAddr = s.parse().map_err(|_| invalid())?;
                let len = match addr {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                Ok(IpNet::new(addr, len))
            }
        }
    }
}

/// An entry in a [`RoutingTable`]: a client network bound to a timer id.
#[derive(Clone, Copy, Debug)]
pub struct RouteEntry {
    /// The unique, stable identifier of the route.
    pub id: u32,
    /// The network matched against client addresses.
    pub net: IpNet,
    /// The id of the timer answering for this network.
    pub timer_id: u32,
}

/// An ordered collection of [`RouteEntry`] values.
///
/// Entry ids are assigned monotonically and never reused. The timer id is
/// the authoritative link to the registry; the timer itself is resolved at
/// dispatch time so that deletions cannot leave dangling references.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    next_id: u32,
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// Create an empty routing table.
    pub fn new() -> RoutingTable {
        RoutingTable::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Look up a route by id.
    pub fn get(&self, id: u32) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry with the same network address exists.
    pub fn contains_net(&self, net: &IpNet) -> bool {
        self.entries.iter().any(|entry| entry.net.addr() == net.addr())
    }

    /// Append a route binding `net` to the timer with `timer_id`.
    ///
    /// The network address must be unique in the table.
    pub fn add(&mut self, net: IpNet, timer_id: u32) -> Result<u32, RoutingError> {
        if self.contains_net(&net) {
            return Err(RoutingError::DuplicateNetwork {
                network: net.to_string(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(RouteEntry { id, net, timer_id });
        Ok(id)
    }

    /// Point an existing route at a different timer.
    pub fn retarget(&mut self, route_id: u32, timer_id: u32) -> Result<(), RoutingError> {
        match self.entries.iter_mut().find(|entry| entry.id == route_id) {
            Some(entry) => {
                entry.timer_id = timer_id;
                Ok(())
            }
            None => Err(RoutingError::NotFound { id: route_id }),
        }
    }

    /// Delete a route by id. Default covers are protected.
    pub fn remove(&mut self, route_id: u32) -> Result<(), RoutingError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == route_id)
            .ok_or(RoutingError::NotFound { id: route_id })?;
        if self.entries[index].net.is_default_cover() {
            return Err(RoutingError::DefaultRoute { id: route_id });
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Resolve a client address to the timer id of the matching route.
    ///
    /// The table is scanned in reverse insertion order, first comparing the
    /// masked client address against each network address and then falling
    /// back to a containment scan. The two passes are equivalent for
    /// normalized entries; both are kept because together they define the
    /// tie-break: of all covering prefixes, the most recently inserted route
    /// wins. Returns `None` only when no entry covers the address, which a
    /// bootstrapped table prevents by construction.
    pub fn resolve(&self, ip: IpAddr) -> Option<u32> {
        for entry in self.entries.iter().rev() {
            if entry.net.masked_matches(&ip) {
                debug!("host ip [{}] matches route [{}]", ip, entry.net);
                return Some(entry.timer_id);
            }
        }
        for entry in self.entries.iter().rev() {
            if entry.net.contains(&ip) {
                debug!("host ip [{}] contained in route [{}]", ip, entry.net);
                return Some(entry.timer_id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_ipnet_contains_exact() {
        let net = net("192.168.1.1/32");
        assert!(net.contains(&ip("192.168.1.1")));
        assert!(!net.contains(&ip("192.168.1.2")));
    }

    #[test]
    fn test_ipnet_contains_subnet() {
        let net = net("192.168.1.0/24");
        assert!(net.contains(&ip("192.168.1.0")));
        assert!(net.contains(&ip("192.168.1.255")));
        assert!(!net.contains(&ip("192.168.2.0")));
    }

    #[test]
    fn test_ipnet_contains_slash_zero() {
        let net = net("0.0.0.0/0");
        assert!(net.contains(&ip("1.2.3.4")));
        assert!(net.contains(&ip("255.255.255.255")));
    }

    #[test]
    fn test_ipnet_v4_v6_mismatch() {
        let net4 = net("192.168.1.0/24");
        assert!(!net4.contains(&ip("::1")));
        let net6 = net("::/0");
        assert!(!net6.contains(&ip("127.0.0.1")));
    }

    #[test]
    fn test_ipnet_ipv6() {
        let net = net("2001:db8::/32");
        assert!(net.contains(&ip("2001:db8::1")));
        assert!(net.contains(&ip("2001:db8:ffff::1")));
        assert!(!net.contains(&ip("2001:db9::1")));
    }

    #[test]
    fn test_ipnet_normalizes_address() {
        let net = net("192.168.1.77/24");
        assert_eq!(net.addr(), ip("192.168.1.0"));
        assert_eq!(net.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_ipnet_parse_bare_address() {
        assert_eq!(net("10.1.2.3"), net("10.1.2.3/32"));
        assert_eq!(net("::1"), net("::1/128"));
    }

    #[test]
    fn test_ipnet_parse_rejects_garbage() {
        for input in ["", "10.0.0.0/", "10.0.0.0/33", "::/129", "hello/8", "10.0.0.0/x"] {
            assert!(input.parse::<IpNet>().is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_default_covers() {
        assert!(net("0.0.0.0/0").is_default_cover());
        assert!(net("127.0.0.0/24").is_default_cover());
        assert!(net("::/120").is_default_cover());
        assert!(net("fe80::/64").is_default_cover());
        assert!(net("169.254.0.0/16").is_default_cover());
        assert!(!net("10.0.0.0/8").is_default_cover());
        assert!(!net("192.168.1.0/24").is_default_cover());
    }

    fn bootstrapped_table() -> RoutingTable {
        let mut table = RoutingTable::new();
        table.add(net("0.0.0.0/0"), 0).unwrap();
        table.add(net("127.0.0.0/24"), 0).unwrap();
        table.add(net("::/120"), 0).unwrap();
        table
    }

    #[test]
    fn test_add_rejects_duplicate_network() {
        let mut table = bootstrapped_table();
        table.add(net("192.168.1.0/24"), 0).unwrap();
        let err = table.add(net("192.168.1.0/24"), 1).unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateNetwork { .. }));
    }

    #[test]
    fn test_route_ids_are_stable_and_never_reused() {
        let mut table = bootstrapped_table();
        let r3 = table.add(net("10.0.0.0/8"), 0).unwrap();
        let r4 = table.add(net("172.16.0.0/12"), 0).unwrap();
        assert_eq!((r3, r4), (3, 4));

        table.remove(r3).unwrap();
        assert!(table.get(r3).is_none());
        assert!(table.get(r4).is_some());
        assert_eq!(table.add(net("10.1.0.0/16"), 0).unwrap(), 5);
    }

    #[test]
    fn test_remove_unknown_route() {
        let mut table = bootstrapped_table();
        assert_eq!(
            table.remove(99),
            Err(RoutingError::NotFound { id: 99 })
        );
    }

    #[test]
    fn test_default_routes_protected_from_removal() {
        let mut table = bootstrapped_table();
        for id in [0u32, 1, 2] {
            assert_eq!(table.remove(id), Err(RoutingError::DefaultRoute { id }));
        }
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_default_routes_can_be_retargeted() {
        let mut table = bootstrapped_table();
        table.retarget(0, 7).unwrap();
        assert_eq!(table.get(0).unwrap().timer_id, 7);
    }

    #[test]
    fn test_retarget_unknown_route() {
        let mut table = bootstrapped_table();
        assert_eq!(
            table.retarget(99, 0),
            Err(RoutingError::NotFound { id: 99 })
        );
    }

    #[test]
    fn test_resolve_most_specific_examples() {
        let mut table = bootstrapped_table();
        // default timer id 0; routed timers get distinct ids.
        table.add(net("192.168.1.0/24"), 10).unwrap();
        table.add(net("192.168.2.11/32"), 20).unwrap();

        assert_eq!(table.resolve(ip("192.168.1.10")), Some(10));
        assert_eq!(table.resolve(ip("192.168.1.11")), Some(10));
        assert_eq!(table.resolve(ip("192.168.2.11")), Some(20));
        assert_eq!(table.resolve(ip("192.168.2.10")), Some(0));
        assert_eq!(table.resolve(ip("127.0.0.1")), Some(0));
        assert_eq!(table.resolve(ip("::1")), Some(0));
    }

    #[test]
    fn test_resolve_most_recent_insertion_wins() {
        let mut table = bootstrapped_table();
        table.add(net("10.0.0.0/8"), 1).unwrap();
        table.add(net("10.0.0.0/16"), 2).unwrap();
        // Both prefixes cover the address; the later insertion wins.
        assert_eq!(table.resolve(ip("10.0.0.5")), Some(2));
        assert_eq!(table.resolve(ip("10.1.0.5")), Some(1));
    }

    #[test]
    fn test_resolve_empty_table_is_none() {
        let table = RoutingTable::new();
        assert_eq!(table.resolve(ip("10.0.0.1")), None);
    }
}
