//! Source IP allowlist.

use std::collections::HashSet;
use std::net::IpAddr;

/// Immutable set of source addresses allowed through the gateway.
#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    allowed: HashSet<IpAddr>,
}

impl IpAllowlist {
    pub fn new(ips: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            allowed: ips.into_iter().map(|ip| ip.to_canonical()).collect(),
        }
    }

    /// Parse from configured strings. Invalid entries are logged and skipped;
    /// config validation rejects them before this point in normal startup.
    pub fn from_strings(entries: &[String]) -> Self {
        let ips = entries.iter().filter_map(|entry| match entry.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(entry = %entry, "Ignoring invalid allowlist entry");
                None
            }
        });
        Self::new(ips)
    }

    /// IPv4-mapped IPv6 sources match their IPv4 entry.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.allowed.contains(&ip.to_canonical())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_membership() {
        let list = IpAllowlist::from_strings(&["127.0.0.1".into(), "bogus".into()]);
        assert_eq!(list.len(), 1);
        assert!(list.contains(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(!list.contains("10.0.0.1".parse().unwrap()));
        assert!(!list.contains(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn test_ipv4_mapped_source_matches() {
        let list = IpAllowlist::from_strings(&["127.0.0.1".into()]);
        let mapped: IpAddr = "::ffff:127.0.0.1".parse().unwrap();
        assert!(list.contains(mapped));
    }
}
