use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use crate::error::{Result, TraceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Every address a host resolved to, plus the one picked per family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    pub addresses: Vec<IpAddr>,
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl AddressSet {
    /// The last address seen of each family is the one picked.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        let mut set = Self::default();
        for addr in addrs {
            if set.addresses.contains(&addr) {
                continue;
            }
            match addr {
                IpAddr::V4(v4) => set.v4 = Some(v4),
                IpAddr::V6(v6) => set.v6 = Some(v6),
            }
            set.addresses.push(addr);
        }
        set
    }

    pub fn get(&self, family: AddressFamily) -> Option<IpAddr> {
        match family {
            AddressFamily::V4 => self.v4.map(IpAddr::V4),
            AddressFamily::V6 => self.v6.map(IpAddr::V6),
        }
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for addr in &self.addresses {
            writeln!(f, "{}: {addr}", AddressFamily::of(addr))?;
        }
        Ok(())
    }
}

/// Resolves a host name (or address literal) into its addresses.
///
/// The name is handed to the system resolver exactly as given.
pub async fn resolve(hostname: &str) -> Result<AddressSet> {
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(AddressSet::from_addrs([ip]));
    }

    let addrs = tokio::net::lookup_host((hostname, 0))
        .await
        .map_err(|source| TraceError::Resolution {
            host: hostname.to_string(),
            source,
        })?;
    let set = AddressSet::from_addrs(addrs.map(|addr| addr.ip()));
    log::debug!("{hostname} resolved to {:?}", set.addresses);
    Ok(set)
}

/// Name of the machine we are running on.
pub fn local_hostname() -> Result<String> {
    dns_lookup::get_hostname().map_err(|source| TraceError::Resolution {
        host: "local host".to_string(),
        source,
    })
}

/// Best effort reverse lookup of a hop address.
pub trait NameLookup {
    /// `None` when the address has no name.
    fn reverse(&self, addr: IpAddr) -> Option<String>;
}

impl<L: NameLookup + ?Sized> NameLookup for &L {
    fn reverse(&self, addr: IpAddr) -> Option<String> {
        (**self).reverse(addr)
    }
}

/// Reverse lookup through the system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl NameLookup for SystemLookup {
    fn reverse(&self, addr: IpAddr) -> Option<String> {
        // getnameinfo hands back the numeric form when there is no PTR record
        match dns_lookup::lookup_addr(&addr) {
            Ok(name) if name.parse::<IpAddr>().is_err() => Some(name),
            Ok(_) => None,
            Err(e) => {
                log::debug!("reverse lookup of {addr} failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_last_address_of_each_family_is_picked() {
        let set = AddressSet::from_addrs([
            v4(10, 0, 0, 1),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            v4(10, 0, 0, 2),
        ]);
        assert_eq!(set.v4, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(set.v6, Some(Ipv6Addr::LOCALHOST));
        assert_eq!(set.get(AddressFamily::V4), Some(v4(10, 0, 0, 2)));
        assert_eq!(set.addresses.len(), 3);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let set = AddressSet::from_addrs([v4(10, 0, 0, 1), v4(10, 0, 0, 2), v4(10, 0, 0, 1)]);
        assert_eq!(set.addresses, vec![v4(10, 0, 0, 1), v4(10, 0, 0, 2)]);
        assert_eq!(set.v4, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(set.v6, None);
    }

    #[test]
    fn test_display_prefixes_family() {
        let set = AddressSet::from_addrs([v4(127, 0, 0, 1), IpAddr::V6(Ipv6Addr::LOCALHOST)]);
        assert_eq!(set.to_string(), "IPv4: 127.0.0.1\nIPv6: ::1\n");
    }

    #[tokio::test]
    async fn test_resolve_literal_addresses() {
        let set = resolve("192.0.2.7").await.unwrap();
        assert_eq!(set.v4, Some(Ipv4Addr::new(192, 0, 2, 7)));
        assert_eq!(set.v6, None);

        let set = resolve("2001:db8::1").await.unwrap();
        assert_eq!(set.v4, None);
        assert_eq!(set.v6, Some("2001:db8::1".parse().unwrap()));
    }

    #[test_case("exa mple.invalid" ; "embedded space")]
    #[test_case("host.invalid:8080" ; "trailing port")]
    #[test_case("!!!" ; "no name characters")]
    #[tokio::test]
    async fn test_unresolvable_name_is_not_rewritten(hostname: &str) {
        match resolve(hostname).await {
            Err(TraceError::Resolution { host, .. }) => assert_eq!(host, hostname),
            other => panic!("expected a resolution failure for {hostname:?}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let set = resolve("localhost").await.unwrap();
        assert!(set.addresses.iter().all(IpAddr::is_loopback));
        assert!(!set.addresses.is_empty());
    }
}
