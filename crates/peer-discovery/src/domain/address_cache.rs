//! Address Resolution Cache
//!
//! # Security (Bounded Memory)
//!
//! Maps `host:port` to a resolved socket address so repeated sightings of a
//! peer skip parsing. The cache is bounded: inserting beyond capacity evicts
//! the least recently used entry, so a flood of distinct addresses in
//! NEIGHBORS replies cannot grow it without limit.
//!
//! # Security (No DNS Under Lock)
//!
//! [`AddressCache::resolve`] never performs a DNS lookup: it serves cached
//! entries and IP literals only, so a hostile NEIGHBORS reply full of
//! hostnames cannot stall the explorer. DNS happens in
//! [`AddressCache::lookup`], used for bootstrap entries before the explorer
//! is shared.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::num::NonZeroUsize;

use lru::LruCache;

use super::entities::{address_key, Node};
use super::errors::PeerDiscoveryError;

/// Default capacity.
pub const DEFAULT_ADDRESS_CACHE_SIZE: usize = 200;

#[derive(Debug)]
pub struct AddressCache {
    entries: LruCache<String, SocketAddr>,
}

impl AddressCache {
    /// Create a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Resolve `host:port` from the cache or as an IP literal. Never blocks.
    pub fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddr, PeerDiscoveryError> {
        let key = address_key(host, port);
        if let Some(address) = self.entries.get(&key) {
            return Ok(*address);
        }

        let ip = host
            .parse::<IpAddr>()
            .map_err(|_| PeerDiscoveryError::UnresolvedHostname {
                address: key.clone(),
            })?;
        let address = SocketAddr::new(ip, port);
        self.entries.put(key, address);
        Ok(address)
    }

    /// Like [`Self::resolve`], falling back to a blocking DNS lookup for
    /// hostnames. The answer is cached, so later `resolve` calls for the same
    /// name succeed.
    pub fn lookup(&mut self, host: &str, port: u16) -> Result<SocketAddr, PeerDiscoveryError> {
        match self.resolve(host, port) {
            Err(PeerDiscoveryError::UnresolvedHostname { address: key }) => {
                let address = dns_lookup(host, port)?;
                self.entries.put(key, address);
                Ok(address)
            }
            resolved => resolved,
        }
    }

    pub fn resolve_node(&mut self, node: &Node) -> Result<SocketAddr, PeerDiscoveryError> {
        self.resolve(node.host(), node.port())
    }

    /// Look up a `host:port` string such as a bootstrap entry. May block on
    /// DNS.
    pub fn lookup_str(&mut self, value: &str) -> Result<SocketAddr, PeerDiscoveryError> {
        let (host, port) = split_host_port(value)?;
        self.lookup(host, port)
    }

    /// Presence check that does not touch recency.
    pub fn contains(&self, host: &str, port: u16) -> bool {
        self.entries.contains(&address_key(host, port))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS_CACHE_SIZE)
    }
}

/// Split `host:port`, accepting bracketed IPv6 (`[::1]:30303`).
pub fn split_host_port(value: &str) -> Result<(&str, u16), PeerDiscoveryError> {
    let unresolvable = || PeerDiscoveryError::UnresolvableAddress {
        address: value.to_string(),
    };

    let (host, port) = value.trim().rsplit_once(':').ok_or_else(unresolvable)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = port.parse::<u16>().map_err(|_| unresolvable())?;
    if host.is_empty() {
        return Err(unresolvable());
    }
    Ok((host, port))
}

fn dns_lookup(host: &str, port: u16) -> Result<SocketAddr, PeerDiscoveryError> {
    (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addresses| addresses.next())
        .ok_or_else(|| PeerDiscoveryError::UnresolvableAddress {
            address: address_key(host, port),
        })
}
