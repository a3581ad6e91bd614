//! Routing view and the set of directly-connected peer satellites.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use satellite_shared::{Address, Message, SatelliteError, SatelliteResult};

/// The set of peer satellites this satellite is directly connected to.
///
/// Owned by the manager; mutated only from the single writer context, but
/// wrapped in an `RwLock` so reads (e.g. "am I already connected to X")
/// don't need to go through the manager's own lock.
pub struct PeerRegistry {
    peers: RwLock<HashMap<Address, String>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_connected(&self, address: &Address) -> SatelliteResult<bool> {
        let peers = self
            .peers
            .read()
            .map_err(|e| SatelliteError::Internal(format!("peer registry lock poisoned: {e}")))?;
        Ok(peers.contains_key(address))
    }

    pub fn insert(&self, address: Address, ip: String) -> SatelliteResult<()> {
        let mut peers = self
            .peers
            .write()
            .map_err(|e| SatelliteError::Internal(format!("peer registry lock poisoned: {e}")))?;
        peers.insert(address, ip);
        Ok(())
    }

    pub fn connected_addresses(&self) -> SatelliteResult<Vec<Address>> {
        let peers = self
            .peers
            .read()
            .map_err(|e| SatelliteError::Internal(format!("peer registry lock poisoned: {e}")))?;
        Ok(peers.keys().cloned().collect())
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the `ROUTE_INFO` announcement for the given set of local
/// container addresses.
///
/// The routing view is derived state: `{self} x {local container
/// addresses}`, but since every peer already knows who the sender is (the
/// link itself identifies the satellite), only the local-address set needs
/// to be carried on the wire.
pub fn route_info_message(local_addresses: impl IntoIterator<Item = Address>) -> Message {
    Message::RouteInfo {
        addresses: local_addresses.into_iter().collect(),
    }
}

/// Compare two routing announcements for the "no extra pair, no missing
/// pair" testable property, independent of ordering.
pub fn routing_sets_equal(a: &[Address], b: &[Address]) -> bool {
    let a: HashSet<&Address> = a.iter().collect();
    let b: HashSet<&Address> = b.iter().collect();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_registry_tracks_connections() {
        let registry = PeerRegistry::new();
        let addr = Address::new_unchecked("SATL0000");
        assert!(!registry.is_connected(&addr).unwrap());

        registry.insert(addr.clone(), "10.0.0.1".to_string()).unwrap();
        assert!(registry.is_connected(&addr).unwrap());
        assert_eq!(registry.connected_addresses().unwrap(), vec![addr]);
    }

    #[test]
    fn routing_sets_equal_ignores_order() {
        let a = vec![
            Address::new_unchecked("SATL0001"),
            Address::new_unchecked("SATL0002"),
        ];
        let b = vec![
            Address::new_unchecked("SATL0002"),
            Address::new_unchecked("SATL0001"),
        ];
        assert!(routing_sets_equal(&a, &b));
    }

    #[test]
    fn routing_sets_equal_detects_extra_pair() {
        let a = vec![Address::new_unchecked("SATL0001")];
        let b = vec![
            Address::new_unchecked("SATL0001"),
            Address::new_unchecked("SATL0002"),
        ];
        assert!(!routing_sets_equal(&a, &b));
    }
}
