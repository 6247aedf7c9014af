use std::{collections::HashMap, net::SocketAddr};

use warden_shared::ConnectionId;

/// What this client knows about its link to one peer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerLink {
    pub peer: ConnectionId,
    pub address: SocketAddr,
    /// Both sides reported success and the relay published the link
    pub available: bool,
}

/// Descriptor table of peer-to-peer links. A link is used for sending only
/// once it is available; any send failure drops the descriptor and traffic
/// goes back through the relay.
#[derive(Default)]
pub struct PeerLinks {
    links: HashMap<ConnectionId, PeerLink>,
}

impl PeerLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, peer: ConnectionId, address: SocketAddr) {
        self.links.insert(
            peer,
            PeerLink {
                peer,
                address,
                available: false,
            },
        );
    }

    /// Returns false if there is no descriptor for `peer`
    pub fn set_available(&mut self, peer: ConnectionId, available: bool) -> bool {
        match self.links.get_mut(&peer) {
            Some(link) => {
                link.available = available;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, peer: ConnectionId) -> Option<PeerLink> {
        self.links.remove(&peer)
    }

    pub fn get(&self, peer: ConnectionId) -> Option<&PeerLink> {
        self.links.get(&peer)
    }

    pub fn is_available(&self, peer: ConnectionId) -> bool {
        self.links
            .get(&peer)
            .map(|link| link.available)
            .unwrap_or(false)
    }

    /// Peers with an available link, in id order
    pub fn available_peers(&self) -> Vec<ConnectionId> {
        let mut peers: Vec<ConnectionId> = self
            .links
            .values()
            .filter(|link| link.available)
            .map(|link| link.peer)
            .collect();
        peers.sort_unstable();
        peers
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
