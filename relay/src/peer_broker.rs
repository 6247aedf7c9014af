use std::{
    collections::{HashMap, HashSet},
    ops::Range,
};

use log::{debug, info};

use warden_shared::ConnectionId;

use crate::error::RelayError;

const PORT_ATTEMPTS: usize = 64;

struct Negotiation {
    ports: [u16; 2],
    results: [Option<bool>; 2],
    available: bool,
}

/// Ports reserved for one pair: each player listens on its own port and
/// dials the other's
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortPair {
    pub first: u16,
    pub second: u16,
}

/// Negotiates direct links between pairs of players. Reserves a listening
/// port for each side, waits for both to report, then publishes the outcome.
pub struct PeerBroker {
    pairs: HashMap<(ConnectionId, ConnectionId), Negotiation>,
    reserved: HashSet<u16>,
    port_range: Range<u16>,
}

fn key(a: ConnectionId, b: ConnectionId) -> (ConnectionId, ConnectionId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn side(a: ConnectionId, b: ConnectionId) -> usize {
    if a <= b {
        0
    } else {
        1
    }
}

impl PeerBroker {
    pub fn new(port_range: Range<u16>) -> Self {
        Self {
            pairs: HashMap::new(),
            reserved: HashSet::new(),
            port_range,
        }
    }

    /// Starts negotiating a link between `a` and `b`. `first` is the port `a`
    /// listens on, `second` the one `b` listens on.
    pub fn open(&mut self, a: ConnectionId, b: ConnectionId) -> Result<PortPair, RelayError> {
        if a == b {
            return Err(RelayError::PeerLinkRefused { a, b });
        }
        if self.pairs.contains_key(&key(a, b)) {
            return Err(RelayError::PeerLinkExists { a, b });
        }
        let port_a = self.reserve_port()?;
        let port_b = match self.reserve_port() {
            Ok(port) => port,
            Err(error) => {
                self.reserved.remove(&port_a);
                return Err(error);
            }
        };

        let mut ports = [0; 2];
        ports[side(a, b)] = port_a;
        ports[side(b, a)] = port_b;
        self.pairs.insert(
            key(a, b),
            Negotiation {
                ports,
                results: [None, None],
                available: false,
            },
        );
        debug!("Negotiating peer link {} <-> {} on ports {} / {}", a, b, port_a, port_b);
        Ok(PortPair {
            first: port_a,
            second: port_b,
        })
    }

    /// Records `reporter`'s result for its link to `peer`. Returns the link's
    /// availability once it is decided: when both sides have reported, or
    /// when an available link fails. A link that is not available is closed.
    pub fn report(&mut self, reporter: ConnectionId, peer: ConnectionId, success: bool) -> Option<bool> {
        let negotiation = self.pairs.get_mut(&key(reporter, peer))?;

        if negotiation.available {
            if success {
                return None;
            }
            self.close(reporter, peer);
            return Some(false);
        }

        negotiation.results[side(reporter, peer)] = Some(success);
        let decided = match negotiation.results {
            [Some(first), Some(second)] => first && second,
            [Some(false), None] | [None, Some(false)] => false,
            _ => return None,
        };
        if decided {
            negotiation.available = true;
            info!("Peer link {} <-> {} is available", reporter, peer);
        } else {
            self.close(reporter, peer);
        }
        Some(decided)
    }

    pub fn is_available(&self, a: ConnectionId, b: ConnectionId) -> bool {
        self.pairs
            .get(&key(a, b))
            .map(|negotiation| negotiation.available)
            .unwrap_or(false)
    }

    /// Forgets the pair and frees its ports. Returns false if there was no pair.
    pub fn close(&mut self, a: ConnectionId, b: ConnectionId) -> bool {
        match self.pairs.remove(&key(a, b)) {
            Some(negotiation) => {
                for port in negotiation.ports {
                    self.reserved.remove(&port);
                }
                true
            }
            None => false,
        }
    }

    /// Closes every pair `connection` is part of and returns the counterparts
    pub fn close_all(&mut self, connection: ConnectionId) -> Vec<ConnectionId> {
        let mut counterparts: Vec<ConnectionId> = self
            .pairs
            .keys()
            .filter_map(|(a, b)| {
                if *a == connection {
                    Some(*b)
                } else if *b == connection {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect();
        counterparts.sort_unstable();
        for counterpart in &counterparts {
            self.close(connection, *counterpart);
        }
        counterparts
    }

    pub fn reserved_ports(&self) -> usize {
        self.reserved.len()
    }

    fn reserve_port(&mut self) -> Result<u16, RelayError> {
        if self.port_range.is_empty() {
            return Err(RelayError::NoFreePort);
        }
        for _ in 0..PORT_ATTEMPTS {
            let port = fastrand::u16(self.port_range.clone());
            if self.reserved.insert(port) {
                return Ok(port);
            }
        }
        // crowded range, take the first free port
        let port = self
            .port_range
            .clone()
            .find(|port| !self.reserved.contains(port))
            .ok_or(RelayError::NoFreePort)?;
        self.reserved.insert(port);
        Ok(port)
    }
}
