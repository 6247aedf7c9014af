/// In-memory transport for end-to-end tests
/// One host endpoint (a Server or a Relay) and any number of clients, plus
/// direct links between clients. No network I/O, packets are delivered on
/// the receiver's next poll.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};

use warden_client::P2pConnector;
use warden_shared::{
    ConnectionId, DeliveryMode, PacketReceiver, PacketSender, Socket, TransportError,
    TransportEvent, HOST_CONNECTION_ID,
};

const HOST_PORT: u16 = 9_000;
const CLIENT_BASE_PORT: u16 = 10_000;

pub fn client_address(connection: ConnectionId) -> SocketAddr {
    SocketAddr::new(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        CLIENT_BASE_PORT + connection as u16,
    )
}

#[derive(Default)]
struct HubState {
    host_inbox: VecDeque<TransportEvent>,
    client_inboxes: HashMap<ConnectionId, VecDeque<TransportEvent>>,
    closed: HashSet<ConnectionId>,
    next_connection: ConnectionId,

    listeners: HashMap<ConnectionId, u16>,
    links: HashSet<(ConnectionId, ConnectionId)>,
    link_inboxes: HashMap<ConnectionId, VecDeque<(ConnectionId, Box<[u8]>)>>,
    refusing: HashSet<ConnectionId>,
    broken: HashSet<(ConnectionId, ConnectionId)>,

    host_to_client: HashMap<ConnectionId, usize>,
    client_to_host: HashMap<ConnectionId, usize>,
    over_links: HashMap<(ConnectionId, ConnectionId), usize>,
}

impl HubState {
    fn close(&mut self, connection: ConnectionId) {
        if !self.closed.insert(connection) {
            return;
        }
        self.host_inbox
            .push_back(TransportEvent::Disconnected { connection });
        if let Some(inbox) = self.client_inboxes.get_mut(&connection) {
            inbox.push_back(TransportEvent::Disconnected {
                connection: HOST_CONNECTION_ID,
            });
        }
    }
}

fn pair(a: ConnectionId, b: ConnectionId) -> (ConnectionId, ConnectionId) {
    (a.min(b), a.max(b))
}

/// Shared switchboard. Cloning it hands out another view of the same hub.
#[derive(Clone, Default)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new() -> Self {
        let hub = Self::default();
        hub.lock().next_connection = 1;
        hub
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap()
    }

    /// The endpoint a Server or Relay listens on
    pub fn host_socket(&self) -> Box<dyn Socket> {
        Box::new(HostSocket { hub: self.clone() })
    }

    /// Opens a new client connection. Both ends learn about it on their next poll.
    pub fn connect_client(&self) -> (ConnectionId, Box<dyn Socket>) {
        let mut state = self.lock();
        let connection = state.next_connection;
        state.next_connection += 1;

        state.host_inbox.push_back(TransportEvent::Connected {
            connection,
            address: Some(client_address(connection)),
        });
        let mut inbox = VecDeque::new();
        inbox.push_back(TransportEvent::Connected {
            connection: HOST_CONNECTION_ID,
            address: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), HOST_PORT)),
        });
        state.client_inboxes.insert(connection, inbox);

        (
            connection,
            Box::new(ClientSocket {
                hub: self.clone(),
                connection,
            }),
        )
    }

    /// Simulates the transport dropping a client
    pub fn drop_client(&self, connection: ConnectionId) {
        self.lock().close(connection);
    }

    pub fn is_open(&self, connection: ConnectionId) -> bool {
        let state = self.lock();
        state.client_inboxes.contains_key(&connection) && !state.closed.contains(&connection)
    }

    pub fn peer_connector(&self, connection: ConnectionId) -> Box<dyn P2pConnector> {
        Box::new(LocalPeerConnector {
            hub: self.clone(),
            connection,
        })
    }

    /// Every listener or dial made by `connection` fails from now on
    pub fn refuse_peer_links(&self, connection: ConnectionId) {
        self.lock().refusing.insert(connection);
    }

    /// Sends over the link between `a` and `b` fail from now on
    pub fn break_link(&self, a: ConnectionId, b: ConnectionId) {
        self.lock().broken.insert(pair(a, b));
    }

    pub fn listener_port(&self, connection: ConnectionId) -> Option<u16> {
        self.lock().listeners.get(&connection).copied()
    }

    /// Packets the host sent to `connection`
    pub fn host_sent_to(&self, connection: ConnectionId) -> usize {
        self.lock()
            .host_to_client
            .get(&connection)
            .copied()
            .unwrap_or(0)
    }

    /// Packets `connection` sent to the host
    pub fn sent_to_host(&self, connection: ConnectionId) -> usize {
        self.lock()
            .client_to_host
            .get(&connection)
            .copied()
            .unwrap_or(0)
    }

    /// Packets `from` sent straight to `to` over a direct link
    pub fn sent_over_link(&self, from: ConnectionId, to: ConnectionId) -> usize {
        self.lock()
            .over_links
            .get(&(from, to))
            .copied()
            .unwrap_or(0)
    }
}

// Host Socket

struct HostSocket {
    hub: LocalHub,
}

impl Socket for HostSocket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        (
            Box::new(HostSender {
                hub: self.hub.clone(),
            }),
            Box::new(HostReceiver { hub: self.hub }),
        )
    }
}

struct HostSender {
    hub: LocalHub,
}

impl PacketSender for HostSender {
    fn send(
        &self,
        connection: ConnectionId,
        payload: &[u8],
        _delivery: DeliveryMode,
    ) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        if state.closed.contains(&connection) {
            return Err(TransportError::Send { connection });
        }
        let Some(inbox) = state.client_inboxes.get_mut(&connection) else {
            return Err(TransportError::UnknownConnection { connection });
        };
        inbox.push_back(TransportEvent::Packet {
            connection: HOST_CONNECTION_ID,
            payload: payload.into(),
        });
        *state.host_to_client.entry(connection).or_default() += 1;
        Ok(())
    }

    fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        if !state.client_inboxes.contains_key(&connection) {
            return Err(TransportError::UnknownConnection { connection });
        }
        state.close(connection);
        Ok(())
    }
}

struct HostReceiver {
    hub: LocalHub,
}

impl PacketReceiver for HostReceiver {
    fn receive(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        Ok(self.hub.lock().host_inbox.pop_front())
    }
}

// Client Socket

struct ClientSocket {
    hub: LocalHub,
    connection: ConnectionId,
}

impl Socket for ClientSocket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        (
            Box::new(ClientSender {
                hub: self.hub.clone(),
                connection: self.connection,
            }),
            Box::new(ClientReceiver {
                hub: self.hub,
                connection: self.connection,
            }),
        )
    }
}

struct ClientSender {
    hub: LocalHub,
    connection: ConnectionId,
}

impl PacketSender for ClientSender {
    fn send(
        &self,
        connection: ConnectionId,
        payload: &[u8],
        _delivery: DeliveryMode,
    ) -> Result<(), TransportError> {
        if connection != HOST_CONNECTION_ID {
            return Err(TransportError::UnknownConnection { connection });
        }
        let mut state = self.hub.lock();
        if state.closed.contains(&self.connection) {
            return Err(TransportError::Send { connection });
        }
        state.host_inbox.push_back(TransportEvent::Packet {
            connection: self.connection,
            payload: payload.into(),
        });
        *state.client_to_host.entry(self.connection).or_default() += 1;
        Ok(())
    }

    fn disconnect(&self, _connection: ConnectionId) -> Result<(), TransportError> {
        self.hub.lock().close(self.connection);
        Ok(())
    }
}

struct ClientReceiver {
    hub: LocalHub,
    connection: ConnectionId,
}

impl PacketReceiver for ClientReceiver {
    fn receive(&mut self) -> Result<Option<TransportEvent>, TransportError> {
        let mut state = self.hub.lock();
        Ok(state
            .client_inboxes
            .get_mut(&self.connection)
            .and_then(|inbox| inbox.pop_front()))
    }
}

// Peer Links

/// Direct links between hub clients. Dialing succeeds unless either side
/// refuses links; sends fail once the link is broken.
pub struct LocalPeerConnector {
    hub: LocalHub,
    connection: ConnectionId,
}

impl P2pConnector for LocalPeerConnector {
    fn open_listener(&mut self, local_port: u16) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        if state.refusing.contains(&self.connection) {
            return Err(TransportError::Listen { port: local_port });
        }
        state.listeners.insert(self.connection, local_port);
        Ok(())
    }

    fn connect(&mut self, peer: ConnectionId, address: SocketAddr) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        if state.refusing.contains(&self.connection)
            || state.refusing.contains(&peer)
            || address.ip() != IpAddr::V4(Ipv4Addr::LOCALHOST)
        {
            return Err(TransportError::Connect { peer });
        }
        state.links.insert((self.connection, peer));
        Ok(())
    }

    fn send(
        &mut self,
        peer: ConnectionId,
        payload: &[u8],
        _delivery: DeliveryMode,
    ) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        if !state.links.contains(&(self.connection, peer))
            || state.broken.contains(&pair(self.connection, peer))
        {
            return Err(TransportError::Send { connection: peer });
        }
        state
            .link_inboxes
            .entry(peer)
            .or_default()
            .push_back((self.connection, payload.into()));
        *state.over_links.entry((self.connection, peer)).or_default() += 1;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<(ConnectionId, Box<[u8]>)>, TransportError> {
        let mut state = self.hub.lock();
        Ok(state
            .link_inboxes
            .get_mut(&self.connection)
            .and_then(|inbox| inbox.pop_front()))
    }

    fn close(&mut self, peer: ConnectionId) {
        self.hub.lock().links.remove(&(self.connection, peer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packets_reach_the_other_end() {
        let hub = LocalHub::new();
        let (sender, mut receiver) = hub.host_socket().listen();
        let (connection, socket) = hub.connect_client();
        let (client_sender, mut client_receiver) = socket.listen();

        assert!(matches!(
            receiver.receive().unwrap(),
            Some(TransportEvent::Connected { connection: 1, .. })
        ));
        assert!(matches!(
            client_receiver.receive().unwrap(),
            Some(TransportEvent::Connected { connection: HOST_CONNECTION_ID, .. })
        ));

        client_sender
            .send(HOST_CONNECTION_ID, &[1, 2, 3], DeliveryMode::Reliable)
            .unwrap();
        sender.send(connection, &[4], DeliveryMode::Unreliable).unwrap();

        assert_eq!(
            receiver.receive().unwrap(),
            Some(TransportEvent::Packet {
                connection,
                payload: vec![1, 2, 3].into_boxed_slice(),
            })
        );
        assert_eq!(
            client_receiver.receive().unwrap(),
            Some(TransportEvent::Packet {
                connection: HOST_CONNECTION_ID,
                payload: vec![4].into_boxed_slice(),
            })
        );
        assert_eq!(hub.sent_to_host(connection), 1);
        assert_eq!(hub.host_sent_to(connection), 1);
    }

    #[test]
    fn dropped_client_is_reported_to_both_ends() {
        let hub = LocalHub::new();
        let (sender, mut receiver) = hub.host_socket().listen();
        let (connection, socket) = hub.connect_client();
        let (_, mut client_receiver) = socket.listen();

        hub.drop_client(connection);
        assert!(!hub.is_open(connection));

        let _connected = receiver.receive().unwrap();
        assert_eq!(
            receiver.receive().unwrap(),
            Some(TransportEvent::Disconnected { connection })
        );
        let _connected = client_receiver.receive().unwrap();
        assert_eq!(
            client_receiver.receive().unwrap(),
            Some(TransportEvent::Disconnected {
                connection: HOST_CONNECTION_ID
            })
        );
        assert!(sender.send(connection, &[0], DeliveryMode::Reliable).is_err());
    }

    #[test]
    fn broken_links_fail_to_send() {
        let hub = LocalHub::new();
        let mut a = hub.peer_connector(1);
        let mut b = hub.peer_connector(2);

        a.open_listener(42_000).unwrap();
        b.open_listener(42_001).unwrap();
        a.connect(2, client_address(2)).unwrap();
        b.connect(1, client_address(1)).unwrap();

        a.send(2, &[7], DeliveryMode::Reliable).unwrap();
        assert_eq!(b.receive().unwrap(), Some((1, vec![7].into_boxed_slice())));

        hub.break_link(2, 1);
        assert!(a.send(2, &[8], DeliveryMode::Reliable).is_err());
        assert_eq!(hub.sent_over_link(1, 2), 1);
    }
}
