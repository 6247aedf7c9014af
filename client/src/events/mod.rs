mod client_events;

pub use client_events::{
    ClientEvent, ClientEvents, ConnectEvent, DisconnectEvent, DisconnectReason, ErrorEvent,
    LobbyJoinedEvent, LobbyLeftEvent, LobbyListEvent, MasterAssignedEvent, PeerDisconnectEvent,
    PeerToPeerEvent,
};
