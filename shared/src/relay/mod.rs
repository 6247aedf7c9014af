mod lobby_messages;
mod messages;
mod wire_address;

pub use lobby_messages::{CreateLobby, JoinLobby, LobbyJoined, LobbyLeft, LobbyList, LobbySummary};
pub use messages::{
    MasterAssigned, OwnerDisconnected, P2pOpen, P2pRequest, P2pResult, P2pStatus, PlayerRegistered,
};
pub use wire_address::WireAddress;
