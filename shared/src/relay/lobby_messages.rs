use naia_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::types::{ConnectionId, LobbyId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateLobby {
    pub name: String,
}

impl Serde for CreateLobby {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.name.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            name: String::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.name.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinLobby {
    pub lobby: LobbyId,
}

impl Serde for JoinLobby {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobby.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobby: LobbyId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobby.bit_length()
    }
}

/// Relay to client: membership confirmed, with members in join order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LobbyJoined {
    pub lobby: LobbyId,
    pub name: String,
    pub members: Vec<ConnectionId>,
}

impl Serde for LobbyJoined {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobby.ser(writer);
        self.name.ser(writer);
        self.members.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobby: LobbyId::de(reader)?,
            name: String::de(reader)?,
            members: Vec::<ConnectionId>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobby.bit_length() + self.name.bit_length() + self.members.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LobbyLeft {
    pub lobby: LobbyId,
}

impl Serde for LobbyLeft {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobby.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobby: LobbyId::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobby.bit_length()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LobbySummary {
    pub lobby: LobbyId,
    pub name: String,
    pub members: u32,
}

impl Serde for LobbySummary {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobby.ser(writer);
        self.name.ser(writer);
        self.members.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobby: LobbyId::de(reader)?,
            name: String::de(reader)?,
            members: u32::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobby.bit_length() + self.name.bit_length() + self.members.bit_length()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LobbyList {
    pub lobbies: Vec<LobbySummary>,
}

impl Serde for LobbyList {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.lobbies.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            lobbies: Vec::<LobbySummary>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.lobbies.bit_length()
    }
}
