use std::ops::Range;

use crate::types::EventCode;

/// Outer code marking an entity-scoped envelope: `[tag][inner code][entity id]`
pub const OBJECT_EVENT_TAG: EventCode = -1;

pub const CORE_RANGE: Range<EventCode> = 0..1000;
pub const INTERNAL_RANGE: Range<EventCode> = 1000..2000;
pub const RELAY_RANGE: Range<EventCode> = 2000..3000;
pub const LOBBY_RANGE: Range<EventCode> = 3000..4000;
pub const OBJECT_RANGE: Range<EventCode> = 4000..10000;
pub const USER_RANGE: Range<EventCode> = 10000..20000;
pub const USER_OBJECT_RANGE: Range<EventCode> = 20000..30000;

/// The namespace an event code belongs to. Decided once when a message is
/// decoded, every later routing decision matches on this instead of on ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Core,
    /// Ownership protocol, always entity-scoped
    Internal,
    Relay,
    Lobby,
    /// Engine per-entity events (replication synchronizers), always entity-scoped
    Object,
    User,
    /// Application per-entity events, carries the entity id without the object tag
    UserObject,
}

impl EventCategory {
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Core,
        EventCategory::Internal,
        EventCategory::Relay,
        EventCategory::Lobby,
        EventCategory::Object,
        EventCategory::User,
        EventCategory::UserObject,
    ];

    /// Classifies a (non-tag) event code. Returns None for codes outside every range.
    pub fn of(code: EventCode) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.contains(code))
    }

    pub fn range(&self) -> Range<EventCode> {
        match self {
            EventCategory::Core => CORE_RANGE,
            EventCategory::Internal => INTERNAL_RANGE,
            EventCategory::Relay => RELAY_RANGE,
            EventCategory::Lobby => LOBBY_RANGE,
            EventCategory::Object => OBJECT_RANGE,
            EventCategory::User => USER_RANGE,
            EventCategory::UserObject => USER_OBJECT_RANGE,
        }
    }

    pub fn contains(&self, code: EventCode) -> bool {
        self.range().contains(&code)
    }

    /// Whether messages of this category carry an entity id
    pub fn is_entity_scoped(&self) -> bool {
        matches!(
            self,
            EventCategory::Internal | EventCategory::Object | EventCategory::UserObject
        )
    }

    /// Whether messages of this category travel inside the object tag envelope
    pub fn uses_object_tag(&self) -> bool {
        matches!(self, EventCategory::Internal | EventCategory::Object)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventCategory::Core => "Core",
            EventCategory::Internal => "Internal",
            EventCategory::Relay => "Relay",
            EventCategory::Lobby => "Lobby",
            EventCategory::Object => "Object",
            EventCategory::User => "User",
            EventCategory::UserObject => "UserObject",
        }
    }
}

pub mod core_events {
    use crate::types::EventCode;

    pub const CONNECTION_ACCEPTED: EventCode = 1;
    pub const PING: EventCode = 2;
    pub const SPAWN_ENTITY: EventCode = 3;
    pub const DESPAWN_ENTITY: EventCode = 4;
    pub const PEER_DISCONNECTED: EventCode = 5;
}

pub mod internal_events {
    use crate::types::EventCode;

    pub const TAKE_CONTROL: EventCode = 1000;
    pub const TAKE_CONTROL_SUCCESS: EventCode = 1001;
    pub const RELEASE_CONTROL: EventCode = 1002;
    pub const RELEASE_CONTROL_SUCCESS: EventCode = 1003;
    pub const TRANSFER_CONTROL: EventCode = 1004;
}

pub mod relay_events {
    use crate::types::EventCode;

    pub const REGISTER_PLAYER: EventCode = 2000;
    pub const PLAYER_REGISTERED: EventCode = 2001;
    pub const FORCE_DISCONNECT: EventCode = 2002;
    pub const MASTER_ASSIGNED: EventCode = 2003;
    pub const OWNER_DISCONNECTED: EventCode = 2004;
    pub const P2P_REQUEST: EventCode = 2010;
    pub const P2P_OPEN: EventCode = 2011;
    pub const P2P_RESULT: EventCode = 2012;
    pub const P2P_STATUS: EventCode = 2013;
}

pub mod lobby_events {
    use crate::types::EventCode;

    pub const CREATE_LOBBY: EventCode = 3000;
    pub const JOIN_LOBBY: EventCode = 3001;
    pub const LEAVE_LOBBY: EventCode = 3002;
    pub const LOBBY_JOINED: EventCode = 3003;
    pub const LIST_LOBBIES: EventCode = 3004;
    pub const LOBBY_LIST: EventCode = 3005;
    pub const LOBBY_LEFT: EventCode = 3006;
}
