mod access_level;
mod behavior_mode;
mod entity_record;
mod entity_store;
mod error;
mod spawn_info;

pub use access_level::OwnershipAccessLevel;
pub use behavior_mode::BehaviorMode;
pub use entity_record::{EntityRecord, Handshake};
pub use entity_store::EntityStore;
pub use error::WorldError;
pub use spawn_info::SpawnInfo;
