mod ping_config;
mod ping_manager;
mod ping_store;

pub use ping_config::PingConfig;
pub use ping_manager::{PingManager, PingOutcome};
pub use ping_store::PingStore;
