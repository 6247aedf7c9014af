#[allow(clippy::module_inception)]
mod relay;
mod relay_config;
mod relay_state;

pub use relay::Relay;
pub use relay_config::RelayConfig;
pub use relay_state::RelayState;
