mod relay_events;

pub use relay_events::{DisconnectEvent, ErrorEvent, RegisterEvent, RelayEvent, RelayEvents};
