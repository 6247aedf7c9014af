pub mod direct_session;
pub mod relay_session;

pub use direct_session::{DirectSession, DirectTick};
pub use logging::init_logging;
pub use recording_policy::{PolicyLog, RecordingPolicy};
pub use relay_session::{RelaySession, RelayTick};

use std::time::Duration;

/// Time advanced per simulated tick
pub const TICK: Duration = Duration::from_millis(20);

/// Ticks enough for any request and its confirmation to settle
pub const SETTLE_TICKS: usize = 6;
