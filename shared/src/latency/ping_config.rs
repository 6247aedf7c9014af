use std::time::Duration;

/// Contains Config properties which will be used by a Server, Client or Relay
/// to estimate round trip time
#[derive(Clone, Debug)]
pub struct PingConfig {
    /// The duration to wait before sending a ping message to the remote host
    pub ping_interval: Duration,
    /// Number of round trips averaged into the reported latency
    pub sample_size: usize,
    /// Pings with no echo after this long are presumed lost and forgotten
    pub stale_after: Duration,
    /// Latency reported before the first echo arrives
    pub default_latency_ms: f32,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_millis(100),
            sample_size: 100,
            stale_after: Duration::from_secs(1),
            default_latency_ms: 200.0,
        }
    }
}
