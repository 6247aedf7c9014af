use std::{collections::VecDeque, time::Instant};

use log::debug;

use crate::{
    latency::{ping_config::PingConfig, ping_store::PingStore},
    types::PingIndex,
};

/// What to do with a ping that arrived from the remote host
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PingOutcome {
    /// It was the echo of one of our pings, this round trip took the given milliseconds
    Measured(f32),
    /// It is the remote host's own ping, send it back unchanged
    Echo,
    /// A late echo of a ping already given up on, drop it
    Late,
}

/// Sends regular pings and keeps a rolling average of the measured round trips.
/// The same manager answers the remote host's pings, so both ends of a link
/// run the same code.
pub struct PingManager {
    config: PingConfig,
    last_sent: Option<Instant>,
    next_index: PingIndex,
    sent_pings: PingStore,
    samples: VecDeque<f32>,
}

impl PingManager {
    pub fn new(config: &PingConfig) -> Self {
        Self::with_start_index(config, fastrand::u32(..))
    }

    /// Starts transaction ids at `start_index` instead of a random value
    pub fn with_start_index(config: &PingConfig, start_index: PingIndex) -> Self {
        Self {
            config: config.clone(),
            last_sent: None,
            next_index: start_index,
            sent_pings: PingStore::new(),
            samples: VecDeque::with_capacity(config.sample_size),
        }
    }

    /// Returns whether a ping message should be sent
    pub fn should_send_ping(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last_sent) => now.saturating_duration_since(last_sent) >= self.config.ping_interval,
        }
    }

    /// Records a new pending ping and returns the transaction id to send
    pub fn next_ping(&mut self, now: Instant) -> PingIndex {
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);
        self.last_sent = Some(now);
        self.sent_pings.push(index, now);
        index
    }

    /// Process an incoming ping payload
    pub fn on_ping(&mut self, index: PingIndex, now: Instant) -> PingOutcome {
        match self.sent_pings.remove(index) {
            Some(sent_at) => {
                let rtt_ms = now.saturating_duration_since(sent_at).as_secs_f32() * 1000.0;
                self.record_sample(rtt_ms);
                PingOutcome::Measured(rtt_ms)
            }
            None if self.sent_pings.take_retired(index) => {
                debug!("Ignoring late echo of ping {}", index);
                PingOutcome::Late
            }
            None => PingOutcome::Echo,
        }
    }

    pub fn purge_stale(&mut self, now: Instant) -> usize {
        let purged = self.sent_pings.purge(now, self.config.stale_after);
        if purged > 0 {
            debug!("Discarded {} unanswered pings", purged);
        }
        purged
    }

    /// Pushes a round trip into the window, evicting the oldest once full
    pub fn record_sample(&mut self, rtt_ms: f32) {
        if self.config.sample_size == 0 {
            return;
        }
        while self.samples.len() >= self.config.sample_size {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
    }

    /// Mean of the sample window, or the configured default before any echo
    pub fn latency_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return self.config.default_latency_ms;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn pending_count(&self) -> usize {
        self.sent_pings.len()
    }
}
