use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::types::PingIndex;

/// How many purged ids are remembered so their late echoes can be recognized
const RETIRED_CAPACITY: usize = 128;

/// Pings sent to the remote host and still waiting for their echo, oldest
/// first, plus the ids most recently given up on
pub struct PingStore {
    pending: VecDeque<(PingIndex, Instant)>,
    retired: VecDeque<PingIndex>,
}

impl Default for PingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PingStore {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            retired: VecDeque::with_capacity(RETIRED_CAPACITY),
        }
    }

    pub fn push(&mut self, index: PingIndex, sent_at: Instant) {
        self.pending.push_back((index, sent_at));
    }

    pub fn remove(&mut self, index: PingIndex) -> Option<Instant> {
        let position = self.pending.iter().position(|(pending, _)| *pending == index)?;
        self.pending.remove(position).map(|(_, sent_at)| sent_at)
    }

    /// Drops every ping sent more than `stale_after` before `now`, returning how many
    pub fn purge(&mut self, now: Instant, stale_after: Duration) -> usize {
        let mut purged = 0;
        while let Some((index, sent_at)) = self.pending.front().copied() {
            if now.saturating_duration_since(sent_at) <= stale_after {
                break;
            }
            self.pending.pop_front();
            self.retire(index);
            purged += 1;
        }
        purged
    }

    /// Whether `index` is one of ours that was purged before its echo came back.
    /// Forgets it, each late echo is recognized once.
    pub fn take_retired(&mut self, index: PingIndex) -> bool {
        match self.retired.iter().position(|retired| *retired == index) {
            Some(position) => {
                self.retired.remove(position);
                true
            }
            None => false,
        }
    }

    fn retire(&mut self, index: PingIndex) {
        if self.retired.len() >= RETIRED_CAPACITY {
            self.retired.pop_front();
        }
        self.retired.push_back(index);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
