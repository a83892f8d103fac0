use std::collections::VecDeque;

use exchange::{Price, Qty};
use serde::{Deserialize, Serialize};

use super::ledger::Ledger;

/// Absolute volume of one price level after an event, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateLogEntry {
    pub price: Price,
    pub volume: Qty,
    pub is_bid: bool,
    pub timestamp: u64,
}

/// What to do with an event stamped earlier than the last one recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum OutOfOrderPolicy {
    /// Restamp it to the last recorded timestamp and keep it.
    #[default]
    Clamp,
    /// Drop it.
    Reject,
}

/// Append-only history of price-level writes, kept sorted by timestamp.
///
/// With a capacity set, the oldest entries are folded into a base image of the
/// book (last write wins) so that any window starting at or after the
/// compaction horizon still replays exactly.
#[derive(Debug, Clone, Default)]
pub struct UpdateLog {
    entries: VecDeque<UpdateLogEntry>,
    base: Vec<UpdateLogEntry>,
    horizon: Option<u64>,
    capacity: Option<usize>,
    policy: OutOfOrderPolicy,
    last_timestamp: Option<u64>,
}

impl UpdateLog {
    pub fn new(policy: OutOfOrderPolicy, capacity: Option<usize>) -> Self {
        Self {
            policy,
            capacity: capacity.map(|c| c.max(1)),
            ..Self::default()
        }
    }

    /// Timestamp an incoming event should be recorded under, or `None` if it
    /// has to be dropped.
    pub fn admit(&self, timestamp: u64) -> Option<u64> {
        match self.last_timestamp {
            Some(last) if timestamp < last => match self.policy {
                OutOfOrderPolicy::Clamp => {
                    log::warn!("Out-of-order event at {timestamp} (last {last}), restamped");
                    Some(last)
                }
                OutOfOrderPolicy::Reject => {
                    log::warn!("Out-of-order event at {timestamp} (last {last}), dropped");
                    None
                }
            },
            _ => Some(timestamp),
        }
    }

    pub fn record(&mut self, price: Price, volume: Qty, is_bid: bool, timestamp: u64) {
        let timestamp = self.last_timestamp.map_or(timestamp, |last| timestamp.max(last));

        self.entries.push_back(UpdateLogEntry {
            price,
            volume,
            is_bid,
            timestamp,
        });
        self.last_timestamp = Some(timestamp);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.compact_front();
            }
        }
    }

    fn compact_front(&mut self) {
        let Some(entry) = self.entries.pop_front() else {
            return;
        };

        match self.base.iter_mut().find(|e| e.price == entry.price) {
            Some(slot) => *slot = entry,
            None => self.base.push(entry),
        }
        self.horizon = Some(entry.timestamp);
    }

    /// Entries strictly after `timestamp`.
    pub fn entries_since(&self, timestamp: u64) -> impl Iterator<Item = &UpdateLogEntry> {
        let start = self.entries.partition_point(|e| e.timestamp <= timestamp);
        self.entries.range(start..)
    }

    /// Entries at or before `timestamp`.
    pub fn entries_until(&self, timestamp: u64) -> impl Iterator<Item = &UpdateLogEntry> {
        let end = self.entries.partition_point(|e| e.timestamp <= timestamp);
        self.entries.range(..end)
    }

    /// Image of the book as of `timestamp`, replayed last-write-wins.
    pub fn baseline(&self, timestamp: u64) -> Ledger {
        if let Some(horizon) = self.horizon.filter(|h| *h > timestamp) {
            log::warn!(
                "Replay from {timestamp} predates compacted history ({horizon}), using oldest image"
            );
        }

        let mut ledger = Ledger::new();
        for e in self.base.iter().chain(self.entries_until(timestamp)) {
            ledger.restore(e.price, e.volume, e.is_bid);
        }
        ledger
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }

    pub fn horizon(&self) -> Option<u64> {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn q(s: &str) -> Qty {
        s.parse().unwrap()
    }

    fn sample() -> UpdateLog {
        let mut log = UpdateLog::new(OutOfOrderPolicy::Clamp, None);
        log.record(p("1.00"), q("2"), true, 1_000);
        log.record(p("2.30"), q("18.2"), false, 1_000);
        log.record(p("1.00"), q("5"), true, 1_500);
        log.record(p("2.30"), q("30"), false, 2_000);
        log
    }

    #[test]
    fn since_is_exclusive_until_is_inclusive() {
        let log = sample();

        let since: Vec<_> = log.entries_since(1_000).map(|e| e.timestamp).collect();
        assert_eq!(since, vec![1_500, 2_000]);

        let until: Vec<_> = log.entries_until(1_500).map(|e| e.timestamp).collect();
        assert_eq!(until, vec![1_000, 1_000, 1_500]);
    }

    #[test]
    fn baseline_is_last_write_wins() {
        let log = sample();
        let ledger = log.baseline(1_500);

        assert_eq!(ledger.volume(p("1.00")), q("5"));
        assert_eq!(ledger.volume(p("2.30")), q("18.2"));
    }

    #[test]
    fn out_of_order_policies() {
        let log = sample();
        assert_eq!(log.admit(2_500), Some(2_500));
        assert_eq!(log.admit(1_200), Some(2_000));

        let mut strict = UpdateLog::new(OutOfOrderPolicy::Reject, None);
        strict.record(p("1.00"), q("1"), true, 5_000);
        assert_eq!(strict.admit(4_999), None);
        assert_eq!(strict.admit(5_000), Some(5_000));
    }

    #[test]
    fn record_never_goes_backwards() {
        let mut log = sample();
        log.record(p("1.00"), q("1"), true, 10);
        assert_eq!(log.last_timestamp(), Some(2_000));
    }

    #[test]
    fn compaction_preserves_later_baselines() {
        let full = sample();
        let mut capped = UpdateLog::new(OutOfOrderPolicy::Clamp, Some(2));
        for e in full.entries_since(0) {
            capped.record(e.price, e.volume, e.is_bid, e.timestamp);
        }

        assert_eq!(capped.len(), 2);
        assert_eq!(capped.horizon(), Some(1_000));
        assert_eq!(capped.baseline(1_000), full.baseline(1_000));
        assert_eq!(capped.baseline(2_000), full.baseline(2_000));
    }
}
