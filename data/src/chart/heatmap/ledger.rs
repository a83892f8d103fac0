use exchange::{Price, Qty, Snapshot};
use rustc_hash::FxHashMap;

use super::geometry;
use super::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceLevel {
    pub volume: Qty,
    pub is_bid: bool,
}

/// Latest known volume per price.
///
/// A level that was removed stays in the map with zero volume; only levels
/// that were never seen are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    levels: FxHashMap<Price, PriceLevel>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut ledger = Self::new();
        for level in &snapshot.levels {
            ledger.apply_modification(level.price, level.volume, level.is_bid);
        }
        ledger
    }

    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn volume(&self, price: Price) -> Qty {
        self.levels.get(&price).map_or(Qty::ZERO, |l| l.volume)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Price, &PriceLevel)> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Sets `price` to exactly `new_volume` and returns the change.
    pub fn apply_modification(&mut self, price: Price, new_volume: Qty, is_bid: bool) -> Qty {
        let new_volume = if new_volume.is_negative() {
            log::warn!("Negative volume {new_volume} at {price}, clamped to zero");
            Qty::ZERO
        } else {
            new_volume
        };

        let level = self.levels.entry(price).or_default();
        let delta = new_volume - level.volume;

        level.volume = new_volume;
        level.is_bid = is_bid;

        delta
    }

    /// Empties `price`. Unknown prices are left untouched and yield a zero delta.
    pub fn apply_removal(&mut self, price: Price, is_bid: bool) -> Qty {
        match self.levels.get_mut(&price) {
            Some(level) => {
                let delta = -level.volume;
                level.volume = Qty::ZERO;
                level.is_bid = is_bid;
                delta
            }
            None => {
                log::warn!("Removal at unknown price level {price}");
                Qty::ZERO
            }
        }
    }

    /// Consumes `amount` of resting volume at `price`. Never takes a level below zero.
    pub fn apply_trade(&mut self, price: Price, amount: Qty, is_bid: bool) -> Qty {
        let amount = amount.non_negative();

        let Some(level) = self.levels.get_mut(&price) else {
            log::warn!("Trade of {amount} at unknown price level {price}");
            return Qty::ZERO;
        };

        let consumed = if amount > level.volume {
            log::warn!(
                "Trade of {amount} at {price} exceeds resting volume {}, clamped",
                level.volume
            );
            level.volume
        } else {
            amount
        };

        level.volume -= consumed;
        level.is_bid = is_bid;

        -consumed
    }

    /// Best bid and best ask among levels holding volume.
    pub fn top_of_book(&self) -> (Option<Price>, Option<Price>) {
        let live = self.levels.iter().filter(|(_, l)| l.volume > Qty::ZERO);

        let (mut bid, mut ask): (Option<Price>, Option<Price>) = (None, None);
        for (price, level) in live {
            if level.is_bid {
                bid = bid.max(Some(*price));
            } else {
                ask = Some(ask.map_or(*price, |a| a.min(*price)));
            }
        }
        (bid, ask)
    }

    /// Total volume resting inside the visible price window.
    pub fn in_window_total(&self, viewport: &Viewport) -> Qty {
        self.levels
            .iter()
            .filter(|(price, _)| geometry::visible_band(viewport, **price).is_some())
            .map(|(_, level)| level.volume)
            .sum()
    }

    /// Overwrites a level without computing a delta. Used when restoring a
    /// recorded image of the book.
    pub(crate) fn restore(&mut self, price: Price, volume: Qty, is_bid: bool) {
        self.levels.insert(price, PriceLevel { volume, is_bid });
    }
}
