use exchange::Qty;

use super::geometry;
use super::ledger::Ledger;
use super::viewport::Viewport;

/// Aggregated volume of one price slot since `start_timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub volume: Qty,
}

impl Band {
    pub fn new(timestamp: u64) -> Self {
        Self {
            start_timestamp: timestamp,
            end_timestamp: timestamp,
            volume: Qty::ZERO,
        }
    }

    /// Adds `delta`, never dropping below zero.
    pub fn apply(&mut self, delta: Qty) {
        let next = self.volume + delta;
        if next.is_negative() {
            log::warn!("Band volume {} - {} would go negative, clamped", self.volume, -delta);
        }
        self.volume = next.non_negative();
    }
}

/// One band per price slot, summing every in-window level of `levels`.
pub fn initial_bands(levels: &Ledger, viewport: &Viewport, timestamp: u64) -> Vec<Band> {
    let mut bands = vec![Band::new(timestamp); viewport.price_granularity.max(1)];

    for (price, level) in levels.iter() {
        if let Some(idx) = geometry::visible_band(viewport, *price) {
            bands[idx].volume += level.volume;
        }
    }

    bands
}

pub fn max_visible_band_volume(levels: &Ledger, viewport: &Viewport) -> Qty {
    max_volume(&initial_bands(levels, viewport, viewport.min_timestamp))
}

pub fn max_volume(bands: &[Band]) -> Qty {
    bands.iter().map(|b| b.volume).max().unwrap_or(Qty::ZERO)
}

pub fn total_volume(bands: &[Band]) -> Qty {
    bands.iter().map(|b| b.volume).sum()
}
