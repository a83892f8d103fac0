//! Incremental path: one event, one band repaint.
//!
//! Falls back to a full history replay only when the event invalidates more
//! than its own band: a trade near a price edge, a band outgrowing the color
//! domain, or time running out of the window.

use exchange::{Event, Price};

use super::engine::{Engine, Invalidation, Outcome, Phase};
use super::geometry;
use super::surface::Raster;

/// 9999-12-31T23:59:59.999Z. Anything later is a corrupt timestamp.
const MAX_EVENT_TIMESTAMP_MS: u64 = 253_402_300_799_999;
/// Bound on the multiplicative steps of one auto-zoom.
const MAX_ZOOM_STEPS: usize = 1_024;

fn is_plausible(event: &Event) -> bool {
    if event.timestamp() > MAX_EVENT_TIMESTAMP_MS {
        log::warn!("Dropping event with implausible timestamp {}", event.timestamp());
        return false;
    }
    if event.price().units < 0 {
        log::warn!("Dropping event with negative price {}", event.price());
        return false;
    }
    true
}

impl Engine {
    pub fn apply_update(&mut self, event: Event, raster: &mut dyn Raster) -> Outcome {
        if self.phase == Phase::Rebuilding {
            self.queue.push_back(event);
            return Outcome::Queued;
        }

        let outcome = self.process(event, raster);
        self.drain_queue(raster);
        outcome
    }

    pub(super) fn drain_queue(&mut self, raster: &mut dyn Raster) {
        while self.phase == Phase::Idle {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            self.process(event, raster);
        }
    }

    fn process(&mut self, event: Event, raster: &mut dyn Raster) -> Outcome {
        if !is_plausible(&event) {
            return Outcome::Rejected;
        }
        let Some(timestamp) = self.log.admit(event.timestamp()) else {
            return Outcome::Rejected;
        };

        let price = event.price();
        let is_bid = event.side().is_bid();

        let delta = match event {
            Event::Modification { new_amount, .. } => {
                self.ledger.apply_modification(price, new_amount, is_bid)
            }
            Event::Removal { .. } => self.ledger.apply_removal(price, is_bid),
            Event::NewTrade { amount_traded, .. } => {
                let delta = self.ledger.apply_trade(price, amount_traded, is_bid);
                self.overlay
                    .add_trade(&self.viewport, price, amount_traded, timestamp, is_bid);
                delta
            }
        };

        if !event.is_trade() {
            self.overlay.extend_lines(&self.viewport, timestamp);
        }

        // writes to unknown levels left the ledger untouched
        if let Some(level) = self.ledger.get(price) {
            self.log.record(price, level.volume, level.is_bid, timestamp);
        }

        if event.is_trade() && !self.viewport.manual_zoom && self.auto_zoom(price) {
            self.grow_time_window(timestamp);
            self.replay_history(raster, true);
            return Outcome::Rebuilt(Invalidation::AutoZoom);
        }

        // a zoomed window stays where the user put it
        if self.viewport.manual_zoom && timestamp > self.viewport.max_timestamp {
            return Outcome::Invisible;
        }

        let Some(idx) = geometry::visible_band(&self.viewport, price) else {
            return Outcome::Invisible;
        };

        let next_volume = (self.bands[idx].volume + delta).non_negative();
        let stale_domain = next_volume > self.viewport.color_domain_max;
        let stale_window = self.past_time_trigger(timestamp);

        if stale_domain || stale_window {
            if stale_domain {
                log::debug!(
                    "Band {idx} at {next_volume} outgrew color domain {}",
                    self.viewport.color_domain_max
                );
                self.set_color_domain(next_volume, timestamp);
            }
            self.grow_time_window(timestamp);
            self.replay_history(raster, false);

            return Outcome::Rebuilt(if stale_domain {
                Invalidation::ColorDomain
            } else {
                Invalidation::TimeWindow
            });
        }

        let band = &mut self.bands[idx];
        band.end_timestamp = timestamp;
        if band.volume.units > 0 && timestamp > band.start_timestamp {
            raster.fill_rect(
                geometry::band_rect(&self.viewport, idx, band.start_timestamp, timestamp),
                self.scale.color(band.volume),
            );
        }
        band.start_timestamp = timestamp;
        band.apply(delta);

        Outcome::Painted
    }

    /// Frame tick: stretches every band to `now`. Throttled to the time granularity.
    pub fn refresh(&mut self, now: u64, raster: &mut dyn Raster) -> Option<Outcome> {
        if self.phase == Phase::Rebuilding || now > MAX_EVENT_TIMESTAMP_MS {
            return None;
        }
        if let Some(last) = self.last_refresh {
            if now < last.saturating_add(self.viewport.time_granularity) {
                return None;
            }
        }
        self.last_refresh = Some(now);

        if self.past_time_trigger(now) {
            self.grow_time_window(now);
            self.rebuild(raster, false);
            return Some(Outcome::Rebuilt(Invalidation::TimeWindow));
        }

        let until = if self.viewport.manual_zoom {
            now.min(self.viewport.max_timestamp)
        } else {
            now
        };
        self.paint_bands(raster, until);
        Some(Outcome::Painted)
    }

    /// Paints every band from its start up to `until`.
    pub(super) fn paint_bands(&mut self, raster: &mut dyn Raster, until: u64) {
        for (idx, band) in self.bands.iter_mut().enumerate() {
            band.end_timestamp = until.max(band.start_timestamp);

            if band.volume.units > 0 && band.end_timestamp > band.start_timestamp {
                raster.fill_rect(
                    geometry::band_rect(
                        &self.viewport,
                        idx,
                        band.start_timestamp,
                        band.end_timestamp,
                    ),
                    self.scale.color(band.volume),
                );
            }
        }
    }

    /// Always false while zoomed manually.
    pub(super) fn past_time_trigger(&self, timestamp: u64) -> bool {
        let v = &self.viewport;
        if v.manual_zoom {
            return false;
        }
        let trigger = v.min_timestamp as f64 + self.config.time_window_trigger * v.time_range() as f64;
        timestamp as f64 > trigger
    }

    /// Grows the right edge of the time window until `timestamp` sits before the trigger.
    pub(super) fn grow_time_window(&mut self, timestamp: u64) {
        let before = self.viewport.max_timestamp;

        while self.past_time_trigger(timestamp) && self.viewport.max_timestamp < u64::MAX {
            let range = self.viewport.time_range().max(1) as f64;
            let growth = ((range * self.config.time_window_growth).ceil() as u64).max(1);
            self.viewport.max_timestamp = self.viewport.max_timestamp.saturating_add(growth);
        }

        if self.viewport.max_timestamp != before {
            log::debug!(
                "Time window grown to {}..{} for {timestamp}",
                self.viewport.min_timestamp,
                self.viewport.max_timestamp
            );
        }
    }

    /// Widens the price window if a trade landed near or past one of its edges.
    fn auto_zoom(&mut self, price: Price) -> bool {
        let edge = self.config.auto_zoom_edge;
        let step = self.config.auto_zoom_expansion;
        let (min, max) = (self.viewport.min_price, self.viewport.max_price);

        let mut changed = false;

        if price.to_f64() >= max.to_f64() * (1.0 - edge) {
            let mut next = max;
            for _ in 0..MAX_ZOOM_STEPS {
                let grown = next.scaled(1.0 + step);
                next = Price::from_units(grown.units.max(next.units.saturating_add(1)));
                if next > price {
                    break;
                }
            }
            // out of steps or saturated
            if next <= price {
                next = Price::from_units(price.units.saturating_add(1));
            }
            self.viewport.max_price = next;
            changed = true;
        }

        if price.to_f64() <= min.to_f64() * (1.0 + edge) && min.units > 0 {
            let mut next = min;
            for _ in 0..MAX_ZOOM_STEPS {
                let shrunk = next.scaled(1.0 - step);
                next = Price::from_units(shrunk.units.min(next.units - 1).max(0));
                if next <= price || next.units == 0 {
                    break;
                }
            }
            if next > price {
                next = Price::from_units(price.units.max(0));
            }
            self.viewport.min_price = next;
            changed = true;
        }

        if changed {
            log::info!(
                "Trade at {price} near the edge, price window now {}..{}",
                self.viewport.min_price,
                self.viewport.max_price
            );
        }
        changed
    }
}
