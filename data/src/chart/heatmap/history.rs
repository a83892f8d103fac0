use super::band::{self, Band};
use super::engine::{Engine, Phase};
use super::geometry;
use super::ledger::Ledger;
use super::surface::Raster;
use super::update_log::UpdateLog;
use super::viewport::Viewport;

/// Applies the logged writes in `(viewport.min_timestamp, until]` to `bands`,
/// keeping `levels` in step. `visit` sees each affected band before its delta
/// lands. Returns the last timestamp replayed.
fn replay<F>(
    log: &UpdateLog,
    viewport: &Viewport,
    levels: &mut Ledger,
    bands: &mut [Band],
    until: Option<u64>,
    mut visit: F,
) -> Option<u64>
where
    F: FnMut(usize, &mut Band, u64),
{
    let mut last = None;

    for entry in log
        .entries_since(viewport.min_timestamp)
        .take_while(|e| until.is_none_or(|until| e.timestamp <= until))
    {
        let delta = entry.volume - levels.volume(entry.price);
        levels.restore(entry.price, entry.volume, entry.is_bid);

        if let Some(idx) = geometry::visible_band(viewport, entry.price) {
            if let Some(band) = bands.get_mut(idx) {
                visit(idx, band, entry.timestamp);
                band.apply(delta);
            }
        }

        last = Some(entry.timestamp);
    }

    last
}

impl Engine {
    /// Repaints everything from the update log for the current viewport,
    /// then processes whatever queued up meanwhile.
    pub fn rebuild(&mut self, raster: &mut dyn Raster, recalc_color_domain: bool) {
        self.replay_history(raster, recalc_color_domain);
        self.drain_queue(raster);
    }

    pub(super) fn replay_history(&mut self, raster: &mut dyn Raster, recalc_color_domain: bool) {
        self.phase = Phase::Rebuilding;
        raster.clear(self.scheme.background());

        let viewport = self.viewport;
        log::debug!(
            "Rebuilding {} bands over {}..{} from {} log entries",
            viewport.price_granularity,
            viewport.min_timestamp,
            viewport.max_timestamp,
            self.log.len()
        );

        let mut levels = self.log.baseline(viewport.min_timestamp);
        let baseline = band::initial_bands(&levels, &viewport, viewport.min_timestamp);

        if recalc_color_domain {
            // running max over the whole replay, not just where it ends
            let mut domain = band::max_volume(&baseline);
            let mut scratch = baseline.clone();

            replay(
                &self.log,
                &viewport,
                &mut levels.clone(),
                &mut scratch,
                None,
                |_, band, _| domain = domain.max(band.volume),
            );
            domain = domain.max(band::max_volume(&scratch));

            let at = self.log.last_timestamp().unwrap_or(viewport.min_timestamp);
            self.set_color_domain(domain, at);
        }

        self.bands = baseline;

        let pixel_ms = geometry::pixel_duration(&viewport);
        let scale = &self.scale;

        let last = replay(
            &self.log,
            &viewport,
            &mut levels,
            &mut self.bands,
            Some(viewport.max_timestamp),
            |idx, band, timestamp| {
                // sub-pixel spans are folded into the next paint
                if (timestamp.saturating_sub(band.start_timestamp)) as f64 > pixel_ms {
                    band.end_timestamp = timestamp;
                    if band.volume.units > 0 {
                        raster.fill_rect(
                            geometry::band_rect(&viewport, idx, band.start_timestamp, timestamp),
                            scale.color(band.volume),
                        );
                    }
                    band.start_timestamp = timestamp;
                }
            },
        );

        self.overlay.reposition(&self.viewport);
        self.paint_bands(raster, last.unwrap_or(viewport.min_timestamp));

        self.phase = Phase::Idle;
    }

    /// Band state a rebuild of the current viewport would produce, without painting.
    pub(super) fn replayed_bands(&self) -> Vec<Band> {
        let viewport = self.viewport;
        let mut levels = self.log.baseline(viewport.min_timestamp);
        let mut bands = band::initial_bands(&levels, &viewport, viewport.min_timestamp);

        replay(
            &self.log,
            &viewport,
            &mut levels,
            &mut bands,
            Some(viewport.max_timestamp),
            |_, _, _| {},
        );

        bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::heatmap::engine::tests::{engine, p, q};
    use crate::chart::heatmap::surface::{Command, NullSurface, RecordingRaster};
    use exchange::{Event, Qty};

    fn modification(timestamp: u64, price: &str, amount: &str, is_bid: bool) -> Event {
        Event::Modification {
            timestamp,
            price: p(price),
            new_amount: q(amount),
            is_bid,
        }
    }

    #[test]
    fn rebuild_clears_then_paints_final_state() {
        let mut engine = engine();
        engine.apply_update(modification(1_000, "1.00", "5", true), &mut NullSurface);
        engine.apply_update(modification(3_000, "2.00", "1", false), &mut NullSurface);

        let mut raster = RecordingRaster::default();
        engine.rebuild(&mut raster, false);

        assert!(matches!(raster.commands.first(), Some(Command::Clear(_))));
        assert_eq!(raster.clears(), 1);
        assert_eq!(engine.bands()[0].volume, q("5"));
        assert_eq!(engine.bands()[1].volume, q("19.2"));
        assert!(engine.bands().iter().all(|b| b.end_timestamp == 3_000));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn sub_pixel_spans_are_not_painted() {
        let mut engine = engine();
        // one pixel is ~22ms on a 900px, 20s window
        engine.apply_update(modification(5, "1.00", "3", true), &mut NullSurface);
        engine.apply_update(modification(10, "1.00", "4", true), &mut NullSurface);
        engine.apply_update(modification(5_000, "1.00", "6", true), &mut NullSurface);

        let mut raster = RecordingRaster::default();
        engine.rebuild(&mut raster, false);

        let band0: Vec<_> = raster
            .fills()
            .into_iter()
            .filter(|(rect, _)| rect.y >= 299.0)
            .collect();
        // [0, 5000) in one piece, then the final pass from 5000
        assert_eq!(band0.len(), 1);
        assert_eq!(band0[0].0.x, 60.0);
        assert_eq!(engine.bands()[0].volume, q("6"));
        assert_eq!(engine.bands()[0].start_timestamp, 5_000);
    }

    #[test]
    fn recalculated_domain_is_running_max() {
        let mut engine = engine();
        engine.apply_update(modification(1_000, "2.30", "40", false), &mut NullSurface);
        engine.apply_update(modification(2_000, "2.30", "1", false), &mut NullSurface);

        engine.rebuild(&mut NullSurface, true);
        assert_eq!(engine.color_domain_max(), q("40"));
    }

    #[test]
    fn rebuild_of_later_window_starts_from_baseline() {
        let mut engine = engine();
        engine.apply_update(modification(1_000, "1.00", "5", true), &mut NullSurface);
        engine.apply_update(modification(9_000, "1.00", "7", true), &mut NullSurface);

        engine.viewport.min_timestamp = 5_000;
        engine.rebuild(&mut NullSurface, true);

        assert_eq!(engine.bands()[0].volume, q("7"));
        assert_eq!(engine.replayed_bands()[0].volume, q("7"));
        assert_eq!(engine.verify_against_rebuild(), Ok(()));
    }

    #[test]
    fn missing_history_degrades_to_zero() {
        let mut engine = engine();
        engine.apply_update(modification(1_000, "1.50", "3", true), &mut NullSurface);

        // a level that never existed contributes nothing
        engine.apply_update(
            Event::NewTrade {
                timestamp: 2_000,
                price: p("1.40"),
                amount_traded: q("1"),
                was_bid_filled: true,
            },
            &mut NullSurface,
        );
        engine.rebuild(&mut NullSurface, true);

        assert_eq!(engine.bands()[0].volume, q("5"));
        assert!(engine.bands().iter().all(|b| b.volume >= Qty::ZERO));
    }
}
