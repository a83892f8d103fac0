use std::collections::VecDeque;

use exchange::{Event, Price, Qty, Snapshot};
use iced_core::{Point, Rectangle, Size};

use super::band::{self, Band};
use super::color::{ColorScale, LchRamp};
use super::geometry;
use super::ledger::Ledger;
use super::overlay::Overlay;
use super::surface::{Raster, VectorSurface};
use super::update_log::UpdateLog;
use super::viewport::{Viewport, Window};
use super::Config;
use crate::config::theme::ColorScheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A full history replay is running; incoming events are queued.
    Rebuilding,
}

/// Why the incremental path gave way to a full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    AutoZoom,
    ColorDomain,
    TimeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A single band was repainted.
    Painted,
    /// Outside the price window; only the ledger and log changed.
    Invisible,
    Rebuilt(Invalidation),
    Queued,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainChange {
    pub timestamp: u64,
    pub max: Qty,
}

/// Hover query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandInfo {
    pub index: usize,
    pub price_range: (Price, Price),
    pub volume: Qty,
    pub timestamp: u64,
}

impl BandInfo {
    /// `HH:MM:SS  low - high  volume`, times in UTC.
    pub fn describe(&self) -> String {
        let time = chrono::DateTime::from_timestamp_millis(self.timestamp as i64)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_default();

        format!(
            "{time}  {} - {}  {}",
            self.price_range.0, self.price_range.1, self.volume
        )
    }
}

/// Owns all heatmap state. Every operation takes the surfaces it draws on
/// explicitly.
pub struct Engine {
    pub(super) config: Config,
    pub(super) viewport: Viewport,
    pub(super) ledger: Ledger,
    pub(super) log: UpdateLog,
    pub(super) bands: Vec<Band>,
    pub(super) overlay: Overlay,
    pub(super) scale: ColorScale,
    pub(super) scheme: ColorScheme,
    pub(super) phase: Phase,
    pub(super) queue: VecDeque<Event>,
    /// Auto-managed window saved while the user is zoomed in.
    pub(super) auto_window: Option<Window>,
    pub(super) domain_changes: Vec<DomainChange>,
    pub(super) last_refresh: Option<u64>,
}

impl Engine {
    pub fn new(config: Config, snapshot: &Snapshot, canvas: Size) -> Self {
        let viewport = Viewport::new(snapshot, &config, canvas);
        let scheme = config.color_scheme;

        let mut engine = Self {
            viewport,
            ledger: Ledger::new(),
            log: UpdateLog::new(config.out_of_order, config.log_capacity),
            bands: Vec::new(),
            overlay: Overlay::new(config.max_trade_marker_radius, config.min_trade_marker_radius),
            scale: ColorScale::new(scheme, Qty::ZERO),
            scheme,
            phase: Phase::Idle,
            queue: VecDeque::new(),
            auto_window: None,
            domain_changes: Vec::new(),
            last_refresh: None,
            config,
        };
        engine.seed(snapshot);
        engine
    }

    fn seed(&mut self, snapshot: &Snapshot) {
        for level in &snapshot.levels {
            self.ledger
                .apply_modification(level.price, level.volume, level.is_bid);
            self.log.record(
                level.price,
                self.ledger.volume(level.price),
                level.is_bid,
                snapshot.as_of,
            );
        }

        self.bands = band::initial_bands(&self.ledger, &self.viewport, snapshot.as_of);
        self.set_color_domain(band::max_volume(&self.bands), snapshot.as_of);

        let (bid, ask) = self.ledger.top_of_book();
        log::info!(
            "Heatmap seeded with {} levels at {}, top of book {:?}/{:?}",
            self.ledger.len(),
            snapshot.as_of,
            bid,
            ask
        );
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn update_log(&self) -> &UpdateLog {
        &self.log
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn color_domain_max(&self) -> Qty {
        self.viewport.color_domain_max
    }

    pub fn domain_changes(&self) -> &[DomainChange] {
        &self.domain_changes
    }

    pub fn top_of_book(&self) -> (Option<Price>, Option<Price>) {
        self.ledger.top_of_book()
    }

    pub(super) fn set_color_domain(&mut self, max: Qty, timestamp: u64) {
        if max == self.viewport.color_domain_max && !self.domain_changes.is_empty() {
            return;
        }
        self.viewport.color_domain_max = max;
        self.scale.set_domain_max(max);
        self.domain_changes.push(DomainChange { timestamp, max });
    }

    pub fn draw_overlay(&self, surface: &mut dyn VectorSurface) {
        self.overlay.draw(surface);
    }

    pub fn set_price_granularity(&mut self, granularity: usize, raster: &mut dyn Raster) {
        let granularity = granularity.max(1);
        if granularity == self.viewport.price_granularity {
            return;
        }
        log::info!("Price granularity {} -> {granularity}", self.viewport.price_granularity);

        self.viewport.price_granularity = granularity;
        self.rebuild(raster, true);
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme, raster: &mut dyn Raster) {
        self.scheme = scheme;
        self.scale.set_ramp(Box::new(LchRamp::from(scheme)));
        self.rebuild(raster, false);
    }

    /// Zooms into the price/time range under a pixel rectangle and stops
    /// auto-adjusting the window until [`Engine::reset_zoom`].
    pub fn zoom_to_rectangle(&mut self, rect: Rectangle, raster: &mut dyn Raster) {
        if !self.viewport.manual_zoom {
            self.auto_window = Some(self.viewport.window());
        }

        let window = self.viewport.window_at(rect);
        log::debug!(
            "Zoom to {}..{} x {}..{}",
            window.min_price,
            window.max_price,
            window.min_timestamp,
            window.max_timestamp
        );

        self.viewport.set_window(window);
        self.viewport.manual_zoom = true;
        self.rebuild(raster, true);
    }

    /// Goes back to the auto-managed window, extended to the latest event.
    pub fn reset_zoom(&mut self, raster: &mut dyn Raster) {
        if !self.viewport.manual_zoom {
            return;
        }

        if let Some(window) = self.auto_window.take() {
            self.viewport.set_window(window);
        }
        self.viewport.manual_zoom = false;

        if let Some(latest) = self.log.last_timestamp() {
            self.grow_time_window(latest);
        }
        self.rebuild(raster, true);
    }

    pub fn resize(&mut self, size: Size, raster: &mut dyn Raster) {
        self.viewport.canvas_width = size.width.max(1.0);
        self.viewport.canvas_height = size.height.max(1.0);
        self.rebuild(raster, false);
    }

    /// Starts over from a fresh snapshot, e.g. after switching instruments.
    /// Granularity, color scheme and canvas size carry over.
    pub fn reinitialize(&mut self, snapshot: &Snapshot, raster: &mut dyn Raster) {
        let mut config = self.config.clone();
        config.price_granularity = self.viewport.price_granularity;
        config.color_scheme = self.scheme;

        let canvas = Size::new(self.viewport.canvas_width, self.viewport.canvas_height);
        *self = Engine::new(config, snapshot, canvas);

        self.rebuild(raster, false);
    }

    pub fn band_at(&self, point: Point) -> Option<BandInfo> {
        if point.x < self.viewport.axis_inset {
            return None;
        }

        let price = Price::from_f64(geometry::price_at(&self.viewport, f64::from(point.y)));
        let index = geometry::visible_band(&self.viewport, price)?;
        let band = self.bands.get(index)?;

        let timestamp = geometry::timestamp_at(&self.viewport, f64::from(point.x)).max(0.0) as u64;

        Some(BandInfo {
            index,
            price_range: geometry::band_bounds(&self.viewport, index),
            volume: band.volume,
            timestamp,
        })
    }

    /// Index of the first band whose volume differs from a replay of the log.
    pub fn verify_against_rebuild(&self) -> Result<(), usize> {
        let replayed = self.replayed_bands();

        match self
            .bands
            .iter()
            .zip(&replayed)
            .position(|(live, replay)| live.volume != replay.volume)
        {
            Some(idx) => Err(idx),
            None if self.bands.len() != replayed.len() => Err(self.bands.len().min(replayed.len())),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("viewport", &self.viewport)
            .field("phase", &self.phase)
            .field("levels", &self.ledger.len())
            .field("log", &self.log.len())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
