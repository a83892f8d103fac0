pub mod band;
pub mod color;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod ledger;
pub mod overlay;
pub mod render;
pub mod surface;
pub mod update_log;
pub mod viewport;

use serde::{Deserialize, Serialize};

use crate::config::theme::ColorScheme;

pub use band::Band;
pub use engine::{BandInfo, DomainChange, Engine, Invalidation, Outcome, Phase};
pub use ledger::{Ledger, PriceLevel};
pub use overlay::{Overlay, TradeMarker};
pub use surface::{NullSurface, Raster, VectorSurface};
pub use update_log::{OutOfOrderPolicy, UpdateLog, UpdateLogEntry};
pub use viewport::Viewport;

pub const DEFAULT_PRICE_GRANULARITY: usize = 100;
pub const DEFAULT_TIME_SCALE_MS: u64 = 20_000;
pub const DEFAULT_TIME_GRANULARITY_MS: u64 = 1_000;

pub const AXIS_INSET: f32 = 60.0;

pub const MAX_TRADE_MARKER_RADIUS: f32 = 10.0;
pub const MIN_TRADE_MARKER_RADIUS: f32 = 0.5;

/// Price granularities offered to the user.
pub const GRANULARITY_PRESETS: [usize; 11] = [15, 20, 30, 50, 75, 100, 135, 175, 300, 350, 500];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub price_granularity: usize,
    /// Width of the initial time window.
    pub time_scale: u64,
    /// Minimum interval between two frame refreshes.
    pub time_granularity: u64,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Left gutter reserved for the price axis.
    pub axis_inset: f32,
    pub max_trade_marker_radius: f32,
    pub min_trade_marker_radius: f32,
    /// How close to a price edge (as a fraction of it) a trade has to land to widen the window.
    pub auto_zoom_edge: f64,
    /// Multiplicative step applied to the edge that is widened.
    pub auto_zoom_expansion: f64,
    /// Fraction of the time window after which it is grown.
    pub time_window_trigger: f64,
    pub time_window_growth: f64,
    pub color_scheme: ColorScheme,
    pub out_of_order: OutOfOrderPolicy,
    /// Entries kept verbatim in the update log; older ones are compacted.
    pub log_capacity: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            price_granularity: DEFAULT_PRICE_GRANULARITY,
            time_scale: DEFAULT_TIME_SCALE_MS,
            time_granularity: DEFAULT_TIME_GRANULARITY_MS,
            canvas_width: 900.0,
            canvas_height: 600.0,
            axis_inset: AXIS_INSET,
            max_trade_marker_radius: MAX_TRADE_MARKER_RADIUS,
            min_trade_marker_radius: MIN_TRADE_MARKER_RADIUS,
            auto_zoom_edge: 0.005,
            auto_zoom_expansion: 0.003,
            time_window_trigger: 0.95,
            time_window_growth: 0.2,
            color_scheme: ColorScheme::default(),
            out_of_order: OutOfOrderPolicy::default(),
            log_capacity: None,
        }
    }
}

impl Config {
    pub fn canvas_size(&self) -> iced_core::Size {
        iced_core::Size::new(self.canvas_width, self.canvas_height)
    }
}
