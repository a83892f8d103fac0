use exchange::{Price, Qty, Snapshot};
use iced_core::{Rectangle, Size};

use super::Config;
use super::geometry::{self, MIN_TIME_SPAN_MS};

/// Everything the geometry mapper needs to place a `(timestamp, price)` on the canvas,
/// plus the color domain the bands are currently normalized against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_price: Price,
    pub max_price: Price,
    pub min_timestamp: u64,
    pub max_timestamp: u64,
    pub price_granularity: usize,
    pub time_granularity: u64,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub axis_inset: f32,
    pub color_domain_max: Qty,
    pub manual_zoom: bool,
}

/// The price/time part of a viewport, saved while the user is zoomed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub min_price: Price,
    pub max_price: Price,
    pub min_timestamp: u64,
    pub max_timestamp: u64,
}

impl Viewport {
    pub fn new(snapshot: &Snapshot, config: &Config, canvas: Size) -> Self {
        let (min_price, max_price) = ordered(snapshot.min_price, snapshot.max_price);

        Self {
            min_price,
            max_price,
            min_timestamp: snapshot.as_of,
            max_timestamp: snapshot.as_of + config.time_scale.max(1),
            price_granularity: config.price_granularity.max(1),
            time_granularity: config.time_granularity,
            canvas_width: canvas.width.max(1.0),
            canvas_height: canvas.height.max(1.0),
            axis_inset: config.axis_inset,
            color_domain_max: Qty::ZERO,
            manual_zoom: false,
        }
    }

    pub fn time_range(&self) -> u64 {
        self.max_timestamp.saturating_sub(self.min_timestamp)
    }

    pub fn window(&self) -> Window {
        Window {
            min_price: self.min_price,
            max_price: self.max_price,
            min_timestamp: self.min_timestamp,
            max_timestamp: self.max_timestamp,
        }
    }

    pub fn set_window(&mut self, window: Window) {
        self.min_price = window.min_price;
        self.max_price = window.max_price;
        self.min_timestamp = window.min_timestamp;
        self.max_timestamp = window.max_timestamp;
    }

    /// Price/time window covered by a pixel rectangle on the current canvas.
    ///
    /// Degenerate selections are widened to one fixed-point unit of price and
    /// [`MIN_TIME_SPAN_MS`] of time.
    pub fn window_at(&self, rect: Rectangle) -> Window {
        let left = geometry::timestamp_at(self, f64::from(rect.x));
        let right = geometry::timestamp_at(self, f64::from(rect.x + rect.width));

        let top = geometry::price_at(self, f64::from(rect.y));
        let bottom = geometry::price_at(self, f64::from(rect.y + rect.height));

        let (min_t, max_t) = (left.min(right).max(0.0), left.max(right).max(0.0));
        let min_timestamp = min_t.round() as u64;
        let max_timestamp = (max_t.round() as u64).max(min_timestamp + MIN_TIME_SPAN_MS as u64);

        let (min_price, max_price) = ordered(Price::from_f64(bottom), Price::from_f64(top));

        Window {
            min_price,
            max_price,
            min_timestamp,
            max_timestamp,
        }
    }
}

fn ordered(a: Price, b: Price) -> (Price, Price) {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high == low {
        (low, Price::from_units(low.units.saturating_add(1)))
    } else {
        (low, high)
    }
}
