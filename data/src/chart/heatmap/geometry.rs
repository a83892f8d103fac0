//! Pure mapping between `(timestamp, price)` and canvas pixels.
//!
//! Time runs left to right starting after the price-axis gutter
//! (`Viewport::axis_inset`), price runs bottom to top. Degenerate windows never
//! divide by zero: spans are clamped to [`MIN_TIME_SPAN_MS`] / [`MIN_PRICE_SPAN`].

use exchange::Price;
use exchange::unit::SCALE;
use iced_core::{Point, Rectangle};

use super::viewport::Viewport;

pub const MIN_TIME_SPAN_MS: f64 = 1.0;
pub const MIN_PRICE_SPAN: f64 = 1e-8;

#[inline]
fn time_span(v: &Viewport) -> f64 {
    (v.max_timestamp as f64 - v.min_timestamp as f64).max(MIN_TIME_SPAN_MS)
}

/// Price span in fixed-point units; differences are taken on integers so
/// band edges land exactly on pixel boundaries.
#[inline]
fn price_span_units(v: &Viewport) -> f64 {
    let span = (v.max_price.units - v.min_price.units) as f64;
    span.max(MIN_PRICE_SPAN * SCALE as f64)
}

pub fn pixel_x(v: &Viewport, timestamp: u64) -> f64 {
    let rel = timestamp as f64 - v.min_timestamp as f64;
    rel / time_span(v) * f64::from(v.canvas_width) + f64::from(v.axis_inset)
}

pub fn pixel_y(v: &Viewport, price: Price) -> f64 {
    let rel = (price.units - v.min_price.units) as f64;
    f64::from(v.canvas_height) - rel / price_span_units(v) * f64::from(v.canvas_height)
}

pub fn to_pixel(v: &Viewport, timestamp: u64, price: Price) -> Point {
    Point::new(pixel_x(v, timestamp) as f32, pixel_y(v, price) as f32)
}

/// Inverse of [`pixel_x`]; fractional milliseconds.
pub fn timestamp_at(v: &Viewport, x: f64) -> f64 {
    let width = f64::from(v.canvas_width).max(1.0);
    (x - f64::from(v.axis_inset)) / width * time_span(v) + v.min_timestamp as f64
}

/// Inverse of [`pixel_y`].
pub fn price_at(v: &Viewport, y: f64) -> f64 {
    let height = f64::from(v.canvas_height).max(1.0);
    ((1.0 - y / height) * price_span_units(v) + v.min_price.units as f64) / SCALE as f64
}

/// Milliseconds covered by one horizontal pixel.
pub fn pixel_duration(v: &Viewport) -> f64 {
    time_span(v) / f64::from(v.canvas_width).max(1.0)
}

/// Index of the band `price` falls in. Values outside `[0, price_granularity)`
/// mean the price is outside the visible window.
///
/// Computed on fixed-point units, so the same price always lands in the same
/// band regardless of how it was reached.
pub fn band_index(v: &Viewport, price: Price) -> i64 {
    let granularity = v.price_granularity.max(1) as i128;

    if price == v.max_price {
        return (granularity - 1) as i64;
    }

    let span = (i128::from(v.max_price.units) - i128::from(v.min_price.units)).max(1);
    let offset = i128::from(price.units) - i128::from(v.min_price.units);

    (offset * granularity)
        .div_euclid(span)
        .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Checked variant of [`band_index`] for callers that only care about visible bands.
pub fn visible_band(v: &Viewport, price: Price) -> Option<usize> {
    let idx = band_index(v, price);
    (idx >= 0 && (idx as usize) < v.price_granularity.max(1)).then_some(idx as usize)
}

/// Lower (inclusive) and upper (exclusive) price bound of band `index`: the
/// smallest prices [`band_index`] puts in this band and in the next one.
pub fn band_bounds(v: &Viewport, index: usize) -> (Price, Price) {
    let granularity = v.price_granularity.max(1) as i128;
    let min = i128::from(v.min_price.units);
    let span = i128::from(v.max_price.units) - min;

    // ceiling division
    let at = |i: i128| Price::from_units((min - (-span * i).div_euclid(granularity)) as i64);

    (at(index as i128), at(index as i128 + 1))
}

/// Pixel rectangle covering band `index` between two timestamps.
///
/// Left edge is floored and height follows the exact price edges so adjacent
/// bands tile without gaps.
pub fn band_rect(v: &Viewport, index: usize, start: u64, end: u64) -> Rectangle {
    let (low, high) = band_bounds(v, index);

    let left = pixel_x(v, start);
    let right = pixel_x(v, end);
    let top = pixel_y(v, high);
    let bottom = pixel_y(v, low);

    let x = left.floor();
    let y = top.ceil();

    Rectangle {
        x: x as f32,
        y: y as f32,
        width: (right - left).ceil().max(0.0) as f32,
        height: (bottom - top).max(0.0) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::Qty;
    use proptest::prelude::*;

    fn viewport(min: &str, max: &str, granularity: usize) -> Viewport {
        Viewport {
            min_price: min.parse().unwrap(),
            max_price: max.parse().unwrap(),
            min_timestamp: 1_000,
            max_timestamp: 21_000,
            price_granularity: granularity,
            time_granularity: 1_000,
            canvas_width: 900.0,
            canvas_height: 600.0,
            axis_inset: 60.0,
            color_domain_max: Qty::ZERO,
            manual_zoom: false,
        }
    }

    #[test]
    fn corners_map_to_canvas_edges() {
        let v = viewport("1.00", "2.30", 2);

        let bottom_left = to_pixel(&v, 1_000, v.min_price);
        assert_eq!(bottom_left, Point::new(60.0, 600.0));

        let top_right = to_pixel(&v, 21_000, v.max_price);
        assert_eq!(top_right, Point::new(960.0, 0.0));
    }

    #[test]
    fn band_index_edges() {
        let v = viewport("1.00", "2.30", 2);
        assert_eq!(band_index(&v, "1.00".parse().unwrap()), 0);
        assert_eq!(band_index(&v, "1.64".parse().unwrap()), 0);
        assert_eq!(band_index(&v, "1.65".parse().unwrap()), 1);
        assert_eq!(band_index(&v, "2.30".parse().unwrap()), 1);
        assert_eq!(band_index(&v, "0.99".parse().unwrap()), -1);
        assert_eq!(band_index(&v, "2.31".parse().unwrap()), 2);
        assert_eq!(visible_band(&v, "2.31".parse().unwrap()), None);
    }

    #[test]
    fn degenerate_window_stays_finite() {
        let mut v = viewport("1.00", "1.00", 4);
        v.max_timestamp = v.min_timestamp;

        let p = to_pixel(&v, 5_000, "1.50".parse().unwrap());
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!(timestamp_at(&v, 500.0).is_finite());
        assert!(price_at(&v, 10.0).is_finite());
        assert_eq!(band_index(&v, v.max_price), 3);
    }

    #[test]
    fn band_bounds_tile_the_window() {
        let v = viewport("1.00", "2.30", 3);
        let mut prev_high = v.min_price;
        for i in 0..3 {
            let (low, high) = band_bounds(&v, i);
            assert_eq!(low, prev_high);
            assert!(high > low);
            prev_high = high;
        }
        assert_eq!(prev_high, v.max_price);
    }

    #[test]
    fn band_bounds_agree_with_band_index() {
        let mut v = viewport("1", "2", 3);
        v.min_price = Price::from_units(0);
        v.max_price = Price::from_units(10);

        let (low, high) = band_bounds(&v, 1);
        assert_eq!((low.units, high.units), (4, 7));
        assert_eq!(band_index(&v, low), 1);
        assert_eq!(band_index(&v, Price::from_units(3)), 0);
        assert_eq!(band_index(&v, Price::from_units(6)), 1);
        assert_eq!(band_index(&v, high), 2);
    }

    #[test]
    fn band_rect_spans_time_and_price() {
        let v = viewport("1.00", "2.30", 2);
        let rect = band_rect(&v, 0, 1_000, 11_000);
        assert_eq!(rect.x, 60.0);
        assert_eq!(rect.width, 450.0);
        assert!((rect.y - 300.0).abs() < 1e-3);
        assert!((rect.height - 300.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn band_index_boundaries_hold(granularity in 1usize..600, lo in 1i64..1_000_000, width in 1i64..1_000_000) {
            let mut v = viewport("1", "2", granularity);
            v.min_price = Price::from_units(lo);
            v.max_price = Price::from_units(lo + width);

            prop_assert_eq!(band_index(&v, v.min_price), 0);
            prop_assert_eq!(band_index(&v, v.max_price), granularity as i64 - 1);
        }

        #[test]
        fn band_bounds_hold_their_band(granularity in 1usize..200, lo in 0i64..1_000_000, width in 1i64..10_000) {
            let mut v = viewport("1", "2", granularity);
            v.min_price = Price::from_units(lo);
            v.max_price = Price::from_units(lo + width);

            for i in 0..granularity {
                let (low, high) = band_bounds(&v, i);
                if low < high {
                    prop_assert_eq!(band_index(&v, low), i as i64);
                    prop_assert_eq!(band_index(&v, Price::from_units(high.units - 1)), i as i64);
                }
            }
        }

        #[test]
        fn pixel_round_trip(t in 1_000u64..=21_000, units in 100_000_000i64..=230_000_000) {
            let v = viewport("1.00", "2.30", 10);
            let price = Price::from_units(units);

            let back_t = timestamp_at(&v, pixel_x(&v, t));
            let back_p = price_at(&v, pixel_y(&v, price));

            prop_assert!((back_t - t as f64).abs() <= 1e-6 * t as f64);
            prop_assert!((back_p - price.to_f64()).abs() <= 1e-6 * price.to_f64());
        }
    }
}
