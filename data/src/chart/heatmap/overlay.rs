use enum_map::EnumMap;
use exchange::{Price, Qty, Side};
use iced_core::{Color, Point};

use super::geometry;
use super::surface::VectorSurface;
use super::viewport::Viewport;

pub const BID_FILL_COLOR: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};
pub const ASK_FILL_COLOR: Color = Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

pub fn side_color(side: Side) -> Color {
    match side {
        Side::Bid => BID_FILL_COLOR,
        Side::Ask => ASK_FILL_COLOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineVertex {
    pub timestamp: u64,
    pub price: Price,
}

/// Step line through the prices a side was filled at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLine {
    pub vertices: Vec<LineVertex>,
    /// Last vertex is a synthetic extension, not a fill.
    extended: bool,
}

impl TradeLine {
    pub fn is_extended(&self) -> bool {
        self.extended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeMarker {
    pub timestamp: u64,
    pub price: Price,
    pub volume: Qty,
    pub is_bid: bool,
}

impl TradeMarker {
    pub fn side(&self) -> Side {
        Side::from_is_bid(self.is_bid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerCircle {
    pub marker: usize,
    pub center: Point,
    pub radius: f32,
}

/// Pixel geometry derived from the overlay's data for one viewport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub lines: EnumMap<Side, Vec<Point>>,
    pub circles: Vec<MarkerCircle>,
}

#[derive(Debug, Clone)]
pub struct Overlay {
    lines: EnumMap<Side, TradeLine>,
    markers: Vec<TradeMarker>,
    max_trade_volume: Qty,
    max_radius: f32,
    min_radius: f32,
    frame: OverlayFrame,
}

impl Overlay {
    pub fn new(max_radius: f32, min_radius: f32) -> Self {
        Self {
            lines: EnumMap::default(),
            markers: Vec::new(),
            max_trade_volume: Qty::ZERO,
            max_radius,
            min_radius,
            frame: OverlayFrame::default(),
        }
    }

    pub fn markers(&self) -> &[TradeMarker] {
        &self.markers
    }

    pub fn line(&self, side: Side) -> &TradeLine {
        &self.lines[side]
    }

    pub fn frame(&self) -> &OverlayFrame {
        &self.frame
    }

    pub fn max_trade_volume(&self) -> Qty {
        self.max_trade_volume
    }

    fn radius(&self, volume: Qty) -> f32 {
        if self.max_trade_volume.units <= 0 {
            return 0.0;
        }
        let ratio = (volume.to_f64() / self.max_trade_volume.to_f64()).min(1.0);
        ratio as f32 * self.max_radius
    }

    /// Records a fill and its marker. A new largest trade rescales every marker.
    pub fn add_trade(
        &mut self,
        viewport: &Viewport,
        price: Price,
        volume: Qty,
        timestamp: u64,
        is_bid: bool,
    ) {
        let side = Side::from_is_bid(is_bid);
        let volume = volume.non_negative();

        let rescale = volume > self.max_trade_volume;
        if rescale {
            self.max_trade_volume = volume;
        }

        let line = &mut self.lines[side];
        let points = &mut self.frame.lines[side];

        // corner first so the line stays orthogonal
        if let Some(last) = line.vertices.last().copied() {
            line.vertices.push(LineVertex {
                timestamp,
                price: last.price,
            });
            points.push(geometry::to_pixel(viewport, timestamp, last.price));
        }
        line.vertices.push(LineVertex { timestamp, price });
        points.push(geometry::to_pixel(viewport, timestamp, price));
        line.extended = false;

        self.markers.push(TradeMarker {
            timestamp,
            price,
            volume,
            is_bid,
        });

        if rescale {
            self.rederive_circles(viewport);
        } else {
            let marker = self.markers.len() - 1;
            let radius = self.radius(volume);
            if radius >= self.min_radius && is_visible(viewport, &self.markers[marker]) {
                self.frame.circles.push(MarkerCircle {
                    marker,
                    center: geometry::to_pixel(viewport, timestamp, price),
                    radius,
                });
            }
        }
    }

    /// Carries both lines forward to `timestamp` at their last price, reusing
    /// the trailing extension point if there is one.
    pub fn extend_lines(&mut self, viewport: &Viewport, timestamp: u64) {
        for (side, line) in self.lines.iter_mut() {
            let Some(last) = line.vertices.last_mut() else {
                continue;
            };
            let points = &mut self.frame.lines[side];
            let point = geometry::to_pixel(viewport, timestamp, last.price);

            if line.extended {
                last.timestamp = timestamp;
                if let Some(p) = points.last_mut() {
                    *p = point;
                }
            } else {
                let vertex = LineVertex {
                    timestamp,
                    price: last.price,
                };
                line.vertices.push(vertex);
                points.push(point);
                line.extended = true;
            }
        }
    }

    /// Re-derives every pixel position for `viewport`. The running max trade
    /// volume restarts from the markers that are still visible, and only those
    /// get a circle.
    pub fn reposition(&mut self, viewport: &Viewport) {
        self.max_trade_volume = self
            .markers
            .iter()
            .filter(|m| is_visible(viewport, m))
            .map(|m| m.volume)
            .max()
            .unwrap_or(Qty::ZERO);

        for (side, line) in self.lines.iter() {
            self.frame.lines[side] = line
                .vertices
                .iter()
                .map(|v| geometry::to_pixel(viewport, v.timestamp, v.price))
                .collect();
        }

        self.rederive_circles(viewport);
    }

    fn rederive_circles(&mut self, viewport: &Viewport) {
        let circles: Vec<MarkerCircle> = self
            .markers
            .iter()
            .enumerate()
            .filter(|(_, m)| is_visible(viewport, m))
            .filter_map(|(marker, m)| {
                let radius = self.radius(m.volume);
                (radius >= self.min_radius).then(|| MarkerCircle {
                    marker,
                    center: geometry::to_pixel(viewport, m.timestamp, m.price),
                    radius,
                })
            })
            .collect();

        self.frame.circles = circles;
    }

    pub fn draw(&self, surface: &mut dyn VectorSurface) {
        for (side, points) in self.frame.lines.iter() {
            if points.len() >= 2 {
                surface.polyline(points, side_color(side));
            }
        }

        for circle in &self.frame.circles {
            if let Some(marker) = self.markers.get(circle.marker) {
                surface.circle(circle.center, circle.radius, side_color(marker.side()));
            }
        }
    }

    /// Topmost marker whose circle contains `point`.
    pub fn marker_at(&self, point: Point) -> Option<&TradeMarker> {
        self.frame
            .circles
            .iter()
            .rev()
            .find(|c| c.center.distance(point) <= c.radius)
            .and_then(|c| self.markers.get(c.marker))
    }
}

fn is_visible(viewport: &Viewport, marker: &TradeMarker) -> bool {
    (viewport.min_timestamp..=viewport.max_timestamp).contains(&marker.timestamp)
        && (viewport.min_price..=viewport.max_price).contains(&marker.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::heatmap::surface::RecordingRaster;

    fn viewport() -> Viewport {
        Viewport {
            min_price: "1.00".parse().unwrap(),
            max_price: "2.00".parse().unwrap(),
            min_timestamp: 0,
            max_timestamp: 10_000,
            price_granularity: 10,
            time_granularity: 1_000,
            canvas_width: 1_000.0,
            canvas_height: 100.0,
            axis_inset: 0.0,
            color_domain_max: Qty::ZERO,
            manual_zoom: false,
        }
    }

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn q(s: &str) -> Qty {
        s.parse().unwrap()
    }

    #[test]
    fn lines_stay_orthogonal() {
        let v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);

        overlay.add_trade(&v, p("1.20"), q("1"), 1_000, true);
        overlay.add_trade(&v, p("1.50"), q("1"), 2_000, true);

        let vertices = &overlay.line(Side::Bid).vertices;
        assert_eq!(
            vertices,
            &vec![
                LineVertex {
                    timestamp: 1_000,
                    price: p("1.20")
                },
                LineVertex {
                    timestamp: 2_000,
                    price: p("1.20")
                },
                LineVertex {
                    timestamp: 2_000,
                    price: p("1.50")
                },
            ]
        );
        assert!(overlay.line(Side::Ask).vertices.is_empty());
        assert_eq!(overlay.frame().lines[Side::Bid].len(), 3);
    }

    #[test]
    fn extension_point_is_reused() {
        let v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);

        overlay.extend_lines(&v, 500);
        assert!(overlay.line(Side::Bid).vertices.is_empty());

        overlay.add_trade(&v, p("1.20"), q("1"), 1_000, true);
        overlay.extend_lines(&v, 1_500);
        overlay.extend_lines(&v, 3_000);

        let line = overlay.line(Side::Bid);
        assert_eq!(line.vertices.len(), 2);
        assert!(line.is_extended());
        assert_eq!(line.vertices[1].timestamp, 3_000);
        assert_eq!(overlay.frame().lines[Side::Bid][1].x, 300.0);

        overlay.add_trade(&v, p("1.30"), q("1"), 4_000, true);
        assert!(!overlay.line(Side::Bid).is_extended());
        assert_eq!(overlay.line(Side::Bid).vertices.len(), 4);
    }

    #[test]
    fn new_record_rescales_every_marker() {
        let v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);

        overlay.add_trade(&v, p("1.20"), q("2"), 1_000, true);
        assert_eq!(overlay.frame().circles[0].radius, 10.0);

        overlay.add_trade(&v, p("1.40"), q("4"), 2_000, false);
        let radii: Vec<f32> = overlay.frame().circles.iter().map(|c| c.radius).collect();
        assert_eq!(radii, vec![5.0, 10.0]);
        assert_eq!(overlay.max_trade_volume(), q("4"));
    }

    #[test]
    fn tiny_markers_are_not_drawn() {
        let v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);

        overlay.add_trade(&v, p("1.20"), q("100"), 1_000, true);
        overlay.add_trade(&v, p("1.20"), q("1"), 2_000, true);

        assert_eq!(overlay.markers().len(), 2);
        assert_eq!(overlay.frame().circles.len(), 1);
    }

    #[test]
    fn reposition_follows_the_window() {
        let mut v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);
        overlay.add_trade(&v, p("1.50"), q("8"), 5_000, true);
        overlay.add_trade(&v, p("1.50"), q("2"), 9_000, false);

        v.min_timestamp = 6_000;
        overlay.reposition(&v);

        // only the smaller trade is left on screen, so it becomes the reference
        assert_eq!(overlay.max_trade_volume(), q("2"));
        let circle = overlay.frame().circles.last().unwrap();
        assert_eq!(circle.radius, 10.0);
        assert!((circle.center.x - 750.0).abs() < 1e-3);
    }

    #[test]
    fn off_screen_markers_get_no_circle() {
        let mut v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);
        overlay.add_trade(&v, p("1.50"), q("1000"), 1_000, true);
        overlay.add_trade(&v, p("1.50"), q("1"), 9_000, true);

        v.min_timestamp = 6_000;
        overlay.reposition(&v);

        let circles = &overlay.frame().circles;
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].marker, 1);
        assert!(circles.iter().all(|c| c.radius <= 10.0));
        assert!(overlay.marker_at(Point::new(100.0, 50.0)).is_none());

        overlay.add_trade(&v, p("1.50"), q("0.5"), 2_000, true);
        assert_eq!(overlay.markers().len(), 3);
        assert_eq!(overlay.frame().circles.len(), 1);
    }

    #[test]
    fn hit_testing_and_drawing() {
        let v = viewport();
        let mut overlay = Overlay::new(10.0, 0.5);
        overlay.add_trade(&v, p("1.50"), q("1"), 5_000, false);
        overlay.add_trade(&v, p("1.60"), q("1"), 6_000, false);

        let hit = overlay.marker_at(Point::new(502.0, 50.0)).unwrap();
        assert_eq!(hit.timestamp, 5_000);
        assert!(overlay.marker_at(Point::new(100.0, 90.0)).is_none());

        let mut surface = RecordingRaster::default();
        overlay.draw(&mut surface);
        assert_eq!(surface.circles().len(), 2);
        assert_eq!(surface.commands.len(), 3);
    }
}
