use std::io::{self, Write};
use std::path::Path;

use data::heatmap::{Raster, VectorSurface};
use iced_core::{Color, Point, Rectangle};

/// In-memory RGB canvas.
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl PixelBuffer {
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(1.0).round() as usize;
        let height = height.max(1.0).round() as usize;

        Self {
            width,
            height,
            pixels: vec![[0; 3]; width * height],
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = rgb;
        }
    }

    /// Binary PPM (P6).
    pub fn write_ppm(&self, path: &Path) -> io::Result<()> {
        let mut out = io::BufWriter::new(std::fs::File::create(path)?);

        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for rgb in &self.pixels {
            out.write_all(rgb)?;
        }
        out.flush()
    }
}

fn rgb(color: Color) -> [u8; 3] {
    let [r, g, b, _] = color.into_rgba8();
    [r, g, b]
}

impl Raster for PixelBuffer {
    fn clear(&mut self, color: Color) {
        self.pixels.fill(rgb(color));
    }

    fn fill_rect(&mut self, rect: Rectangle, color: Color) {
        let x0 = rect.x.floor().max(0.0) as usize;
        let y0 = rect.y.floor().max(0.0) as usize;
        let x1 = ((rect.x + rect.width).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((rect.y + rect.height).ceil().max(0.0) as usize).min(self.height);

        let rgb = rgb(color);
        for y in y0..y1 {
            let row = y * self.width;
            for px in &mut self.pixels[row + x0.min(x1)..row + x1] {
                *px = rgb;
            }
        }
    }
}

impl VectorSurface for PixelBuffer {
    fn polyline(&mut self, points: &[Point], color: Color) {
        let rgb = rgb(color);

        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;

            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let x = a.x + (b.x - a.x) * t;
                let y = a.y + (b.y - a.y) * t;
                self.put(x.round() as i64, y.round() as i64, rgb);
            }
        }
    }

    fn circle(&mut self, center: Point, radius: f32, color: Color) {
        let rgb = rgb(color);
        let r = radius.ceil() as i64;
        let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);

        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f32) <= radius * radius {
                    self.put(cx + dx, cy + dy, rgb);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_clipped_to_canvas() {
        let mut buf = PixelBuffer::new(10.0, 10.0);
        buf.clear(Color::BLACK);
        buf.fill_rect(
            Rectangle {
                x: 8.0,
                y: -3.0,
                width: 10.0,
                height: 5.0,
            },
            Color::WHITE,
        );

        assert_eq!(buf.pixel(9, 0), Some([255, 255, 255]));
        assert_eq!(buf.pixel(9, 1), Some([255, 255, 255]));
        assert_eq!(buf.pixel(9, 2), Some([0, 0, 0]));
        assert_eq!(buf.pixel(7, 0), Some([0, 0, 0]));
    }

    #[test]
    fn circle_and_line_stay_in_bounds() {
        let mut buf = PixelBuffer::new(5.0, 5.0);
        buf.circle(Point::new(0.0, 0.0), 3.0, Color::WHITE);
        buf.polyline(&[Point::new(-10.0, 2.0), Point::new(10.0, 2.0)], Color::WHITE);

        assert_eq!(buf.pixel(0, 0), Some([255, 255, 255]));
        assert_eq!(buf.pixel(4, 2), Some([255, 255, 255]));
        assert_eq!(buf.pixel(4, 4), Some([0, 0, 0]));
    }
}
