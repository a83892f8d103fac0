use iced_core::{Color, Point, Rectangle};

/// Solid-color 2D raster the bands are painted onto.
pub trait Raster {
    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rectangle, color: Color);
}

/// Vector layer for the trade overlay.
pub trait VectorSurface {
    fn polyline(&mut self, points: &[Point], color: Color);

    fn circle(&mut self, center: Point, radius: f32, color: Color);
}

/// Discards everything. Handy while replaying history nobody looks at.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Raster for NullSurface {
    fn clear(&mut self, _: Color) {}

    fn fill_rect(&mut self, _: Rectangle, _: Color) {}
}

impl VectorSurface for NullSurface {
    fn polyline(&mut self, _: &[Point], _: Color) {}

    fn circle(&mut self, _: Point, _: f32, _: Color) {}
}

#[cfg(test)]
pub(crate) use recording::{Command, RecordingRaster};
