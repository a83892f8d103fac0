use exchange::Qty;
use iced_core::Color;
use num_traits::Zero;
use palette::{IntoColor, Lch, Mix, Srgb};

use crate::config::theme::ColorScheme;

/// Maps a normalized intensity in `[0, 1]` to a color.
pub trait ColorRamp {
    fn at(&self, t: f32) -> Color;
}

/// Piecewise interpolation through evenly spaced stops in LCh space.
#[derive(Debug, Clone)]
pub struct LchRamp {
    stops: Vec<Lch>,
}

impl LchRamp {
    pub fn new(stops: &[Color]) -> Self {
        Self {
            stops: stops
                .iter()
                .map(|c| Srgb::new(c.r, c.g, c.b).into_color())
                .collect(),
        }
    }
}

impl From<ColorScheme> for LchRamp {
    fn from(scheme: ColorScheme) -> Self {
        LchRamp::new(&scheme.stops())
    }
}

impl ColorRamp for LchRamp {
    fn at(&self, t: f32) -> Color {
        let lch = match self.stops.as_slice() {
            [] => return Color::BLACK,
            [only] => *only,
            stops => {
                let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
                let i = (pos.floor() as usize).min(stops.len() - 2);
                stops[i].mix(stops[i + 1], pos - i as f32)
            }
        };

        let rgb: Srgb = lch.into_color();
        Color::from_rgb(
            rgb.red.clamp(0.0, 1.0),
            rgb.green.clamp(0.0, 1.0),
            rgb.blue.clamp(0.0, 1.0),
        )
    }
}

/// Band volume to color, normalized against `[0, domain_max]`.
pub struct ColorScale {
    ramp: Box<dyn ColorRamp>,
    domain_max: Qty,
}

impl ColorScale {
    pub fn new(scheme: ColorScheme, domain_max: Qty) -> Self {
        Self::with_ramp(Box::new(LchRamp::from(scheme)), domain_max)
    }

    pub fn with_ramp(ramp: Box<dyn ColorRamp>, domain_max: Qty) -> Self {
        Self {
            ramp,
            domain_max: domain_max.non_negative(),
        }
    }

    pub fn domain_max(&self) -> Qty {
        self.domain_max
    }

    pub fn set_domain_max(&mut self, domain_max: Qty) {
        self.domain_max = domain_max.non_negative();
    }

    pub fn set_ramp(&mut self, ramp: Box<dyn ColorRamp>) {
        self.ramp = ramp;
    }

    pub fn color(&self, volume: Qty) -> Color {
        self.ramp.at(self.intensity(volume))
    }

    fn intensity(&self, volume: Qty) -> f32 {
        if volume > self.domain_max {
            log::warn!(
                "Band volume {volume} above color domain {}, clamped",
                self.domain_max
            );
        }

        if self.domain_max.is_zero() {
            return if volume.units > 0 { 1.0 } else { 0.0 };
        }

        (volume.to_f64() / self.domain_max.to_f64()).clamp(0.0, 1.0) as f32
    }
}

impl std::fmt::Debug for ColorScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorScale")
            .field("domain_max", &self.domain_max)
            .finish_non_exhaustive()
    }
}
