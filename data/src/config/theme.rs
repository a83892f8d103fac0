use iced_core::Color;
use palette::Srgb;
use serde::{Deserialize, Serialize};

/// Named band palettes. The first stop doubles as the canvas background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ColorScheme {
    #[default]
    BlueMoon,
    CandyFloss,
    DeepSea,
    Pumpkin,
    Chalkboard,
    Heat,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 6] = [
        ColorScheme::BlueMoon,
        ColorScheme::CandyFloss,
        ColorScheme::DeepSea,
        ColorScheme::Pumpkin,
        ColorScheme::Chalkboard,
        ColorScheme::Heat,
    ];

    pub fn hex_stops(self) -> &'static [&'static str] {
        match self {
            ColorScheme::BlueMoon => &["#141414", "#7cbeff"],
            ColorScheme::CandyFloss => &["#141414", "#f53dff"],
            ColorScheme::DeepSea => &["#141414", "#389dff"],
            ColorScheme::Pumpkin => &["#141414", "#ff9232"],
            ColorScheme::Chalkboard => &["#030303", "#ffffff"],
            ColorScheme::Heat => &["#fff7ec", "#fc8d59", "#7f0000"],
        }
    }

    pub fn stops(self) -> Vec<Color> {
        self.hex_stops().iter().map(|hex| hex_to_color(hex)).collect()
    }

    pub fn background(self) -> Color {
        self.hex_stops()
            .first()
            .map_or(Color::BLACK, |hex| hex_to_color(hex))
    }
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorScheme::BlueMoon => write!(f, "Blue Moon"),
            ColorScheme::CandyFloss => write!(f, "Candy Floss"),
            ColorScheme::DeepSea => write!(f, "Deep Sea"),
            ColorScheme::Pumpkin => write!(f, "Pumpkin"),
            ColorScheme::Chalkboard => write!(f, "Chalkboard"),
            ColorScheme::Heat => write!(f, "Heat"),
        }
    }
}

pub fn hex_to_color(hex: &str) -> Color {
    match hex.parse::<Srgb<u8>>() {
        Ok(rgb) => Color::from_rgb8(rgb.red, rgb.green, rgb.blue),
        Err(e) => {
            log::warn!("Invalid hex color {hex}: {e}");
            Color::BLACK
        }
    }
}
