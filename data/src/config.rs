use std::path::Path;
use std::{fs, io};

use crate::chart::heatmap;

pub mod theme;

/// Reads engine settings from a JSON file. Absent fields keep their defaults.
pub fn load(path: impl AsRef<Path>) -> Result<heatmap::Config, Error> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let config: heatmap::Config = serde_json::from_str(&raw)?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
