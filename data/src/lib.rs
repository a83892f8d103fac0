pub mod chart;
pub mod config;
pub mod log;

use std::path::PathBuf;

pub use chart::heatmap::{self, Engine};
pub use config::theme::ColorScheme;

const APP_DIR: &str = "bandscope";

/// Location under the platform data directory, overridable with `BANDSCOPE_DATA_PATH`.
pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let base = match std::env::var_os("BANDSCOPE_DATA_PATH") {
        Some(custom) => PathBuf::from(custom),
        None => dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR),
    };

    match path_name {
        Some(name) => base.join(name),
        None => base,
    }
}
