pub mod event;
pub mod snapshot;
pub mod unit;

pub use event::{Event, Side};
pub use snapshot::{Level, Recording, Snapshot};
pub use unit::{Price, Qty};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed recording: {0}")]
    Json(#[from] serde_json::Error),
}
