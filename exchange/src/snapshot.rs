use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::event::Event;
use crate::unit::{Price, Qty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Level {
    pub price: Price,
    pub volume: Qty,
    pub is_bid: bool,
}

/// Image of the book at `as_of`, together with the price window to open on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Snapshot {
    pub as_of: u64,
    pub min_price: Price,
    pub max_price: Price,
    pub levels: Vec<Level>,
}

/// A captured session: the opening snapshot followed by every event, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Recording {
    pub snapshot: Snapshot,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Recording {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let recording: Recording = serde_json::from_str(&raw)?;

        log::info!(
            "Loaded recording: {} levels, {} events",
            recording.snapshot.levels.len(),
            recording.events.len()
        );

        Ok(recording)
    }
}
