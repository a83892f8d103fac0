use enum_map::Enum;
use serde::{Deserialize, Serialize};

use crate::unit::{Price, Qty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Deserialize, Serialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn from_is_bid(is_bid: bool) -> Self {
        if is_bid { Side::Bid } else { Side::Ask }
    }

    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// A single change to the order book, stamped with unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Volume at `price` changed to `new_amount`, or a new level appeared.
    Modification {
        timestamp: u64,
        price: Price,
        new_amount: Qty,
        is_bid: bool,
    },
    /// Every order at `price` was pulled.
    Removal {
        timestamp: u64,
        price: Price,
        is_bid: bool,
    },
    /// A fill of `amount_traded` against resting liquidity at `price`.
    NewTrade {
        timestamp: u64,
        price: Price,
        amount_traded: Qty,
        was_bid_filled: bool,
    },
}

impl Event {
    pub fn timestamp(&self) -> u64 {
        match self {
            Event::Modification { timestamp, .. }
            | Event::Removal { timestamp, .. }
            | Event::NewTrade { timestamp, .. } => *timestamp,
        }
    }

    pub fn price(&self) -> Price {
        match self {
            Event::Modification { price, .. }
            | Event::Removal { price, .. }
            | Event::NewTrade { price, .. } => *price,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Event::Modification { is_bid, .. } | Event::Removal { is_bid, .. } => {
                Side::from_is_bid(*is_bid)
            }
            Event::NewTrade { was_bid_filled, .. } => Side::from_is_bid(*was_bid_filled),
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(self, Event::NewTrade { .. })
    }
}
