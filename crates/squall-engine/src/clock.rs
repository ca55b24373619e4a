//! Simulation clock — the (height, minute) position advanced once per
//! simulated minute. The load controller drives `advance`; everyone else
//! only reads.

use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub height: u64,
    pub minute: u32,
}

#[derive(Clone, Default)]
pub struct SimClock {
    pos: Arc<RwLock<Position>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one minute forward. Minute wraps to 0 and height increments
    /// every `minutes_per_block` minutes. Returns the new position.
    pub fn advance(&self, minutes_per_block: u32) -> Position {
        let mut pos = self.pos.write().unwrap_or_else(|e| e.into_inner());
        pos.minute += 1;
        if pos.minute >= minutes_per_block {
            pos.height += 1;
            pos.minute = 0;
        }
        *pos
    }

    pub fn position(&self) -> Position {
        *self.pos.read().unwrap_or_else(|e| e.into_inner())
    }
}
