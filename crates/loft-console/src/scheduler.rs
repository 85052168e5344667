use loft_proto::OperationMode;

use crate::store::FeatureFlags;

pub const TICKS_PER_CYCLE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Waypoint,
    Fiducial,
    Proximity,
}

/// Tick-driven poll dispatcher. The counter cycles 1..=30, one step per
/// frame; each telemetry class owns one slot in the cycle (~333 ms apart
/// at 30 Hz). At most one class is serviced per tick, in strict priority
/// order; a lower-priority poll that coincides with a higher one waits
/// for its own slot.
#[derive(Debug, Default)]
pub struct PollScheduler {
    counter: u32,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance one frame and return the poll due this tick, if any.
    pub fn advance(&mut self, mode: OperationMode, flags: FeatureFlags) -> Option<PollKind> {
        self.counter = if self.counter >= TICKS_PER_CYCLE { 1 } else { self.counter + 1 };
        if mode == OperationMode::Auto && self.counter == 30 {
            // The waypoint only moves in auto mode.
            Some(PollKind::Waypoint)
        } else if flags.fiducial && self.counter == 20 {
            Some(PollKind::Fiducial)
        } else if flags.proximity && self.counter == 10 {
            Some(PollKind::Proximity)
        } else {
            None
        }
    }
}
