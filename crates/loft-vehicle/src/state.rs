use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::info;

use loft_proto::command::{self, Command};
use loft_proto::telemetry::{encode_fiducial, encode_proximity, FiducialFix, ProximityReading};
use loft_proto::{OperationMode, ProtoError, ProximityStatus, Waypoint};

// Surveyed fiducial positions: tag id -> (x, y).
static TAG_SURVEY: Lazy<HashMap<u32, (i32, i32)>> = Lazy::new(|| {
    HashMap::from([
        (1, (0, 0)),
        (3, (1, 0)),
        (4, (2, 0)),
        (7, (0, 1)),
        (13, (-1, -1)),
    ])
});

/// Latest fiducial observation, written by the camera feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiducialObservation {
    pub visible: bool,
    pub tag_id: Option<u32>,
    pub dist: f32,
    pub angle: f32,
}

/// Authoritative vehicle record. Lives for the controller process; mutated
/// only inside command handlers and the sensor-feed entry points.
#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    mode: OperationMode,
    waypoint: Waypoint,
    fiducial: FiducialObservation,
    proximity: ProximityReading,
}

/// Outcome of one command: reply text, and whether the accept loop should
/// exit after sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub shutdown: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), shutdown: false }
    }
}

impl VehicleState {
    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn waypoint(&self) -> Waypoint {
        self.waypoint
    }

    /// Camera feed entry point.
    pub fn observe_fiducial(&mut self, visible: bool, tag_id: Option<u32>, dist: f32, angle: f32) {
        self.fiducial = FiducialObservation { visible, tag_id, dist, angle };
    }

    /// Ranging feed entry point, left/center/right.
    pub fn observe_proximity(&mut self, distance: [f32; 3], status: [ProximityStatus; 3]) {
        self.proximity = ProximityReading { distance, status };
    }

    /// Bench readings for driving a console without the sensor stack.
    pub fn load_fixture(&mut self) {
        self.observe_fiducial(true, Some(3), 1.2, 32.0);
        self.observe_proximity(
            [5.8, 1.5, 0.1],
            [ProximityStatus::Ok, ProximityStatus::Danger, ProximityStatus::CollisionImminent],
        );
    }

    fn located_fix(&self) -> Option<FiducialFix> {
        let tag_id = self.fiducial.tag_id?;
        let (x, y) = TAG_SURVEY.get(&tag_id).copied()?;
        Some(FiducialFix { tag_id, x, y, dist: self.fiducial.dist, angle: self.fiducial.angle })
    }

    /// The protocol state machine. Always produces a reply: malformed
    /// payloads answer `error: ...`, unknown verbs answer `Not recognized`,
    /// and neither touches the state.
    pub fn handle(&mut self, line: &str) -> Reply {
        let cmd = match Command::parse(line) {
            Ok(cmd) => cmd,
            Err(ProtoError::Unrecognized) => return Reply::text(command::NOT_RECOGNIZED),
            Err(err) => return Reply::text(command::error_reply(&err)),
        };
        match cmd {
            Command::Quit => Reply { text: command::QUITTING.into(), shutdown: true },
            Command::Move(_dir) => {
                // Actuation belongs to the motor subsystem; the protocol
                // only acknowledges receipt.
                Reply::text(command::ACK)
            }
            Command::CurrWp => Reply::text(self.waypoint.to_csv()),
            Command::SetMode(mode) => {
                info!("vehicle: mode set to {:?}", mode);
                self.mode = mode;
                Reply::text(command::ACK)
            }
            Command::SetWp(wp) => {
                info!("vehicle: waypoint set to {}", wp);
                self.waypoint = wp;
                Reply::text(command::ACK)
            }
            Command::At => {
                Reply::text(encode_fiducial(self.fiducial.visible, self.located_fix().as_ref()))
            }
            Command::Tof => Reply::text(encode_proximity(&self.proximity)),
        }
    }
}
