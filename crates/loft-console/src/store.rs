use std::sync::Mutex;
use std::time::{Duration, Instant};

use loft_proto::telemetry::{FiducialReading, ProximityReading};
use loft_proto::{OperationMode, Waypoint};

const BANNER_TTL: Duration = Duration::from_secs(3);

/// Per-feature polling switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub fiducial: bool,
    pub proximity: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { fiducial: true, proximity: true }
    }
}

#[derive(Debug, Clone)]
struct ErrorBanner {
    message: String,
    raised_at: Instant,
}

/// Which waypoint entry field holds focus for correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WpField {
    X,
    Y,
    Z,
    Theta,
}

impl WpField {
    pub fn label(self) -> &'static str {
        match self {
            WpField::X => "x",
            WpField::Y => "y",
            WpField::Z => "z",
            WpField::Theta => "theta",
        }
    }
}

/// Waypoint text-entry state shared with the render surface.
#[derive(Debug, Clone, Default)]
pub struct WaypointEntry {
    pub x: String,
    pub y: String,
    pub z: String,
    pub theta: String,
    pub active: Option<WpField>,
}

/// One render-step copy of the store.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fiducial: Option<FiducialReading>,
    pub proximity: Option<ProximityReading>,
    pub waypoint: Waypoint,
    pub flags: FeatureFlags,
    pub mode: OperationMode,
    pub banner: Option<String>,
}

/// Console-side cache of last-known telemetry plus operator state.
///
/// Every field sits behind its own short-lived lock; writers touch one
/// field per call and readers copy values out. Cross-field updates are not
/// atomic, so the render step may observe a mix of old and new values
/// inside one update window. Staleness is bounded by the poll period.
#[derive(Debug)]
pub struct SharedState {
    fiducial: Mutex<Option<FiducialReading>>,
    proximity: Mutex<Option<ProximityReading>>,
    waypoint: Mutex<Waypoint>,
    flags: Mutex<FeatureFlags>,
    mode: Mutex<OperationMode>,
    entry: Mutex<WaypointEntry>,
    banner: Mutex<Option<ErrorBanner>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            fiducial: Mutex::new(None),
            proximity: Mutex::new(None),
            waypoint: Mutex::new(Waypoint::default()),
            flags: Mutex::new(FeatureFlags::default()),
            // The console comes up in manual control.
            mode: Mutex::new(OperationMode::Manual),
            entry: Mutex::new(WaypointEntry::default()),
            banner: Mutex::new(None),
        }
    }
}

impl SharedState {
    pub fn fiducial(&self) -> Option<FiducialReading> {
        *self.fiducial.lock().unwrap()
    }

    pub fn set_fiducial(&self, r: FiducialReading) {
        *self.fiducial.lock().unwrap() = Some(r);
    }

    pub fn proximity(&self) -> Option<ProximityReading> {
        *self.proximity.lock().unwrap()
    }

    pub fn set_proximity(&self, r: ProximityReading) {
        *self.proximity.lock().unwrap() = Some(r);
    }

    pub fn waypoint(&self) -> Waypoint {
        *self.waypoint.lock().unwrap()
    }

    pub fn set_waypoint(&self, wp: Waypoint) {
        *self.waypoint.lock().unwrap() = wp;
    }

    pub fn flags(&self) -> FeatureFlags {
        *self.flags.lock().unwrap()
    }

    pub(crate) fn init_flags(&self, fiducial: bool, proximity: bool) {
        *self.flags.lock().unwrap() = FeatureFlags { fiducial, proximity };
    }

    /// Flip the fiducial switch. Disabling clears the cached reading so the
    /// display never shows stale data under a dark switch.
    pub fn toggle_fiducial(&self) -> bool {
        let enabled = {
            let mut flags = self.flags.lock().unwrap();
            flags.fiducial = !flags.fiducial;
            flags.fiducial
        };
        if !enabled {
            *self.fiducial.lock().unwrap() = None;
        }
        enabled
    }

    /// Flip the proximity switch; same clearing rule as the fiducial one.
    pub fn toggle_proximity(&self) -> bool {
        let enabled = {
            let mut flags = self.flags.lock().unwrap();
            flags.proximity = !flags.proximity;
            flags.proximity
        };
        if !enabled {
            *self.proximity.lock().unwrap() = None;
        }
        enabled
    }

    pub fn mode(&self) -> OperationMode {
        *self.mode.lock().unwrap()
    }

    pub fn set_mode(&self, mode: OperationMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn entry(&self) -> WaypointEntry {
        self.entry.lock().unwrap().clone()
    }

    pub fn set_entry_field(&self, field: WpField, text: impl Into<String>) {
        let mut entry = self.entry.lock().unwrap();
        let slot = match field {
            WpField::X => &mut entry.x,
            WpField::Y => &mut entry.y,
            WpField::Z => &mut entry.z,
            WpField::Theta => &mut entry.theta,
        };
        *slot = text.into();
    }

    pub fn set_entry_active(&self, field: Option<WpField>) {
        self.entry.lock().unwrap().active = field;
    }

    pub fn raise_banner(&self, message: impl Into<String>) {
        *self.banner.lock().unwrap() = Some(ErrorBanner {
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    /// Banner text while its 3 s display window is open; expired banners
    /// are dropped on read.
    pub fn active_banner(&self) -> Option<String> {
        let mut slot = self.banner.lock().unwrap();
        match &*slot {
            Some(b) if b.raised_at.elapsed() < BANNER_TTL => Some(b.message.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fiducial: self.fiducial(),
            proximity: self.proximity(),
            waypoint: self.waypoint(),
            flags: self.flags(),
            mode: self.mode(),
            banner: self.active_banner(),
        }
    }
}
