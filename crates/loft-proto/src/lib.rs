pub mod command;
pub mod telemetry;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    #[error("bad integer field `{0}`")]
    BadInt(String),
    #[error("bad float field `{0}`")]
    BadFloat(String),
    #[error("bad bool field `{0}`")]
    BadBool(String),
    #[error("direction not recognized: `{0}`")]
    UnknownDirection(String),
    #[error("unknown mode code {0}")]
    UnknownMode(i64),
    #[error("unknown proximity status code {0}")]
    UnknownStatus(i64),
    #[error("unrecognized command")]
    Unrecognized,
}

/// Target pose for autonomous navigation. No range constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waypoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub theta: i32,
}

impl Default for Waypoint {
    fn default() -> Self {
        Self { x: 0, y: 0, z: 1, theta: 0 }
    }
}

impl Waypoint {
    pub fn to_csv(&self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.z, self.theta)
    }

    pub fn from_csv(s: &str) -> Result<Self, ProtoError> {
        let fields: Vec<&str> = s.trim().split(',').collect();
        if fields.len() != 4 {
            return Err(ProtoError::FieldCount { expected: 4, got: fields.len() });
        }
        let mut v = [0i32; 4];
        for (slot, f) in v.iter_mut().zip(&fields) {
            *slot = f.trim().parse().map_err(|_| ProtoError::BadInt((*f).into()))?;
        }
        Ok(Self { x: v[0], y: v[1], z: v[2], theta: v[3] })
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_csv())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    #[default]
    Auto,
    Waypoint,
    Manual,
}

impl OperationMode {
    pub fn code(self) -> u8 {
        match self {
            OperationMode::Auto => 0,
            OperationMode::Waypoint => 1,
            OperationMode::Manual => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, ProtoError> {
        match code {
            0 => Ok(OperationMode::Auto),
            1 => Ok(OperationMode::Waypoint),
            2 => Ok(OperationMode::Manual),
            other => Err(ProtoError::UnknownMode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    Stop,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stop => "stop",
        }
    }
}

impl FromStr for Direction {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "stop" => Ok(Direction::Stop),
            other => Err(ProtoError::UnknownDirection(other.into())),
        }
    }
}

/// Danger status for one proximity sensor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProximityStatus {
    #[default]
    Ok,
    Danger,
    CollisionImminent,
}

impl ProximityStatus {
    pub fn code(self) -> u8 {
        match self {
            ProximityStatus::Ok => 0,
            ProximityStatus::Danger => 1,
            ProximityStatus::CollisionImminent => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, ProtoError> {
        match code {
            0 => Ok(ProximityStatus::Ok),
            1 => Ok(ProximityStatus::Danger),
            2 => Ok(ProximityStatus::CollisionImminent),
            other => Err(ProtoError::UnknownStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_csv_round() {
        let wp = Waypoint { x: 1, y: 2, z: 3, theta: 4 };
        assert_eq!(wp.to_csv(), "1,2,3,4");
        assert_eq!(Waypoint::from_csv("1,2,3,4").unwrap(), wp);
    }

    #[test]
    fn waypoint_default_is_hover_origin() {
        assert_eq!(Waypoint::default().to_csv(), "0,0,1,0");
    }

    #[test]
    fn waypoint_rejects_bad_field() {
        assert!(matches!(Waypoint::from_csv("1,2,3"), Err(ProtoError::FieldCount { expected: 4, got: 3 })));
        assert!(matches!(Waypoint::from_csv("1,2,x,4"), Err(ProtoError::BadInt(_))));
    }

    #[test]
    fn direction_words() {
        for w in ["forward", "backward", "left", "right", "up", "down", "stop"] {
            assert_eq!(w.parse::<Direction>().unwrap().as_str(), w);
        }
        assert!(matches!("sideways".parse::<Direction>(), Err(ProtoError::UnknownDirection(_))));
    }

    #[test]
    fn mode_codes() {
        assert_eq!(OperationMode::from_code(1).unwrap(), OperationMode::Waypoint);
        assert!(matches!(OperationMode::from_code(7), Err(ProtoError::UnknownMode(7))));
    }
}
