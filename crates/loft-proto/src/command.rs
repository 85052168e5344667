use crate::{Direction, OperationMode, ProtoError, Waypoint};

pub const ACK: &str = "ok";
pub const QUITTING: &str = "quitting";
pub const NOT_RECOGNIZED: &str = "Not recognized";
pub const ERROR_PREFIX: &str = "error:";

/// One request line of the console/controller grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Move(Direction),
    CurrWp,
    SetMode(OperationMode),
    SetWp(Waypoint),
    At,
    Tof,
}

impl Command {
    /// Parse a request line. `Err(Unrecognized)` is the normal answer for an
    /// unknown verb; the malformed-payload variants cover known verbs with
    /// payloads that don't parse.
    pub fn parse(line: &str) -> Result<Self, ProtoError> {
        let line = line.trim();
        match line {
            "quit" => return Ok(Command::Quit),
            "curr wp" => return Ok(Command::CurrWp),
            "at" => return Ok(Command::At),
            "tof" => return Ok(Command::Tof),
            _ => {}
        }
        if let Ok(dir) = line.parse::<Direction>() {
            return Ok(Command::Move(dir));
        }
        match line.split_once(' ') {
            Some(("mode", arg)) => {
                let code: i64 = arg
                    .trim()
                    .parse()
                    .map_err(|_| ProtoError::BadInt(arg.trim().into()))?;
                Ok(Command::SetMode(OperationMode::from_code(code)?))
            }
            Some(("wp", arg)) => Ok(Command::SetWp(Waypoint::from_csv(arg)?)),
            _ => Err(ProtoError::Unrecognized),
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            Command::Quit => "quit".into(),
            Command::Move(dir) => dir.as_str().into(),
            Command::CurrWp => "curr wp".into(),
            Command::SetMode(mode) => format!("mode {}", mode.code()),
            Command::SetWp(wp) => format!("wp {}", wp.to_csv()),
            Command::At => "at".into(),
            Command::Tof => "tof".into(),
        }
    }
}

/// Reply text for a protocol parse fault. The accept loop answers with this
/// instead of dropping the connection.
pub fn error_reply(err: &ProtoError) -> String {
    format!("{} {}", ERROR_PREFIX, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_verbs() {
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("curr wp").unwrap(), Command::CurrWp);
        assert_eq!(Command::parse("at").unwrap(), Command::At);
        assert_eq!(Command::parse("tof").unwrap(), Command::Tof);
        assert_eq!(Command::parse("stop").unwrap(), Command::Move(Direction::Stop));
    }

    #[test]
    fn parses_payload_verbs() {
        assert_eq!(
            Command::parse("mode 2").unwrap(),
            Command::SetMode(OperationMode::Manual)
        );
        assert_eq!(
            Command::parse("wp 1,2,3,4").unwrap(),
            Command::SetWp(Waypoint { x: 1, y: 2, z: 3, theta: 4 })
        );
    }

    #[test]
    fn malformed_payloads_are_not_unrecognized() {
        assert!(matches!(Command::parse("mode x"), Err(ProtoError::BadInt(_))));
        assert!(matches!(Command::parse("mode 9"), Err(ProtoError::UnknownMode(9))));
        assert!(matches!(Command::parse("wp 1,2,3"), Err(ProtoError::FieldCount { .. })));
        assert!(matches!(Command::parse("wp a,b,c,d"), Err(ProtoError::BadInt(_))));
    }

    #[test]
    fn unknown_verbs_are_unrecognized() {
        assert!(matches!(Command::parse("foobar"), Err(ProtoError::Unrecognized)));
        assert!(matches!(Command::parse(""), Err(ProtoError::Unrecognized)));
    }

    #[test]
    fn request_lines_round_trip() {
        for line in ["quit", "forward", "curr wp", "mode 1", "wp 1,2,3,4", "at", "tof"] {
            assert_eq!(Command::parse(line).unwrap().to_line(), line);
        }
    }
}
