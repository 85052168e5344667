use crate::{ProtoError, ProximityStatus};

/// Console-side view of the last fiducial poll. All optionals are absent
/// when no tag is visible, or when the tag is visible but its id is not in
/// the controller's survey table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FiducialReading {
    pub visible: bool,
    pub tag_id: Option<u32>,
    pub position: Option<(f32, f32)>,
    pub altitude: Option<f32>,
    pub orientation: Option<f32>,
}

/// Controller-side fiducial snapshot: tag id, surveyed coordinates,
/// measured distance and angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiducialFix {
    pub tag_id: u32,
    pub x: i32,
    pub y: i32,
    pub dist: f32,
    pub angle: f32,
}

/// Left/center/right distance + danger status.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProximityReading {
    pub distance: [f32; 3],
    pub status: [ProximityStatus; 3],
}

fn parse_bool(s: &str) -> Result<bool, ProtoError> {
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ProtoError::BadBool(s.into()))
    }
}

fn parse_f32(s: &str) -> Result<f32, ProtoError> {
    s.trim().parse().map_err(|_| ProtoError::BadFloat(s.into()))
}

/// Decode an `at` payload. The wire carries the raw camera angle; the
/// console convention negates it, and the wire's distance field is the
/// console's altitude.
pub fn decode_fiducial(payload: &str) -> Result<FiducialReading, ProtoError> {
    let fields: Vec<&str> = payload.trim().split(',').collect();
    let visible = parse_bool(fields[0])?;
    if !visible || fields.len() == 1 {
        // Not visible, or visible but unlocated (id missing from the survey).
        return Ok(FiducialReading { visible, ..Default::default() });
    }
    if fields.len() != 6 {
        return Err(ProtoError::FieldCount { expected: 6, got: fields.len() });
    }
    let tag_id: u32 = fields[1]
        .trim()
        .parse()
        .map_err(|_| ProtoError::BadInt(fields[1].into()))?;
    let x = parse_f32(fields[2])?;
    let y = parse_f32(fields[3])?;
    let altitude = parse_f32(fields[4])?;
    let orientation = -parse_f32(fields[5])?;
    Ok(FiducialReading {
        visible: true,
        tag_id: Some(tag_id),
        position: Some((x, y)),
        altitude: Some(altitude),
        orientation: Some(orientation),
    })
}

pub fn encode_fiducial(visible: bool, fix: Option<&FiducialFix>) -> String {
    match fix {
        Some(f) if visible => format!(
            "{},{},{},{},{},{}",
            visible, f.tag_id, f.x, f.y, f.dist, f.angle
        ),
        _ => visible.to_string(),
    }
}

/// Decode a `tof` payload: three distances then three status codes.
pub fn decode_proximity(payload: &str) -> Result<ProximityReading, ProtoError> {
    let fields: Vec<&str> = payload.trim().split(',').collect();
    if fields.len() != 6 {
        return Err(ProtoError::FieldCount { expected: 6, got: fields.len() });
    }
    let mut out = ProximityReading::default();
    for n in 0..3 {
        out.distance[n] = parse_f32(fields[n])?;
        let code: i64 = fields[n + 3]
            .trim()
            .parse()
            .map_err(|_| ProtoError::BadInt(fields[n + 3].into()))?;
        out.status[n] = ProximityStatus::from_code(code)?;
    }
    Ok(out)
}

pub fn encode_proximity(r: &ProximityReading) -> String {
    format!(
        "{},{},{},{},{},{}",
        r.distance[0],
        r.distance[1],
        r.distance[2],
        r.status[0].code(),
        r.status[1].code(),
        r.status[2].code()
    )
}
