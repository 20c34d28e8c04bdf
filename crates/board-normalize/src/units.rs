//! Host unit conversion.
//!
//! The host stores lengths as integer nanometres and angles as tenths of a
//! degree. Everything leaving the engine is millimetres and degrees.

use crate::snapshot::Vec2;

/// Host length units per millimetre.
pub const NM_PER_MM: f64 = 1e6;

/// Host angle units per degree.
pub const DECIDEG_PER_DEG: f64 = 10.0;

pub fn to_mm(v: i64) -> f64 {
    v as f64 / NM_PER_MM
}

pub fn from_mm(v: f64) -> i64 {
    (v * NM_PER_MM).round() as i64
}

pub fn to_deg(decideg: f64) -> f64 {
    decideg / DECIDEG_PER_DEG
}

pub fn from_deg(deg: f64) -> f64 {
    deg * DECIDEG_PER_DEG
}

/// Convert a host point to millimetres.
pub fn normalize(p: Vec2) -> [f64; 2] {
    [to_mm(p.x), to_mm(p.y)]
}

pub fn denormalize(p: [f64; 2]) -> Vec2 {
    Vec2::new(from_mm(p[0]), from_mm(p[1]))
}

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Convert a host arc (start angle and signed sweep, both decidegrees) into
/// an ordered `(startangle, endangle)` pair in degrees rounded to 2 places.
///
/// A negative sweep swaps the ends so the result always has start <= end.
pub fn arc_angles(start_decideg: f64, sweep_decideg: f64) -> (f64, f64) {
    let mut a1 = round_f64(to_deg(start_decideg), 2);
    let mut a2 = round_f64(to_deg(start_decideg + sweep_decideg), 2);
    if sweep_decideg < 0.0 {
        std::mem::swap(&mut a1, &mut a2);
    }
    (a1, a2)
}
