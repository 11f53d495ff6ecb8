//! # Bend Geometry
//!
//! Minimum mandrel radius for bent bars and the polyline bulge that draws a
//! 90° bend as a quarter circle.
//!
//! The bend radius follows a fixed two-step rule: bars up to 16 mm are bent
//! around `2.5·d`, thicker bars around `4.0·d`.
//!
//! ```rust
//! use rebar_core::geometry::bend::{bend_radius, bend_bulge};
//!
//! assert_eq!(bend_radius(16), 40.0);
//! assert_eq!(bend_radius(20), 80.0);
//! assert!((bend_bulge(12) + 0.41421356).abs() < 1e-6);
//! ```

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Largest diameter bent with the small (2.5·d) radius
pub const SMALL_BEND_MAX_DIAMETER_MM: u32 = 16;

/// Bend radius in mm for a bar of the given diameter
pub fn bend_radius(diameter_mm: u32) -> f64 {
    let d = f64::from(diameter_mm);
    if diameter_mm <= SMALL_BEND_MAX_DIAMETER_MM {
        2.5 * d
    } else {
        4.0 * d
    }
}

/// Bulge of a circular arc given its start and end angles (radians).
///
/// The arc runs counter-clockwise from `start_angle` to `end_angle`; the
/// bulge is `tan(Δθ/4)` with `Δθ` normalised into `[0, 2π)`.
pub fn arc_to_bulge(start_angle: f64, end_angle: f64) -> f64 {
    let sweep = (TAU + (end_angle - start_angle)) % TAU;
    (sweep / 4.0).tan()
}

/// Bulge used on a bend waypoint of a bar with the given diameter.
///
/// The corner is a quarter circle of radius `bend_radius(d)` centred at
/// `(r, 0)` and swept from π to π/2. A bulge only encodes the swept angle, so
/// the result is the same for every radius and every position in the drawing.
/// The drawn direction is clockwise, hence the negative reciprocal. A zero
/// diameter has no radius and yields a sharp corner (bulge 0).
pub fn bend_bulge(diameter_mm: u32) -> f64 {
    if bend_radius(diameter_mm) == 0.0 {
        return 0.0;
    }
    -1.0 / arc_to_bulge(PI, FRAC_PI_2)
}

/// Signed bulge of a turn by `angle_deg` (positive = counter-clockwise).
pub fn bulge_for_turn(angle_deg: f64) -> f64 {
    (angle_deg.to_radians() / 4.0).tan()
}

/// Arc length of a bend of `turn_deg` degrees for a bar of the given diameter
pub fn bend_arc_length(diameter_mm: u32, turn_deg: f64) -> f64 {
    2.0 * (turn_deg / 360.0) * PI * bend_radius(diameter_mm)
}
