//! # Unit Types
//!
//! Type-safe wrappers for drafting and scheduling units. These are plain
//! `f64` newtypes so they serialize as bare numbers.
//!
//! ## Metric Units
//!
//! Drawings are produced in millimetres (one drawing unit = 1 mm). Bending
//! schedules report bar lengths in metres and masses in kilograms.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::units::{Meters, Millimeters, KgPerMeter};
//!
//! let bar = Millimeters(3950.0);
//! let bar_m: Meters = bar.into();
//! assert_eq!(bar_m.0, 3.95);
//!
//! let unit_mass = KgPerMeter::for_bar_diameter(12);
//! assert_eq!(unit_mass.0, 0.888);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// Density of reinforcing steel in kg/m³
pub const STEEL_DENSITY_KG_M3: f64 = 7850.0;

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimetres (drawing units)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl Add for Meters {
    type Output = Meters;

    fn add(self, rhs: Meters) -> Meters {
        Meters(self.0 + rhs.0)
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

impl Add for Kilograms {
    type Output = Kilograms;

    fn add(self, rhs: Kilograms) -> Kilograms {
        Kilograms(self.0 + rhs.0)
    }
}

/// Linear mass of a bar in kilograms per metre
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgPerMeter(pub f64);

impl KgPerMeter {
    /// Nominal linear mass of a round bar, rounded to three decimals as
    /// printed in bending schedules (6 mm → 0.222, 12 mm → 0.888).
    pub fn for_bar_diameter(diameter_mm: u32) -> Self {
        let d_m = f64::from(diameter_mm) / 1000.0;
        let area_m2 = PI * d_m * d_m / 4.0;
        KgPerMeter(round_to(area_m2 * STEEL_DENSITY_KG_M3, 3))
    }
}

impl Mul<Meters> for KgPerMeter {
    type Output = Kilograms;

    fn mul(self, rhs: Meters) -> Kilograms {
        Kilograms(self.0 * rhs.0)
    }
}

/// Round to a fixed number of decimal places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversion() {
        let m: Meters = Millimeters(2500.0).into();
        assert_eq!(m, Meters(2.5));
        let mm: Millimeters = Meters(0.125).into();
        assert_eq!(mm, Millimeters(125.0));
    }

    #[test]
    fn test_unit_mass_table_values() {
        assert_eq!(KgPerMeter::for_bar_diameter(6).0, 0.222);
        assert_eq!(KgPerMeter::for_bar_diameter(8).0, 0.395);
        assert_eq!(KgPerMeter::for_bar_diameter(12).0, 0.888);
        assert_eq!(KgPerMeter::for_bar_diameter(20).0, 2.466);
    }

    #[test]
    fn test_mass_from_length() {
        let mass = KgPerMeter(0.888) * Meters(10.0);
        assert!((mass.0 - 8.88).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.66, 1), 2.7);
        assert_eq!(round_to(7.0, 2), 7.0);
    }

    #[test]
    fn test_transparent_serialization() {
        let json = serde_json::to_string(&Meters(3.5)).unwrap();
        assert_eq!(json, "3.5");
    }
}
