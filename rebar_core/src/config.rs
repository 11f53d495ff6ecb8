//! # Beam Configuration
//!
//! Parameters of one reinforced-concrete beam element and their validation.
//!
//! Parameters are collected in [`BeamParameters`] (plain, JSON-friendly) and
//! validated into an immutable [`BeamConfiguration`]. Every downstream stage
//! takes a `&BeamConfiguration`, so an out-of-range value can never reach the
//! geometry.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::config::{BeamParameters, BeamConfiguration, FirstRowZone};
//!
//! let mut params = BeamParameters::example("B-1");
//! params.first_row_left = FirstRowZone::new(1000, 250);
//!
//! let config = BeamConfiguration::new(params).unwrap();
//! assert_eq!(config.secondary_spacing_mm(), 335);
//! ```
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "name": "B-1",
//!   "span_mm": 3450,
//!   "height_mm": 500,
//!   "width_mm": 250,
//!   "support_left_mm": 250,
//!   "support_right_mm": 250,
//!   "diameter_top_mm": 20,
//!   "diameter_bottom_mm": 12,
//!   "diameter_stirrup_mm": 8,
//!   "covers": {
//!     "view_left_mm": 25, "view_right_mm": 30,
//!     "top_mm": 30, "bottom_mm": 25,
//!     "left_mm": 35, "right_mm": 35
//!   },
//!   "first_row_left": { "range_mm": 1000, "spacing_mm": 250 },
//!   "first_row_right": { "range_mm": 1350, "spacing_mm": 125 },
//!   "secondary_spacing_mm": 400,
//!   "element_count": 2
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::bill::SteelGrade;
use crate::errors::{DraftError, DraftResult};
use crate::geometry::Point2;
use crate::spacing::MAX_MARGIN_MM;

/// Longest allowed element name
pub const MAX_NAME_LEN: usize = 20;

/// Characters that cannot appear in an element name (it names output files)
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Upper bound for the secondary stirrup spacing in mm
pub const MAX_SECONDARY_SPACING_MM: u32 = 400;

/// Concrete cover distances in mm.
///
/// `view_left`/`view_right` are the end covers seen in elevation; `left`/`right`
/// are the side covers seen in the cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Covers {
    pub view_left_mm: u32,
    pub view_right_mm: u32,
    pub top_mm: u32,
    pub bottom_mm: u32,
    pub left_mm: u32,
    pub right_mm: u32,
}

impl Covers {
    /// Same cover on every face
    pub fn uniform(cover_mm: u32) -> Self {
        Covers {
            view_left_mm: cover_mm,
            view_right_mm: cover_mm,
            top_mm: cover_mm,
            bottom_mm: cover_mm,
            left_mm: cover_mm,
            right_mm: cover_mm,
        }
    }
}

/// Dense stirrup zone next to a support.
///
/// A zone with `range_mm == 0` or `spacing_mm == 0` is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirstRowZone {
    pub range_mm: u32,
    pub spacing_mm: u32,
}

impl FirstRowZone {
    pub fn new(range_mm: u32, spacing_mm: u32) -> Self {
        FirstRowZone { range_mm, spacing_mm }
    }

    /// A zone that places no stirrups
    pub fn disabled() -> Self {
        FirstRowZone::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.range_mm != 0 && self.spacing_mm != 0
    }

    /// Number of spacings needed to cover the range (`ceil(range/spacing)`),
    /// 0 when disabled
    pub fn intervals(&self) -> u32 {
        if self.is_enabled() {
            self.range_mm.div_ceil(self.spacing_mm)
        } else {
            0
        }
    }

    /// Range rounded up to a whole number of spacings, 0 when disabled
    pub fn rounded_range_mm(&self) -> u32 {
        self.intervals() * self.spacing_mm
    }
}

fn default_element_count() -> u32 {
    1
}

fn default_top_bar_count() -> u32 {
    2
}

fn default_bottom_bar_count() -> u32 {
    3
}

fn default_main_grade() -> SteelGrade {
    SteelGrade::B500SP
}

fn default_stirrup_grade() -> SteelGrade {
    SteelGrade::B500A
}

fn default_anchorage_mm() -> u32 {
    80
}

/// Raw beam parameters, as read from JSON or built in code.
///
/// All lengths are integer millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamParameters {
    /// Element name (e.g., "B-1"); also names layers, styles and output files
    pub name: String,

    /// Clear span between support faces
    pub span_mm: u32,
    pub height_mm: u32,
    pub width_mm: u32,
    pub support_left_mm: u32,
    pub support_right_mm: u32,

    pub diameter_top_mm: u32,
    pub diameter_bottom_mm: u32,
    pub diameter_stirrup_mm: u32,

    pub covers: Covers,

    #[serde(default)]
    pub first_row_left: FirstRowZone,
    #[serde(default)]
    pub first_row_right: FirstRowZone,

    /// Requested spacing of the uniform stirrup zone (clamped, see
    /// [`BeamConfiguration::secondary_spacing_mm`])
    pub secondary_spacing_mm: u32,

    /// Number of identical elements; multiplies schedule totals
    #[serde(default = "default_element_count")]
    pub element_count: u32,

    /// Insertion point of the elevation (left end of the left support, soffit level)
    #[serde(default)]
    pub origin: Point2,

    #[serde(default = "default_top_bar_count")]
    pub top_bar_count: u32,
    #[serde(default = "default_bottom_bar_count")]
    pub bottom_bar_count: u32,

    #[serde(default = "default_main_grade")]
    pub main_grade: SteelGrade,
    #[serde(default = "default_stirrup_grade")]
    pub stirrup_grade: SteelGrade,

    /// Straight anchorage tail at each end of a stirrup hoop
    #[serde(default = "default_anchorage_mm")]
    pub anchorage_mm: u32,
}

impl BeamParameters {
    /// A typical 250x500 beam over a 3.45 m span without first-row zones.
    ///
    /// Useful as a starting point when building parameters in code.
    pub fn example(name: impl Into<String>) -> Self {
        BeamParameters {
            name: name.into(),
            span_mm: 3450,
            height_mm: 500,
            width_mm: 250,
            support_left_mm: 250,
            support_right_mm: 250,
            diameter_top_mm: 20,
            diameter_bottom_mm: 12,
            diameter_stirrup_mm: 8,
            covers: Covers {
                view_left_mm: 25,
                view_right_mm: 30,
                top_mm: 30,
                bottom_mm: 25,
                left_mm: 35,
                right_mm: 35,
            },
            first_row_left: FirstRowZone::disabled(),
            first_row_right: FirstRowZone::disabled(),
            secondary_spacing_mm: 400,
            element_count: default_element_count(),
            origin: Point2::default(),
            top_bar_count: default_top_bar_count(),
            bottom_bar_count: default_bottom_bar_count(),
            main_grade: default_main_grade(),
            stirrup_grade: default_stirrup_grade(),
            anchorage_mm: default_anchorage_mm(),
        }
    }

    /// Validate every parameter.
    ///
    /// Returns the first violation found, naming the field.
    pub fn validate(&self) -> DraftResult<()> {
        validate_name(&self.name)?;

        check_range("first_row_left.spacing_mm", self.first_row_left.spacing_mm, 0, 400)?;
        check_range("first_row_right.spacing_mm", self.first_row_right.spacing_mm, 0, 400)?;
        check_range("first_row_left.range_mm", self.first_row_left.range_mm, 0, 15000)?;
        check_range("first_row_right.range_mm", self.first_row_right.range_mm, 0, 15000)?;

        check_range("covers.view_left_mm", self.covers.view_left_mm, 5, 100)?;
        check_range("covers.view_right_mm", self.covers.view_right_mm, 5, 100)?;
        check_range("covers.top_mm", self.covers.top_mm, 5, 100)?;
        check_range("covers.bottom_mm", self.covers.bottom_mm, 5, 100)?;
        check_range("covers.left_mm", self.covers.left_mm, 5, 100)?;
        check_range("covers.right_mm", self.covers.right_mm, 5, 100)?;

        check_range("width_mm", self.width_mm, 100, 1000)?;
        check_range("diameter_top_mm", self.diameter_top_mm, 1, 100)?;
        check_range("diameter_bottom_mm", self.diameter_bottom_mm, 1, 100)?;
        check_range("diameter_stirrup_mm", self.diameter_stirrup_mm, 1, 100)?;
        check_range("support_left_mm", self.support_left_mm, 50, 1000)?;
        check_range("support_right_mm", self.support_right_mm, 50, 1000)?;
        check_range("span_mm", self.span_mm, 300, 15000)?;
        check_range("height_mm", self.height_mm, 100, 1500)?;
        check_range("secondary_spacing_mm", self.secondary_spacing_mm, 5, MAX_SECONDARY_SPACING_MM)?;

        check_range("element_count", self.element_count, 1, 1000)?;
        check_range("top_bar_count", self.top_bar_count, 1, 20)?;
        check_range("bottom_bar_count", self.bottom_bar_count, 1, 20)?;
        check_range("anchorage_mm", self.anchorage_mm, 0, 500)?;

        if !self.origin.x.is_finite() || !self.origin.y.is_finite() {
            return Err(DraftError::configuration(
                "origin",
                format!("({}, {})", self.origin.x, self.origin.y),
                "Origin coordinates must be finite",
            ));
        }

        let ranges = self.first_row_left.range_mm + self.first_row_right.range_mm;
        if self.span_mm <= ranges {
            return Err(DraftError::configuration(
                "span_mm",
                self.span_mm.to_string(),
                format!("Span must exceed the combined first-row ranges ({ranges} mm)"),
            ));
        }

        let reserved = self.first_row_left.rounded_range_mm() + self.first_row_right.rounded_range_mm();
        if reserved > self.span_mm {
            return Err(DraftError::configuration(
                "span_mm",
                self.span_mm.to_string(),
                format!("First-row zones rounded up to whole spacings need {reserved} mm"),
            ));
        }

        // A leftover that fits in the margin but not in one spacing leaves no
        // secondary zone between the first-row zones
        let free = self.span_mm - reserved;
        let spacing = effective_secondary_spacing(self.secondary_spacing_mm, self.height_mm);
        if free <= MAX_MARGIN_MM && free < spacing {
            return Err(DraftError::configuration(
                "span_mm",
                self.span_mm.to_string(),
                format!("First-row zones leave {free} mm, less than one secondary spacing of {spacing} mm"),
            ));
        }

        let cross_section_covers = self.covers.left_mm + self.covers.right_mm + 2 * self.diameter_stirrup_mm;
        if cross_section_covers >= self.width_mm {
            return Err(DraftError::configuration(
                "width_mm",
                self.width_mm.to_string(),
                "Side covers and stirrup legs leave no room inside the section",
            ));
        }

        let vertical_covers = self.covers.top_mm + self.covers.bottom_mm + 2 * self.diameter_stirrup_mm;
        if vertical_covers >= self.height_mm {
            return Err(DraftError::configuration(
                "height_mm",
                self.height_mm.to_string(),
                "Top and bottom covers leave no room inside the section",
            ));
        }

        Ok(())
    }
}

/// Validated, immutable beam configuration.
///
/// Deserializing a configuration runs the same validation as
/// [`BeamConfiguration::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BeamParameters", into = "BeamParameters")]
pub struct BeamConfiguration {
    params: BeamParameters,
    secondary_spacing_mm: u32,
}

impl BeamConfiguration {
    /// Validate parameters into a configuration.
    pub fn new(params: BeamParameters) -> DraftResult<Self> {
        params.validate()?;

        let secondary_spacing_mm = effective_secondary_spacing(params.secondary_spacing_mm, params.height_mm);
        if secondary_spacing_mm != params.secondary_spacing_mm {
            log::warn!(
                "{}: secondary stirrup spacing {} mm clamped to {} mm (height {} mm)",
                params.name,
                params.secondary_spacing_mm,
                secondary_spacing_mm,
                params.height_mm
            );
        }

        Ok(BeamConfiguration {
            params,
            secondary_spacing_mm,
        })
    }

    /// The validated parameters
    pub fn params(&self) -> &BeamParameters {
        &self.params
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Clamped secondary spacing: ≤ 400 mm, ≤ 0.75·0.9·height, multiple of 5
    pub fn secondary_spacing_mm(&self) -> u32 {
        self.secondary_spacing_mm
    }

    /// Overall elevation length: left support + span + right support
    pub fn total_length_mm(&self) -> u32 {
        self.params.support_left_mm + self.params.span_mm + self.params.support_right_mm
    }

    pub fn origin(&self) -> Point2 {
        self.params.origin
    }

    /// Element count multiplier for schedule totals
    pub fn element_count(&self) -> u32 {
        self.params.element_count
    }
}

impl TryFrom<BeamParameters> for BeamConfiguration {
    type Error = DraftError;

    fn try_from(params: BeamParameters) -> DraftResult<Self> {
        BeamConfiguration::new(params)
    }
}

impl From<BeamConfiguration> for BeamParameters {
    fn from(config: BeamConfiguration) -> Self {
        config.params
    }
}

/// Clamp a requested secondary spacing: the smaller of the request, 400 mm and
/// 75% of 90% of the beam height, rounded down to a multiple of 5 mm.
pub fn effective_secondary_spacing(requested_mm: u32, height_mm: u32) -> u32 {
    let limit = 0.75 * 0.9 * f64::from(height_mm);
    let spacing = f64::from(requested_mm.min(MAX_SECONDARY_SPACING_MM)).min(limit);
    ((spacing / 5.0).floor() as u32) * 5
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> DraftResult<()> {
    if value < min || value > max {
        return Err(DraftError::configuration(
            field,
            value.to_string(),
            format!("must lie within {min}..={max}"),
        ));
    }
    Ok(())
}

/// Element names end up in file names, layer names and style names.
fn validate_name(name: &str) -> DraftResult<()> {
    let reason = if name.is_empty() {
        Some("Name must not be empty".to_string())
    } else if name.chars().count() > MAX_NAME_LEN {
        Some(format!("Name is longer than {MAX_NAME_LEN} characters"))
    } else if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c) || c.is_control()) {
        Some(format!("Name contains forbidden character {c:?}"))
    } else if name == "." || name == ".." {
        Some("Name must not be a relative path component".to_string())
    } else if name.trim() != name {
        Some("Name must not start or end with whitespace".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DraftError::configuration("name", name, reason)),
        None => Ok(()),
    }
}
