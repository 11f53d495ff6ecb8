//! # Stirrup Spacing Allocator
//!
//! Places stirrups along the clear span. Optional dense first-row zones sit
//! next to each support; the remainder is filled with a uniform secondary zone.
//!
//! ## Algorithm
//!
//! 1. Each enabled zone reserves its range rounded up to a whole number of
//!    spacings.
//! 2. The secondary spacing `s` divides what is left; the remainder is the
//!    margin, split evenly between both ends of the span.
//! 3. While the margin exceeds 60 mm, `s` drops by 5 mm and the margin is
//!    recomputed.
//! 4. First-row stirrups start half a margin from each support face; the
//!    secondary zone fills the gap between the last first-row stirrups.
//!
//! All offsets are measured from the left support face. They are whole or
//! half millimetres, so equality checks on them are exact.
//!
//! ```rust
//! use rebar_core::config::FirstRowZone;
//! use rebar_core::spacing::allocate_span;
//!
//! let layout = allocate_span(3000, FirstRowZone::disabled(), FirstRowZone::disabled(), 335).unwrap();
//! assert_eq!(layout.secondary_spacing_mm, 330);
//! assert_eq!(layout.margin_mm, 30);
//! assert_eq!(layout.dimension_points, vec![0.0, 15.0, 2985.0, 3000.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{BeamConfiguration, FirstRowZone};
use crate::errors::{DraftError, DraftResult};

/// Largest margin accepted before the secondary spacing is reduced
pub const MAX_MARGIN_MM: u32 = 60;

/// Step by which the secondary spacing is reduced
pub const SPACING_STEP_MM: u32 = 5;

/// Stirrup positions along one span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StirrupLayout {
    pub span_mm: u32,
    pub left_zone: FirstRowZone,
    pub right_zone: FirstRowZone,

    /// Sorted, deduplicated stirrup offsets from the left support face
    pub offsets: Vec<f64>,

    /// Secondary spacing after margin reduction
    pub secondary_spacing_mm: u32,
    /// Number of secondary spacings, before any pattern adjustment
    pub secondary_count: u32,
    /// Unused length, half of it at each end of the span
    pub margin_mm: u32,

    /// Offset of the last left first-row stirrup, if that zone is enabled
    pub last_left: Option<f64>,
    /// Offset of the last right first-row stirrup, if that zone is enabled
    pub last_right: Option<f64>,

    /// Sorted, deduplicated breakpoints of the dimension chain
    pub dimension_points: Vec<f64>,
}

impl StirrupLayout {
    /// Number of stirrups placed
    pub fn stirrup_count(&self) -> usize {
        self.offsets.len()
    }

    /// Half the margin: offset of the first stirrup when no zone is flush
    pub fn half_margin(&self) -> f64 {
        f64::from(self.margin_mm) / 2.0
    }
}

/// Allocate stirrups for a validated configuration.
pub fn allocate(config: &BeamConfiguration) -> DraftResult<StirrupLayout> {
    let p = config.params();
    allocate_span(
        p.span_mm,
        p.first_row_left,
        p.first_row_right,
        config.secondary_spacing_mm(),
    )
}

/// Allocate stirrups over `span_mm` starting from the given secondary spacing.
pub fn allocate_span(
    span_mm: u32,
    left: FirstRowZone,
    right: FirstRowZone,
    secondary_spacing_mm: u32,
) -> DraftResult<StirrupLayout> {
    if secondary_spacing_mm < SPACING_STEP_MM {
        return Err(DraftError::configuration(
            "secondary_spacing_mm",
            secondary_spacing_mm.to_string(),
            format!("must be at least {SPACING_STEP_MM} mm"),
        ));
    }

    let reserved = left.rounded_range_mm() + right.rounded_range_mm();
    let free = span_mm.checked_sub(reserved).ok_or_else(|| {
        DraftError::configuration(
            "span_mm",
            span_mm.to_string(),
            format!("First-row zones rounded up to whole spacings need {reserved} mm"),
        )
    })?;

    let mut spacing = secondary_spacing_mm;
    let mut margin = free % spacing;
    while margin > MAX_MARGIN_MM && spacing > SPACING_STEP_MM {
        spacing -= SPACING_STEP_MM;
        margin = free % spacing;
    }
    log::debug!(
        "span {span_mm} mm: reserved {reserved} mm, secondary spacing {secondary_spacing_mm} -> {spacing} mm, margin {margin} mm"
    );

    let span = f64::from(span_mm);
    let half_margin = f64::from(margin) / 2.0;
    let mut offsets = Vec::new();

    let last_left = left.is_enabled().then(|| {
        let zone_spacing = f64::from(left.spacing_mm);
        for i in 0..=left.intervals() {
            offsets.push(half_margin + f64::from(i) * zone_spacing);
        }
        half_margin + f64::from(left.rounded_range_mm())
    });

    let last_right = right.is_enabled().then(|| {
        let zone_spacing = f64::from(right.spacing_mm);
        for i in 0..=right.intervals() {
            offsets.push(span - half_margin - f64::from(i) * zone_spacing);
        }
        span - half_margin - f64::from(right.rounded_range_mm())
    });

    let start = last_left.unwrap_or(half_margin);
    let end = last_right.unwrap_or(span - half_margin);
    let step = f64::from(spacing);
    let steps = ((end - start) / step).round().max(0.0) as u32;
    for i in 0..=steps {
        offsets.push(start + f64::from(i) * step);
    }
    sort_unique(&mut offsets);

    let count_from = last_left.unwrap_or(0.0);
    let count_to = last_right.unwrap_or(span);
    let secondary_count = ((count_to - count_from) / step).ceil().max(0.0) as u32;

    let mut dimension_points = vec![0.0, span, half_margin, span - half_margin];
    dimension_points.extend(last_left);
    dimension_points.extend(last_right);
    sort_unique(&mut dimension_points);

    log::debug!(
        "span {span_mm} mm: {} stirrups, {secondary_count} secondary spacings, breakpoints {:?}",
        offsets.len(),
        dimension_points
    );

    Ok(StirrupLayout {
        span_mm,
        left_zone: left,
        right_zone: right,
        offsets,
        secondary_spacing_mm: spacing,
        secondary_count,
        margin_mm: margin,
        last_left,
        last_right,
        dimension_points,
    })
}

fn sort_unique(values: &mut Vec<f64>) {
    values.sort_by(f64::total_cmp);
    values.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeamParameters;

    fn none() -> FirstRowZone {
        FirstRowZone::disabled()
    }

    fn assert_well_formed(layout: &StirrupLayout) {
        let span = f64::from(layout.span_mm);
        for pair in layout.offsets.windows(2) {
            assert!(pair[0] < pair[1], "offsets not strictly increasing: {:?}", layout.offsets);
        }
        for &x in &layout.offsets {
            assert!((0.0..=span).contains(&x), "offset {x} outside span {span}");
        }
        for pair in layout.dimension_points.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(layout.margin_mm <= MAX_MARGIN_MM);
    }

    #[test]
    fn test_uniform_span_reduces_spacing_until_margin_fits() {
        let layout = allocate_span(3000, none(), none(), 335).unwrap();
        assert_eq!(layout.secondary_spacing_mm, 330);
        assert_eq!(layout.margin_mm, 30);
        assert_eq!(layout.dimension_points, vec![0.0, 15.0, 2985.0, 3000.0]);
        assert_eq!(layout.offsets.first(), Some(&15.0));
        assert_eq!(layout.offsets.last(), Some(&2985.0));
        assert_eq!(layout.stirrup_count(), 10);
        // ceil(3000 / 330)
        assert_eq!(layout.secondary_count, 10);
        assert_well_formed(&layout);
    }

    #[test]
    fn test_both_zones_with_margin() {
        let layout = allocate_span(
            3450,
            FirstRowZone::new(1000, 250),
            FirstRowZone::new(1350, 125),
            335,
        )
        .unwrap();

        assert_eq!(layout.secondary_spacing_mm, 265);
        assert_eq!(layout.margin_mm, 15);
        assert_eq!(layout.last_left, Some(1007.5));
        assert_eq!(layout.last_right, Some(2067.5));
        assert_eq!(
            layout.dimension_points,
            vec![0.0, 7.5, 1007.5, 2067.5, 3442.5, 3450.0]
        );
        assert_eq!(layout.secondary_count, 4);
        // 5 left + 12 right + 3 secondary in between
        assert_eq!(layout.stirrup_count(), 20);
        assert_well_formed(&layout);
    }

    #[test]
    fn test_exact_fit_has_no_margin() {
        let layout = allocate_span(3000, none(), none(), 300).unwrap();
        assert_eq!(layout.margin_mm, 0);
        assert_eq!(layout.dimension_points, vec![0.0, 3000.0]);
        assert_eq!(layout.secondary_count, 10);
        assert_eq!(layout.stirrup_count(), 11);
    }

    #[test]
    fn test_single_zone_flush() {
        // reserved 1000, free 2000 = 8 x 250
        let layout = allocate_span(3000, FirstRowZone::new(1000, 200), none(), 250).unwrap();
        assert_eq!(layout.margin_mm, 0);
        assert_eq!(layout.last_left, Some(1000.0));
        assert_eq!(layout.last_right, None);
        assert_eq!(layout.dimension_points, vec![0.0, 1000.0, 3000.0]);
        assert_eq!(layout.secondary_count, 8);
    }

    #[test]
    fn test_zones_filling_span_collapse_breakpoints() {
        let layout = allocate_span(
            2000,
            FirstRowZone::new(1000, 250),
            FirstRowZone::new(970, 250),
            335,
        )
        .unwrap();
        assert_eq!(layout.margin_mm, 0);
        assert_eq!(layout.dimension_points, vec![0.0, 1000.0, 2000.0]);
        assert_eq!(layout.secondary_count, 0);
        assert_well_formed(&layout);
    }

    #[test]
    fn test_margin_bound_over_span_range() {
        for span in (300..=15000).step_by(37) {
            for requested in [65, 200, 335, 400] {
                let layout = allocate_span(span, none(), none(), requested).unwrap();
                assert!(layout.secondary_spacing_mm <= requested);
                assert_eq!(layout.secondary_spacing_mm % SPACING_STEP_MM, 0);
                assert_well_formed(&layout);
            }
        }
    }

    #[test]
    fn test_margin_bound_with_zones() {
        for span in (2500..=9000).step_by(53) {
            let layout = allocate_span(
                span,
                FirstRowZone::new(800, 150),
                FirstRowZone::new(600, 100),
                400,
            )
            .unwrap();
            assert_well_formed(&layout);
            let first = layout.offsets[0];
            assert_eq!(first, layout.half_margin());
        }
    }

    #[test]
    fn test_reserved_beyond_span_is_rejected() {
        let err = allocate_span(1000, FirstRowZone::new(900, 400), none(), 200).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_allocate_from_configuration() {
        let config = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
        let layout = allocate(&config).unwrap();
        assert_eq!(layout.span_mm, 3450);
        assert_well_formed(&layout);
    }
}
