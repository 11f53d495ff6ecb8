//! # Bar Path Builder
//!
//! Waypoint sequences for everything drawn as a polyline: the two main bars in
//! elevation, the two stirrup shapes of the cross-section detail, the
//! stirrup legs along the span, and the concrete outlines.
//!
//! Elevation coordinates are measured from the configuration origin (left end
//! of the left support, soffit level). Cross-section coordinates are measured
//! from the lower-left corner of the section passed in by the caller.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::config::{BeamConfiguration, BeamParameters};
//! use rebar_core::geometry::BarPathBuilder;
//!
//! let config = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
//! let builder = BarPathBuilder::new(&config);
//!
//! let top = builder.top_bar(0.0);
//! assert_eq!(top.waypoints.len(), 6);
//! assert_eq!(top.unrolled_length_mm(), 4660);
//! ```

use crate::config::BeamConfiguration;
use crate::geometry::bend::{bend_arc_length, bend_bulge, bend_radius};
use crate::geometry::{point_position, BarKind, BarPath, Point2, Waypoint};

/// Bearing of the anchoring diagonal leg of the diagonal stirrup
/// (clockwise from north)
pub const DIAGONAL_LEG_BEARING_DEG: f64 = 120.0;

/// Unrolled length of a path in whole millimetres.
///
/// Straight segments contribute their Euclidean length. A segment starting at
/// a bend waypoint contributes the arc length of a `turn_deg` bend of the
/// bar's bend radius instead.
pub fn path_length(waypoints: &[Waypoint], diameter_mm: u32, turn_deg: f64) -> u32 {
    let total: f64 = waypoints
        .windows(2)
        .map(|pair| match pair[0] {
            Waypoint::Bend { .. } => bend_arc_length(diameter_mm, turn_deg),
            Waypoint::Plain { at } => at.distance_to(pair[1].position()),
        })
        .sum();
    total.round() as u32
}

/// Builds bar paths for one beam configuration.
pub struct BarPathBuilder<'a> {
    config: &'a BeamConfiguration,
}

impl<'a> BarPathBuilder<'a> {
    pub fn new(config: &'a BeamConfiguration) -> Self {
        BarPathBuilder { config }
    }

    /// Top main bar, drawn `y_offset` above the configuration origin.
    ///
    /// Rises from the bottom cover at the left end, bends twice to run along
    /// the top reinforcement line, and comes back down at the right end.
    pub fn top_bar(&self, y_offset: f64) -> BarPath {
        let p = self.config.params();
        let origin = self.config.origin().offset(0.0, y_offset);
        let d = f64::from(p.diameter_top_mm);
        let r = bend_radius(p.diameter_top_mm);
        let bulge = bend_bulge(p.diameter_top_mm);

        let left_x = origin.x + f64::from(p.covers.view_left_mm) + 0.5 * d;
        let right_x = origin.x + f64::from(self.config.total_length_mm()) - f64::from(p.covers.view_right_mm) - 0.5 * d;
        let bottom_y = origin.y + f64::from(p.covers.bottom_mm);
        let top_y = origin.y + f64::from(p.height_mm)
            - f64::from(p.covers.top_mm)
            - f64::from(p.diameter_stirrup_mm)
            - 0.5 * d;

        let waypoints = vec![
            Waypoint::plain(left_x, bottom_y),
            Waypoint::bend(left_x, top_y - r, bulge),
            Waypoint::plain(left_x + r, top_y),
            Waypoint::bend(right_x - r, top_y, bulge),
            Waypoint::plain(right_x, top_y - r),
            Waypoint::plain(right_x, bottom_y),
        ];
        BarPath::new(BarKind::TopMain, p.diameter_top_mm, waypoints)
    }

    /// Bottom main bar: a straight run between the end covers.
    pub fn bottom_bar(&self, y_offset: f64) -> BarPath {
        let p = self.config.params();
        let origin = self.config.origin().offset(0.0, y_offset);
        let y = origin.y
            + f64::from(p.covers.bottom_mm)
            + f64::from(p.diameter_stirrup_mm)
            + 0.5 * f64::from(p.diameter_bottom_mm);

        let waypoints = vec![
            Waypoint::plain(origin.x + f64::from(p.covers.view_left_mm), y),
            Waypoint::plain(
                origin.x + f64::from(self.config.total_length_mm()) - f64::from(p.covers.view_right_mm),
                y,
            ),
        ];
        BarPath::new(BarKind::BottomMain, p.diameter_bottom_mm, waypoints)
    }

    /// Inner edges of the stirrup centreline in a section placed at `corner`:
    /// (left x, right x, bottom y, top y)
    fn hoop_lines(&self, corner: Point2) -> (f64, f64, f64, f64) {
        let p = self.config.params();
        let half = 0.5 * f64::from(p.diameter_stirrup_mm);
        (
            corner.x + f64::from(p.covers.left_mm) + half,
            corner.x + f64::from(p.width_mm) - f64::from(p.covers.right_mm) - half,
            corner.y + f64::from(p.covers.bottom_mm) + half,
            corner.y + f64::from(p.height_mm) - f64::from(p.covers.top_mm) - half,
        )
    }

    /// Rectangular hoop with four bent corners, closed by a second bend at the
    /// top-left corner and an anchorage tail at both ends.
    pub fn rectangular_stirrup(&self, corner: Point2) -> BarPath {
        let p = self.config.params();
        let ds = p.diameter_stirrup_mm;
        let r = bend_radius(ds);
        let bulge = bend_bulge(ds);
        let anchor = f64::from(p.anchorage_mm);
        let (left, right, bottom, top) = self.hoop_lines(corner);

        let waypoints = vec![
            Waypoint::plain(left, top - r - anchor),
            Waypoint::bend(left, top - r, bulge),
            Waypoint::plain(left + r, top),
            Waypoint::bend(right - r, top, bulge),
            Waypoint::plain(right, top - r),
            Waypoint::bend(right, bottom + r, bulge),
            Waypoint::plain(right - r, bottom),
            Waypoint::bend(left + r, bottom, bulge),
            Waypoint::plain(left, bottom + r),
            Waypoint::bend(left, top - r, bulge),
            Waypoint::plain(left + r, top),
            Waypoint::plain(left + r + anchor, top),
        ];
        BarPath::new(BarKind::RectangularStirrup, ds, waypoints)
    }

    /// Hoop with plain corners, closed by a diagonal leg projected from the
    /// top-left corner and a hooked tail.
    pub fn diagonal_stirrup(&self, corner: Point2) -> BarPath {
        let p = self.config.params();
        let ds = p.diameter_stirrup_mm;
        let r = bend_radius(ds);
        let anchor = f64::from(p.anchorage_mm);
        let (left, right, bottom, top) = self.hoop_lines(corner);

        let inner_width = f64::from(p.width_mm)
            - f64::from(ds)
            - f64::from(p.covers.left_mm)
            - f64::from(p.covers.right_mm);
        let leg_end = point_position(Point2::new(left, top), inner_width, DIAGONAL_LEG_BEARING_DEG);
        let tail_end = point_position(leg_end, r + anchor, DIAGONAL_LEG_BEARING_DEG + 90.0);

        let waypoints = vec![
            Waypoint::plain(right - r - anchor, top),
            Waypoint::plain(right, top),
            Waypoint::plain(right, bottom),
            Waypoint::plain(left, bottom),
            Waypoint::plain(left, top),
            Waypoint::from(leg_end),
            Waypoint::from(tail_end),
        ];
        BarPath::new(BarKind::DiagonalStirrup, ds, waypoints)
    }

    /// Stirrup seen in elevation at `offset_mm` from the left support face.
    pub fn stirrup_elevation(&self, offset_mm: f64) -> BarPath {
        let p = self.config.params();
        let origin = self.config.origin();
        let x = origin.x + f64::from(p.support_left_mm) + offset_mm;
        let waypoints = vec![
            Waypoint::plain(x, origin.y + f64::from(p.covers.bottom_mm)),
            Waypoint::plain(x, origin.y + f64::from(p.height_mm) - f64::from(p.covers.top_mm)),
        ];
        BarPath::new(BarKind::StirrupElevation, p.diameter_stirrup_mm, waypoints)
    }

    /// Closed elevation outline of the beam including the support lengths.
    pub fn beam_outline(&self) -> Vec<Point2> {
        let p = self.config.params();
        let o = self.config.origin();
        let support_left = f64::from(p.support_left_mm);
        let span = f64::from(p.span_mm);
        let total = f64::from(self.config.total_length_mm());
        let height = f64::from(p.height_mm);
        vec![
            o,
            o.offset(support_left, 0.0),
            o.offset(support_left + span, 0.0),
            o.offset(total, 0.0),
            o.offset(total, height),
            o.offset(0.0, height),
        ]
    }

    /// Closed cross-section rectangle with its lower-left corner at `corner`.
    pub fn section_outline(&self, corner: Point2) -> Vec<Point2> {
        let p = self.config.params();
        let width = f64::from(p.width_mm);
        let height = f64::from(p.height_mm);
        vec![
            corner,
            corner.offset(width, 0.0),
            corner.offset(width, height),
            corner.offset(0.0, height),
        ]
    }

    /// Horizontal extents (left x, right x) of both supports in elevation.
    pub fn support_extents(&self) -> [(f64, f64); 2] {
        let p = self.config.params();
        let x0 = self.config.origin().x;
        let left_face = x0 + f64::from(p.support_left_mm);
        let right_face = left_face + f64::from(p.span_mm);
        [
            (x0, left_face),
            (right_face, right_face + f64::from(p.support_right_mm)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeamParameters;

    fn config() -> BeamConfiguration {
        BeamConfiguration::new(BeamParameters::example("B-1")).unwrap()
    }

    #[test]
    fn test_path_length_straight_segments() {
        let waypoints = vec![
            Waypoint::plain(0.0, 0.0),
            Waypoint::plain(300.0, 0.0),
            Waypoint::plain(300.0, 400.0),
        ];
        assert_eq!(path_length(&waypoints, 12, 90.0), 700);
    }

    #[test]
    fn test_path_length_replaces_segment_after_bend() {
        // The bend segment counts as a quarter circle of r = 30 mm (47.12),
        // not as the 42.43 mm chord.
        let waypoints = vec![
            Waypoint::plain(0.0, 0.0),
            Waypoint::bend(0.0, 100.0, bend_bulge(12)),
            Waypoint::plain(30.0, 130.0),
        ];
        assert_eq!(path_length(&waypoints, 12, 90.0), 147);
    }

    #[test]
    fn test_path_length_of_single_point_is_zero() {
        assert_eq!(path_length(&[Waypoint::plain(5.0, 5.0)], 8, 90.0), 0);
        assert_eq!(path_length(&[], 8, 90.0), 0);
    }

    #[test]
    fn test_top_bar_geometry() {
        let config = config();
        let top = BarPathBuilder::new(&config).top_bar(0.0);

        // 500 - 30 (cover) - 8 (stirrup) - 10 (half bar)
        assert_eq!(top.point(2).y, 452.0);
        assert_eq!(top.point(0), Point2::new(35.0, 25.0));
        assert_eq!(top.point(5), Point2::new(3910.0, 25.0));
        assert!(top.waypoints[1].is_bend());
        assert!(top.waypoints[3].is_bend());
        // 347 + 3715 + 347 + 2 * 40π
        assert_eq!(top.unrolled_length_mm(), 4660);
    }

    #[test]
    fn test_top_bar_is_symmetric_about_mid_length() {
        let mut params = BeamParameters::example("B-1");
        params.covers.view_right_mm = params.covers.view_left_mm;
        let config = BeamConfiguration::new(params).unwrap();
        let top = BarPathBuilder::new(&config).top_bar(0.0);
        let mid = f64::from(config.total_length_mm()) / 2.0;
        for (a, b) in [(0, 5), (1, 4), (2, 3)] {
            assert!((mid - top.point(a).x - (top.point(b).x - mid)).abs() < 1e-9);
            assert!((top.point(a).y - top.point(b).y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bottom_bar_geometry() {
        let config = config();
        let bottom = BarPathBuilder::new(&config).bottom_bar(-1200.0);
        assert_eq!(bottom.waypoints.len(), 2);
        // 25 + 8 + 6 above the shifted origin
        assert_eq!(bottom.point(0), Point2::new(25.0, -1161.0));
        assert_eq!(bottom.unrolled_length_mm(), 3895);
    }

    #[test]
    fn test_rectangular_stirrup_length() {
        let config = config();
        let hoop = BarPathBuilder::new(&config).rectangular_stirrup(Point2::default());
        assert_eq!(hoop.waypoints.len(), 12);
        assert_eq!(hoop.waypoints.iter().filter(|w| w.is_bend()).count(), 5);
        // straight 1218 + 5 quarter circles of r = 20
        assert_eq!(hoop.unrolled_length_mm(), 1375);
    }

    #[test]
    fn test_rectangular_stirrup_position_independent_length() {
        let config = config();
        let builder = BarPathBuilder::new(&config);
        let a = builder.rectangular_stirrup(Point2::default());
        let b = builder.rectangular_stirrup(Point2::new(4500.0, -300.0));
        assert_eq!(a.unrolled_length_mm(), b.unrolled_length_mm());
    }

    #[test]
    fn test_diagonal_stirrup_leg_stays_inside_section() {
        let config = config();
        let hoop = BarPathBuilder::new(&config).diagonal_stirrup(Point2::default());
        assert_eq!(hoop.waypoints.len(), 7);
        for w in &hoop.waypoints {
            let p = w.position();
            assert!(p.x > 0.0 && p.x < 250.0, "{p:?}");
            assert!(p.y > 0.0 && p.y < 500.0, "{p:?}");
        }
        // leg from the top-left corner has the inner width as its length
        let leg = hoop.point(4).distance_to(hoop.point(5));
        assert!((leg - 172.0).abs() < 1e-9);
    }

    #[test]
    fn test_stirrup_elevation_position() {
        let config = config();
        let leg = BarPathBuilder::new(&config).stirrup_elevation(7.5);
        assert_eq!(leg.point(0), Point2::new(257.5, 25.0));
        assert_eq!(leg.point(1), Point2::new(257.5, 470.0));
    }

    #[test]
    fn test_outline_and_supports() {
        let config = config();
        let builder = BarPathBuilder::new(&config);
        let outline = builder.beam_outline();
        assert_eq!(outline.len(), 6);
        assert_eq!(outline[3], Point2::new(3950.0, 0.0));
        assert_eq!(builder.support_extents(), [(0.0, 250.0), (3700.0, 3950.0)]);
    }
}
