//! # Drafting Geometry
//!
//! Points, waypoints, and bar paths shared by every drawing stage.
//!
//! - [`bend`] - Bend radius and arc bulge for 90° bar bends
//! - [`bar_path`] - Waypoint sequences for main bars, stirrups, and outlines

pub mod bar_path;
pub mod bend;

use serde::{Deserialize, Serialize};

pub use bar_path::{path_length, BarPathBuilder};
pub use bend::{bend_bulge, bend_radius, bulge_for_turn};

/// A 2D point in drawing units (millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Translate by a vector
    pub fn offset(&self, dx: f64, dy: f64) -> Point2 {
        Point2::new(self.x + dx, self.y + dy)
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Project a point by direction and distance.
///
/// `bearing_deg` is measured clockwise from north: 0° points up (12 o'clock),
/// 90° right (3 o'clock), 180° down, 270° left.
///
/// ```rust
/// use rebar_core::geometry::{point_position, Point2};
///
/// let p = point_position(Point2::new(0.0, 0.0), 10.0, 90.0);
/// assert!((p.x - 10.0).abs() < 1e-9);
/// assert!(p.y.abs() < 1e-9);
/// ```
pub fn point_position(origin: Point2, distance: f64, bearing_deg: f64) -> Point2 {
    let theta = std::f64::consts::FRAC_PI_2 - bearing_deg.to_radians();
    Point2::new(origin.x + distance * theta.cos(), origin.y + distance * theta.sin())
}

/// One vertex of a drawn bar path.
///
/// A `Bend` waypoint starts a rounded corner: the segment from it to the next
/// waypoint is drawn as an arc with the given bulge instead of a straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Waypoint {
    /// Straight segment to the next waypoint
    Plain { at: Point2 },
    /// Arc segment to the next waypoint
    Bend { at: Point2, bulge: f64 },
}

impl Waypoint {
    /// Plain waypoint at (x, y)
    pub fn plain(x: f64, y: f64) -> Self {
        Waypoint::Plain { at: Point2::new(x, y) }
    }

    /// Bend waypoint at (x, y)
    pub fn bend(x: f64, y: f64, bulge: f64) -> Self {
        Waypoint::Bend {
            at: Point2::new(x, y),
            bulge,
        }
    }

    /// Position of the waypoint
    pub fn position(&self) -> Point2 {
        match self {
            Waypoint::Plain { at } | Waypoint::Bend { at, .. } => *at,
        }
    }

    /// Bulge of the outgoing segment (0 for straight segments)
    pub fn bulge(&self) -> f64 {
        match self {
            Waypoint::Plain { .. } => 0.0,
            Waypoint::Bend { bulge, .. } => *bulge,
        }
    }

    pub fn is_bend(&self) -> bool {
        matches!(self, Waypoint::Bend { .. })
    }
}

impl From<Point2> for Waypoint {
    fn from(at: Point2) -> Self {
        Waypoint::Plain { at }
    }
}

/// What a bar path represents in the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarKind {
    /// Main bar along the top face, bent down at both supports
    TopMain,
    /// Straight main bar along the bottom face
    BottomMain,
    /// Rectangular hoop with bent corners and anchorage tails
    RectangularStirrup,
    /// Hoop closed by a diagonal anchoring leg
    DiagonalStirrup,
    /// Stirrup seen in elevation (a single vertical leg)
    StirrupElevation,
}

/// An immutable, ordered bar path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPath {
    pub kind: BarKind,
    /// Bar diameter in mm, also used as the drawn line width
    pub diameter_mm: u32,
    pub waypoints: Vec<Waypoint>,
}

impl BarPath {
    pub fn new(kind: BarKind, diameter_mm: u32, waypoints: Vec<Waypoint>) -> Self {
        BarPath {
            kind,
            diameter_mm,
            waypoints,
        }
    }

    /// Unrolled length in whole millimetres, using 90° bends
    pub fn unrolled_length_mm(&self) -> u32 {
        path_length(&self.waypoints, self.diameter_mm, 90.0)
    }

    /// Position of the waypoint at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn point(&self, index: usize) -> Point2 {
        self.waypoints[index].position()
    }

    pub fn first(&self) -> Option<Point2> {
        self.waypoints.first().map(Waypoint::position)
    }

    pub fn last(&self) -> Option<Point2> {
        self.waypoints.last().map(Waypoint::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_position_bearings() {
        let origin = Point2::new(10.0, 10.0);

        let north = point_position(origin, 5.0, 0.0);
        assert!((north.x - 10.0).abs() < 1e-9);
        assert!((north.y - 15.0).abs() < 1e-9);

        let south = point_position(origin, 5.0, 180.0);
        assert!((south.y - 5.0).abs() < 1e-9);

        let west = point_position(origin, 5.0, 270.0);
        assert!((west.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_position_diagonal() {
        let p = point_position(Point2::default(), 2.0, 60.0);
        assert!((p.x - 3f64.sqrt()).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_waypoint_accessors() {
        let plain = Waypoint::plain(1.0, 2.0);
        let bend = Waypoint::bend(3.0, 4.0, -0.5);
        assert!(!plain.is_bend());
        assert!(bend.is_bend());
        assert_eq!(plain.bulge(), 0.0);
        assert_eq!(bend.bulge(), -0.5);
        assert_eq!(bend.position(), Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_waypoint_serialization_is_tagged() {
        let json = serde_json::to_string(&Waypoint::bend(0.0, 1.0, -0.4)).unwrap();
        assert!(json.contains("\"kind\":\"Bend\""));
        let roundtrip: Waypoint = serde_json::from_str(&json).unwrap();
        assert!(roundtrip.is_bend());
    }

    #[test]
    fn test_distance_and_midpoint() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(a.midpoint(b), Point2::new(1.5, 2.0));
    }
}
