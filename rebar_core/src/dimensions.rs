//! # Dimension Chain Selector
//!
//! Turns the breakpoints of a [`StirrupLayout`] into the dimension segments
//! drawn below the span: brackets for the end margins and one
//! `N x spacing = <>` call-out per stirrup zone.
//!
//! The layout is classified into a closed set of [`SpacingPattern`]s by the
//! number of breakpoints and which first-row zones are enabled. A combination
//! outside that set is an error, reported before anything is drawn.
//!
//! ## Secondary count adjustment
//!
//! The allocator counts secondary spacings from the support face
//! (`ceil(length/s)`). When a margin sits between the face and the zone, that
//! count includes one spacing too many, so the margin patterns that end the
//! secondary zone at a margin subtract one. After adjustment every call-out
//! satisfies `N × spacing = to − from`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DraftError, DraftResult};
use crate::spacing::StirrupLayout;

/// Shape of the stirrup dimension chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpacingPattern {
    /// Secondary zone across the whole span
    Uniform,
    /// Left first-row zone from the support face, then secondary
    LeftZoneFlush,
    /// Secondary, then right first-row zone up to the support face
    RightZoneFlush,
    /// Secondary zone with a margin at both ends
    UniformWithMargin,
    /// Both first-row zones flush with the support faces
    BothZonesFlush,
    /// Margin, left first-row zone, secondary, margin
    LeftZoneWithMargin,
    /// Margin, secondary, right first-row zone, margin
    RightZoneWithMargin,
    /// Margin, left zone, secondary, right zone, margin
    BothZonesWithMargin,
}

impl SpacingPattern {
    /// Classify a layout by breakpoint count and enabled zones.
    pub fn classify(point_count: usize, left_zone: bool, right_zone: bool) -> Option<Self> {
        use SpacingPattern::*;
        match (point_count, left_zone, right_zone) {
            (2, false, false) => Some(Uniform),
            (3, true, false) => Some(LeftZoneFlush),
            (3, false, true) => Some(RightZoneFlush),
            (4, false, false) => Some(UniformWithMargin),
            (4, true, true) => Some(BothZonesFlush),
            (5, true, false) => Some(LeftZoneWithMargin),
            (5, false, true) => Some(RightZoneWithMargin),
            (6, true, true) => Some(BothZonesWithMargin),
            _ => None,
        }
    }

    /// Whether the chain starts and ends with margin brackets
    pub fn has_margin(&self) -> bool {
        matches!(
            self,
            SpacingPattern::UniformWithMargin
                | SpacingPattern::LeftZoneWithMargin
                | SpacingPattern::RightZoneWithMargin
                | SpacingPattern::BothZonesWithMargin
        )
    }

    /// Spacings to subtract from the allocator's secondary count
    pub fn secondary_adjustment(&self) -> u32 {
        match self {
            SpacingPattern::UniformWithMargin
            | SpacingPattern::LeftZoneWithMargin
            | SpacingPattern::RightZoneWithMargin => 1,
            _ => 0,
        }
    }
}

/// What a dimension segment measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentRole {
    /// Margin between a support face and the first stirrup
    Margin,
    LeftZone,
    Secondary,
    RightZone,
}

/// Repeated spacing annotated on a call-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    pub count: u32,
    pub spacing_mm: u32,
}

impl fmt::Display for Repeat {
    /// `<>` stands for the measured value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} = <>", self.count, self.spacing_mm)
    }
}

/// One segment of the chain, offsets measured from the left support face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSegment {
    pub role: SegmentRole,
    pub from_mm: f64,
    pub to_mm: f64,
    /// Set on call-outs, `None` on margin brackets
    pub repeat: Option<Repeat>,
}

impl DimensionSegment {
    pub fn length_mm(&self) -> f64 {
        self.to_mm - self.from_mm
    }

    /// Text replacing the measured value, if any
    pub fn override_text(&self) -> Option<String> {
        self.repeat.map(|r| r.to_string())
    }
}

/// Selected pattern and its segments, ordered left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionChain {
    pub pattern: SpacingPattern,
    pub segments: Vec<DimensionSegment>,
}

impl DimensionChain {
    /// Margin brackets
    pub fn brackets(&self) -> impl Iterator<Item = &DimensionSegment> {
        self.segments.iter().filter(|s| s.repeat.is_none())
    }

    /// Spacing call-outs
    pub fn callouts(&self) -> impl Iterator<Item = &DimensionSegment> {
        self.segments.iter().filter(|s| s.repeat.is_some())
    }
}

/// Select the dimension chain for a stirrup layout.
pub fn select(layout: &StirrupLayout) -> DraftResult<DimensionChain> {
    let left = layout.left_zone.is_enabled();
    let right = layout.right_zone.is_enabled();
    let points = &layout.dimension_points;

    let pattern = SpacingPattern::classify(points.len(), left, right)
        .ok_or_else(|| DraftError::unhandled_pattern(points, left, right))?;
    log::debug!("dimension chain {:?} for breakpoints {:?}", pattern, points);

    let span = f64::from(layout.span_mm);
    let (start, end) = if pattern.has_margin() {
        (layout.half_margin(), span - layout.half_margin())
    } else {
        (0.0, span)
    };

    let mut segments = Vec::new();
    if pattern.has_margin() {
        segments.push(bracket(0.0, start));
    }

    if let Some(last_left) = layout.last_left {
        segments.push(DimensionSegment {
            role: SegmentRole::LeftZone,
            from_mm: start,
            to_mm: last_left,
            repeat: Some(Repeat {
                count: layout.left_zone.intervals(),
                spacing_mm: layout.left_zone.spacing_mm,
            }),
        });
    }

    let secondary = layout
        .secondary_count
        .saturating_sub(pattern.secondary_adjustment());
    if secondary > 0 {
        segments.push(DimensionSegment {
            role: SegmentRole::Secondary,
            from_mm: layout.last_left.unwrap_or(start),
            to_mm: layout.last_right.unwrap_or(end),
            repeat: Some(Repeat {
                count: secondary,
                spacing_mm: layout.secondary_spacing_mm,
            }),
        });
    }

    if let Some(last_right) = layout.last_right {
        segments.push(DimensionSegment {
            role: SegmentRole::RightZone,
            from_mm: last_right,
            to_mm: end,
            repeat: Some(Repeat {
                count: layout.right_zone.intervals(),
                spacing_mm: layout.right_zone.spacing_mm,
            }),
        });
    }

    if pattern.has_margin() {
        segments.push(bracket(end, span));
    }

    Ok(DimensionChain { pattern, segments })
}

fn bracket(from_mm: f64, to_mm: f64) -> DimensionSegment {
    DimensionSegment {
        role: SegmentRole::Margin,
        from_mm,
        to_mm,
        repeat: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FirstRowZone;
    use crate::spacing::allocate_span;

    fn assert_callouts_consistent(chain: &DimensionChain) {
        for segment in chain.callouts() {
            let repeat = segment.repeat.unwrap();
            let annotated = f64::from(repeat.count * repeat.spacing_mm);
            assert!(
                (annotated - segment.length_mm()).abs() < 1e-9,
                "{:?}: {} != {}",
                chain.pattern,
                annotated,
                segment.length_mm()
            );
        }
    }

    fn assert_chain_covers_span(chain: &DimensionChain, span: f64) {
        let first = chain.segments.first().unwrap();
        let last = chain.segments.last().unwrap();
        assert_eq!(first.from_mm, 0.0);
        assert_eq!(last.to_mm, span);
        for pair in chain.segments.windows(2) {
            assert_eq!(pair[0].to_mm, pair[1].from_mm);
        }
    }

    #[test]
    fn test_classification_table() {
        use SpacingPattern::*;
        assert_eq!(SpacingPattern::classify(2, false, false), Some(Uniform));
        assert_eq!(SpacingPattern::classify(3, true, false), Some(LeftZoneFlush));
        assert_eq!(SpacingPattern::classify(3, false, true), Some(RightZoneFlush));
        assert_eq!(SpacingPattern::classify(4, false, false), Some(UniformWithMargin));
        assert_eq!(SpacingPattern::classify(4, true, true), Some(BothZonesFlush));
        assert_eq!(SpacingPattern::classify(5, true, false), Some(LeftZoneWithMargin));
        assert_eq!(SpacingPattern::classify(5, false, true), Some(RightZoneWithMargin));
        assert_eq!(SpacingPattern::classify(6, true, true), Some(BothZonesWithMargin));

        assert_eq!(SpacingPattern::classify(3, true, true), None);
        assert_eq!(SpacingPattern::classify(4, true, false), None);
        assert_eq!(SpacingPattern::classify(6, false, false), None);
    }

    #[test]
    fn test_uniform_with_margin_has_single_callout() {
        let layout = allocate_span(3000, FirstRowZone::disabled(), FirstRowZone::disabled(), 335).unwrap();
        let chain = select(&layout).unwrap();

        assert_eq!(chain.pattern, SpacingPattern::UniformWithMargin);
        assert_eq!(chain.brackets().count(), 2);
        let callouts: Vec<_> = chain.callouts().collect();
        assert_eq!(callouts.len(), 1);
        assert_eq!(callouts[0].override_text().as_deref(), Some("9 x 330 = <>"));
        assert_eq!((callouts[0].from_mm, callouts[0].to_mm), (15.0, 2985.0));
        assert_chain_covers_span(&chain, 3000.0);
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
        let chain = select(&layout).unwrap();

        assert_eq!(chain.pattern, SpacingPattern::BothZonesWithMargin);
        assert_eq!(chain.brackets().count(), 2);
        let texts: Vec<String> = chain.callouts().filter_map(|s| s.override_text()).collect();
        assert_eq!(texts, vec!["4 x 250 = <>", "4 x 265 = <>", "11 x 125 = <>"]);
        assert_callouts_consistent(&chain);
        assert_chain_covers_span(&chain, 3450.0);
    }

    #[test]
    fn test_flush_patterns_have_no_brackets() {
        let layout = allocate_span(3000, FirstRowZone::new(1000, 200), FirstRowZone::disabled(), 250).unwrap();
        let chain = select(&layout).unwrap();
        assert_eq!(chain.pattern, SpacingPattern::LeftZoneFlush);
        assert_eq!(chain.brackets().count(), 0);
        assert_eq!(chain.segments.len(), 2);
        assert_callouts_consistent(&chain);
        assert_chain_covers_span(&chain, 3000.0);
    }

    #[test]
    fn test_uniform_exact_fit() {
        let layout = allocate_span(3000, FirstRowZone::disabled(), FirstRowZone::disabled(), 300).unwrap();
        let chain = select(&layout).unwrap();
        assert_eq!(chain.pattern, SpacingPattern::Uniform);
        assert_eq!(chain.segments.len(), 1);
        assert_eq!(chain.segments[0].override_text().as_deref(), Some("10 x 300 = <>"));
    }

    #[test]
    fn test_callouts_consistent_across_inputs() {
        let zones = [
            FirstRowZone::disabled(),
            FirstRowZone::new(600, 100),
            FirstRowZone::new(750, 150),
            FirstRowZone::new(1000, 250),
        ];
        for span in (3000..=7000).step_by(45) {
            for left in zones {
                for right in zones {
                    let layout = allocate_span(span, left, right, 335).unwrap();
                    if let Ok(chain) = select(&layout) {
                        assert_callouts_consistent(&chain);
                        assert_chain_covers_span(&chain, f64::from(span));
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_pattern_reachable() {
        let none = FirstRowZone::disabled();
        let zone = FirstRowZone::new(1000, 200);
        let short = FirstRowZone::new(500, 100);
        let cases = [
            (3000, none, none, SpacingPattern::Uniform, 1),
            (3000, zone, none, SpacingPattern::LeftZoneFlush, 2),
            (3000, none, zone, SpacingPattern::RightZoneFlush, 2),
            (3010, none, none, SpacingPattern::UniformWithMargin, 3),
            (3000, short, short, SpacingPattern::BothZonesFlush, 3),
            (3010, zone, none, SpacingPattern::LeftZoneWithMargin, 4),
            (3010, none, zone, SpacingPattern::RightZoneWithMargin, 4),
            (3010, short, short, SpacingPattern::BothZonesWithMargin, 5),
        ];
        for (span, left, right, pattern, segments) in cases {
            let layout = allocate_span(span, left, right, 250).unwrap();
            let chain = select(&layout).unwrap();
            assert_eq!(chain.pattern, pattern, "span {span}");
            assert_eq!(chain.segments.len(), segments, "{pattern:?}");
            assert_callouts_consistent(&chain);
            assert_chain_covers_span(&chain, f64::from(span));
        }
    }

    #[test]
    fn test_unhandled_pattern() {
        let layout = allocate_span(
            2000,
            FirstRowZone::new(1000, 250),
            FirstRowZone::new(970, 250),
            335,
        )
        .unwrap();
        let err = select(&layout).unwrap_err();
        match err {
            DraftError::UnhandledSpacingPattern {
                points,
                left_zone,
                right_zone,
            } => {
                assert_eq!(points, vec![0.0, 1000.0, 2000.0]);
                assert!(left_zone && right_zone);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
