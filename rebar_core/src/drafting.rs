//! # Drafting Run
//!
//! One engine run per beam element. The run computes a complete
//! [`DrawingPlan`] first (every layer, style and primitive), and only then
//! hands it to a [`DrawingSink`]. A failure while planning, such as an
//! unhandled stirrup pattern, therefore leaves the sink untouched.
//!
//! ## Drawing Layout
//!
//! - Elevation at the configuration origin: outline, main bars, stirrup legs,
//!   hatched supports with hidden base lines, overall and stirrup dimensions
//! - Bar details below the elevation, labelled with their segment lengths
//! - Cross-section to the right of the elevation, then the stirrup detail
//! - Bending schedule to the left of the elevation
//!
//! Layer, style and page names are derived from the element name, so several
//! elements can share one sink as long as their names differ.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::config::{BeamConfiguration, BeamParameters};
//! use rebar_core::drafting::{draw, DraftingSettings};
//! use rebar_core::sink::recording::RecordingSink;
//!
//! let config = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
//! let mut sink = RecordingSink::new();
//! let report = draw(&config, &DraftingSettings::default(), &mut sink).unwrap();
//!
//! assert_eq!(report.bill.len(), 3);
//! assert!(sink.tables.layers.iter().any(|l| l.name == "B-1-Stirrups"));
//! ```

use serde::{Deserialize, Serialize};

use crate::bill::SteelBill;
use crate::config::BeamConfiguration;
use crate::dimensions::{self, DimensionChain};
use crate::errors::DraftResult;
use crate::geometry::{BarPath, BarPathBuilder, Point2, Waypoint};
use crate::schedule::{BendingScheduleTable, ScheduleOptions};
use crate::sink::{
    DimStyleId, DimensionStyleOptions, DrawingSink, Handle, LayerId, LineStyle, LinearDimension, PageSetup, TextCell,
    TextStyleId,
};
use crate::spacing::{self, StirrupLayout};

/// Drawing layers of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerRole {
    Outline,
    Bars,
    Stirrups,
    Hatch,
    Dimensions,
    Hidden,
}

impl LayerRole {
    pub const ALL: [LayerRole; 6] = [
        LayerRole::Outline,
        LayerRole::Bars,
        LayerRole::Stirrups,
        LayerRole::Hatch,
        LayerRole::Dimensions,
        LayerRole::Hidden,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            LayerRole::Outline => "Outline",
            LayerRole::Bars => "Bars",
            LayerRole::Stirrups => "Stirrups",
            LayerRole::Hatch => "Hatch",
            LayerRole::Dimensions => "Dimensions",
            LayerRole::Hidden => "Hidden",
        }
    }

    /// AutoCAD colour index
    pub fn color(&self) -> u8 {
        match self {
            LayerRole::Outline => 3,
            LayerRole::Bars => 1,
            LayerRole::Stirrups => 6,
            LayerRole::Hatch => 7,
            LayerRole::Dimensions => 4,
            LayerRole::Hidden => 8,
        }
    }

    pub fn line_style(&self) -> Option<LineStyle> {
        match self {
            LayerRole::Hidden => Some(LineStyle::Dashed),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Which dimension style a dimension uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimRole {
    /// Oblique ticks, extension lines
    Architectural,
    /// Text only, for bar segment lengths
    BarLabel,
}

/// Shape of the stirrup drawn in the cross-section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StirrupStyle {
    #[default]
    Rectangular,
    Diagonal,
}

/// Drawing conventions shared by every element of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingSettings {
    /// Paper size (width, height) in mm
    pub page_size_mm: (f64, f64),
    pub page_margins_mm: [f64; 4],
    pub page_scale: f64,
    /// Scale of dimension and table text
    pub dimension_scale: f64,
    pub font: String,
    /// Gap between elevation, cross-section and stirrup detail
    pub section_gap_mm: f64,
    pub support_height_mm: f64,
    /// Overrun of the hidden support base line past each support edge
    pub hidden_overrun_mm: f64,
    /// Distance of the overall dimension line below the soffit
    pub main_dimension_offset_mm: f64,
    /// Distance of the stirrup dimension line below the soffit
    pub stirrup_dimension_offset_mm: f64,
    /// Distance of the height dimension line left of the element origin
    pub height_dimension_offset_mm: f64,
    pub stirrup_style: StirrupStyle,
    pub hatch_pattern: String,
    pub hatch_scale: f64,
    /// Top-left corner of the schedule relative to the element origin
    pub schedule_offset: Point2,
    pub schedule_remarks: bool,
}

impl Default for DraftingSettings {
    fn default() -> Self {
        DraftingSettings {
            page_size_mm: (420.0, 297.0),
            page_margins_mm: [0.5; 4],
            page_scale: 50.0,
            dimension_scale: 20.0,
            font: "Arial.ttf".to_string(),
            section_gap_mm: 500.0,
            support_height_mm: 200.0,
            hidden_overrun_mm: 200.0,
            main_dimension_offset_mm: 400.0,
            stirrup_dimension_offset_mm: 300.0,
            height_dimension_offset_mm: 200.0,
            stirrup_style: StirrupStyle::Rectangular,
            hatch_pattern: "ANSI33".to_string(),
            hatch_scale: 20.0,
            schedule_offset: Point2::new(-5000.0, 0.0),
            schedule_remarks: false,
        }
    }
}

/// Names of every sink definition made for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePlan {
    pub element: String,
    pub text_style: String,
    pub dimension_style: String,
    pub bar_label_style: String,
    pub page: String,
}

impl StylePlan {
    pub fn for_element(name: &str, settings: &DraftingSettings) -> Self {
        let scale = settings.dimension_scale;
        StylePlan {
            element: name.to_string(),
            text_style: format!("{name}-Text"),
            dimension_style: format!("{name}_1_{scale}"),
            bar_label_style: format!("{name}_BAR_1_{scale}"),
            page: name.to_string(),
        }
    }

    pub fn layer_name(&self, role: LayerRole) -> String {
        format!("{}-{}", self.element, role.suffix())
    }

    /// Every name this plan defines, paired with the sink table it goes into.
    pub fn definitions(&self) -> Vec<(&'static str, String)> {
        let mut names: Vec<(&'static str, String)> =
            LayerRole::ALL.iter().map(|role| ("layer", self.layer_name(*role))).collect();
        names.push(("text style", self.text_style.clone()));
        names.push(("dimension style", self.dimension_style.clone()));
        names.push(("dimension style", self.bar_label_style.clone()));
        names.push(("page", self.page.clone()));
        names
    }
}

/// Sink ids resolved from a [`StylePlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingStyles {
    layers: [LayerId; 6],
    pub text: TextStyleId,
    pub dimension: DimStyleId,
    pub bar_label: DimStyleId,
}

impl DrawingStyles {
    pub fn layer(&self, role: LayerRole) -> LayerId {
        self.layers[role.index()]
    }

    fn dim_style(&self, role: DimRole) -> DimStyleId {
        match role {
            DimRole::Architectural => self.dimension,
            DimRole::BarLabel => self.bar_label,
        }
    }
}

/// One planned drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "primitive")]
pub enum Primitive {
    Polyline {
        points: Vec<Waypoint>,
        closed: bool,
        width: f64,
        layer: LayerRole,
    },
    Hatch {
        paths: Vec<Vec<Point2>>,
        layer: LayerRole,
    },
    Dimension {
        dimension: LinearDimension,
        style: DimRole,
    },
    Text {
        cell: TextCell,
        layer: LayerRole,
    },
}

/// Everything one element contributes to a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingPlan {
    pub styles: StylePlan,
    pub settings: DraftingSettings,
    pub primitives: Vec<Primitive>,
}

impl DrawingPlan {
    /// Define the element's layers, styles and page in `sink`.
    pub fn define_styles(&self, sink: &mut dyn DrawingSink) -> DraftResult<DrawingStyles> {
        let mut layers = [LayerId(0); 6];
        for role in LayerRole::ALL {
            layers[role.index()] = sink.define_layer(&self.styles.layer_name(role), role.color(), role.line_style())?;
        }

        let scale = self.settings.dimension_scale;
        let text = sink.define_text_style(&self.styles.text_style, &self.settings.font)?;
        let dimension = sink.define_dimension_style(
            &self.styles.dimension_style,
            &DimensionStyleOptions::architectural(&self.styles.text_style, scale),
        )?;
        let bar_label = sink.define_dimension_style(
            &self.styles.bar_label_style,
            &DimensionStyleOptions::bar_label(&self.styles.text_style, scale),
        )?;

        sink.define_page(&PageSetup {
            name: self.styles.page.clone(),
            size_mm: self.settings.page_size_mm,
            margins_mm: self.settings.page_margins_mm,
            scale: self.settings.page_scale,
        })?;

        Ok(DrawingStyles {
            layers,
            text,
            dimension,
            bar_label,
        })
    }

    /// Define styles, then add every primitive in plan order.
    pub fn emit(&self, sink: &mut dyn DrawingSink) -> DraftResult<Vec<Handle>> {
        let styles = self.define_styles(sink)?;
        let mut handles = Vec::with_capacity(self.primitives.len());

        for primitive in &self.primitives {
            let handle = match primitive {
                Primitive::Polyline {
                    points,
                    closed,
                    width,
                    layer,
                } => sink.add_polyline(points, *closed, *width, styles.layer(*layer))?,
                Primitive::Hatch { paths, layer } => sink.add_hatched_region(
                    paths,
                    &self.settings.hatch_pattern,
                    self.settings.hatch_scale,
                    styles.layer(*layer),
                )?,
                Primitive::Dimension { dimension, style } => sink.add_linear_dimension(
                    dimension,
                    styles.dim_style(*style),
                    styles.layer(LayerRole::Dimensions),
                )?,
                Primitive::Text { cell, layer } => sink.add_text_cell(cell, styles.text, styles.layer(*layer))?,
            };
            handles.push(handle);
        }
        Ok(handles)
    }

    pub fn count(&self, predicate: impl Fn(&Primitive) -> bool) -> usize {
        self.primitives.iter().filter(|p| predicate(p)).count()
    }
}

/// Computed results of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingReport {
    pub element: String,
    pub layout: StirrupLayout,
    pub chain: DimensionChain,
    pub bill: SteelBill,
    pub schedule: BendingScheduleTable,
    pub primitive_count: usize,
}

/// Planned drawing plus the results it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDrawing {
    pub plan: DrawingPlan,
    pub report: DrawingReport,
}

/// Compute the complete drawing of one element without touching a sink.
pub fn plan(config: &BeamConfiguration, settings: &DraftingSettings) -> DraftResult<PlannedDrawing> {
    let layout = spacing::allocate(config)?;
    let chain = dimensions::select(&layout)?;

    let mut planner = Planner {
        config,
        settings,
        builder: BarPathBuilder::new(config),
        primitives: Vec::new(),
        bill: SteelBill::new(),
    };
    planner.elevation(&layout, &chain);
    planner.bar_details();
    planner.cross_section(layout.stirrup_count());
    let schedule = planner.schedule();

    let primitive_count = planner.primitives.len();
    let Planner { primitives, bill, .. } = planner;

    Ok(PlannedDrawing {
        plan: DrawingPlan {
            styles: StylePlan::for_element(config.name(), settings),
            settings: settings.clone(),
            primitives,
        },
        report: DrawingReport {
            element: config.name().to_string(),
            layout,
            chain,
            bill,
            schedule,
            primitive_count,
        },
    })
}

/// Plan one element and emit it into `sink`.
pub fn draw(
    config: &BeamConfiguration,
    settings: &DraftingSettings,
    sink: &mut dyn DrawingSink,
) -> DraftResult<DrawingReport> {
    let PlannedDrawing { plan, report } = plan(config, settings)?;
    plan.emit(sink)?;
    log::info!(
        "{}: {} stirrups at {} mm, {} bill entries, {} primitives",
        report.element,
        report.layout.stirrup_count(),
        report.layout.secondary_spacing_mm,
        report.bill.len(),
        report.primitive_count
    );
    Ok(report)
}

struct Planner<'a> {
    config: &'a BeamConfiguration,
    settings: &'a DraftingSettings,
    builder: BarPathBuilder<'a>,
    primitives: Vec<Primitive>,
    bill: SteelBill,
}

impl<'a> Planner<'a> {
    fn polyline(&mut self, points: Vec<Waypoint>, closed: bool, width: f64, layer: LayerRole) {
        self.primitives.push(Primitive::Polyline {
            points,
            closed,
            width,
            layer,
        });
    }

    fn outline(&mut self, points: &[Point2], closed: bool, layer: LayerRole) {
        self.polyline(points.iter().copied().map(Waypoint::from).collect(), closed, 0.0, layer);
    }

    fn bar(&mut self, path: &BarPath, layer: LayerRole) {
        self.polyline(path.waypoints.clone(), false, f64::from(path.diameter_mm), layer);
    }

    fn dimension(&mut self, dimension: LinearDimension, style: DimRole) {
        self.primitives.push(Primitive::Dimension { dimension, style });
    }

    fn elevation(&mut self, layout: &StirrupLayout, chain: &DimensionChain) {
        let p = self.config.params();
        let o = self.config.origin();

        let outline = self.builder.beam_outline();
        self.outline(&outline, true, LayerRole::Outline);
        let bottom = self.builder.bottom_bar(0.0);
        self.bar(&bottom, LayerRole::Bars);
        let top = self.builder.top_bar(0.0);
        self.bar(&top, LayerRole::Bars);

        for offset in &layout.offsets {
            let leg = self.builder.stirrup_elevation(*offset);
            self.bar(&leg, LayerRole::Stirrups);
        }

        let base_y = o.y - self.settings.support_height_mm;
        for (left, right) in self.builder.support_extents() {
            let block = vec![
                Point2::new(left, o.y),
                Point2::new(left, base_y),
                Point2::new(right, base_y),
                Point2::new(right, o.y),
            ];
            self.primitives.push(Primitive::Hatch {
                paths: vec![block],
                layer: LayerRole::Hatch,
            });
            for x in [left, right] {
                self.outline(&[Point2::new(x, o.y), Point2::new(x, base_y)], false, LayerRole::Outline);
            }
            let overrun = self.settings.hidden_overrun_mm;
            self.outline(
                &[Point2::new(left - overrun, base_y), Point2::new(right + overrun, base_y)],
                false,
                LayerRole::Hidden,
            );
        }

        // Supports and span on one line, then the height
        let main_y = o.y - self.settings.main_dimension_offset_mm;
        let base = Point2::new(o.x, main_y);
        let sl = f64::from(p.support_left_mm);
        let span = f64::from(p.span_mm);
        let total = f64::from(self.config.total_length_mm());
        for (from, to) in [(0.0, sl), (sl, sl + span), (sl + span, total)] {
            self.dimension(
                LinearDimension::horizontal(base, Point2::new(o.x + from, main_y), Point2::new(o.x + to, main_y)),
                DimRole::Architectural,
            );
        }
        self.dimension(
            LinearDimension::vertical(
                Point2::new(o.x - self.settings.height_dimension_offset_mm, o.y),
                o,
                o.offset(0.0, f64::from(p.height_mm)),
            ),
            DimRole::Architectural,
        );

        let stirrup_y = o.y - self.settings.stirrup_dimension_offset_mm;
        let base = Point2::new(o.x, stirrup_y);
        for segment in &chain.segments {
            let mut dimension = LinearDimension::horizontal(
                base,
                Point2::new(o.x + sl + segment.from_mm, stirrup_y),
                Point2::new(o.x + sl + segment.to_mm, stirrup_y),
            );
            dimension.text = segment.override_text();
            self.dimension(dimension, DimRole::Architectural);
        }
    }

    /// Main bars drawn apart from the elevation with segment labels; records
    /// both in the bill.
    fn bar_details(&mut self) {
        let p = self.config.params();
        let h = f64::from(p.height_mm);
        let name = self.config.name().to_string();

        let top = self.builder.top_bar(-2.0 * h - 300.0);
        self.bar(&top, LayerRole::Bars);
        self.bill.record(
            name.as_str(),
            top.diameter_mm,
            p.top_bar_count,
            top.unrolled_length_mm(),
            p.main_grade.clone(),
        );
        let half = 0.5 * f64::from(top.diameter_mm);
        let pt: Vec<Point2> = top.waypoints.iter().map(Waypoint::position).collect();
        self.dimension(
            LinearDimension::vertical(pt[0].offset(-25.0, 0.0), pt[0], pt[2].offset(0.0, half)),
            DimRole::BarLabel,
        );
        self.dimension(
            LinearDimension::horizontal(pt[3].offset(0.0, -100.0), pt[1].offset(-half, 0.0), pt[4].offset(half, 0.0)),
            DimRole::BarLabel,
        );
        self.dimension(
            LinearDimension::vertical(pt[5].offset(100.0, 0.0), pt[3].offset(0.0, half), pt[5]),
            DimRole::BarLabel,
        );

        let bottom = self.builder.bottom_bar(-2.0 * h - 500.0);
        self.bar(&bottom, LayerRole::Bars);
        self.bill.record(
            name.as_str(),
            bottom.diameter_mm,
            p.bottom_bar_count,
            bottom.unrolled_length_mm(),
            p.main_grade.clone(),
        );
        let (start, end) = (bottom.point(0), bottom.point(1));
        self.dimension(
            LinearDimension::horizontal(start.offset(0.0, -100.0), start, end),
            DimRole::BarLabel,
        );
    }

    /// Cross-section with its stirrup, and the labelled stirrup detail.
    fn cross_section(&mut self, stirrup_count: usize) {
        let p = self.config.params();
        let o = self.config.origin();
        let gap = self.settings.section_gap_mm;
        let width = f64::from(p.width_mm);

        let corner = o.offset(f64::from(self.config.total_length_mm()) + gap, 0.0);
        let section = self.builder.section_outline(corner);
        self.outline(&section, true, LayerRole::Outline);
        let stirrup = self.stirrup(corner);
        self.bar(&stirrup, LayerRole::Bars);
        self.bill.record(
            self.config.name(),
            stirrup.diameter_mm,
            stirrup_count as u32,
            stirrup.unrolled_length_mm(),
            p.stirrup_grade.clone(),
        );

        let detail = corner.offset(width + gap, 0.0);
        let stirrup = self.stirrup(detail);
        self.bar(&stirrup, LayerRole::Bars);

        let (cover_left, cover_right) = (f64::from(p.covers.left_mm), f64::from(p.covers.right_mm));
        let (cover_bottom, cover_top) = (f64::from(p.covers.bottom_mm), f64::from(p.covers.top_mm));
        self.dimension(
            LinearDimension::horizontal(
                detail.offset(0.0, -50.0),
                detail.offset(cover_left, cover_bottom),
                detail.offset(width - cover_right, cover_bottom),
            ),
            DimRole::BarLabel,
        );
        self.dimension(
            LinearDimension::vertical(
                detail.offset(cover_left - 25.0, 0.0),
                detail.offset(cover_left, cover_bottom),
                detail.offset(cover_left, f64::from(p.height_mm) - cover_top),
            ),
            DimRole::BarLabel,
        );
    }

    fn stirrup(&self, corner: Point2) -> BarPath {
        match self.settings.stirrup_style {
            StirrupStyle::Rectangular => self.builder.rectangular_stirrup(corner),
            StirrupStyle::Diagonal => self.builder.diagonal_stirrup(corner),
        }
    }

    fn schedule(&mut self) -> BendingScheduleTable {
        let scale = self.settings.dimension_scale;
        let origin = self
            .config
            .origin()
            .offset(self.settings.schedule_offset.x, self.settings.schedule_offset.y);
        let mut options = ScheduleOptions::new(
            format!("Bending schedule {}", self.config.name()),
            origin,
            scale,
            self.config.element_count(),
        );
        options.remarks = self.settings.schedule_remarks;

        let table = BendingScheduleTable::build(&self.bill, &options);
        for cell in &table.cells {
            self.outline(&cell.outline(), true, LayerRole::Outline);
            if let Some(text) = cell.text_cell(scale) {
                self.primitives.push(Primitive::Text {
                    cell: text,
                    layer: LayerRole::Outline,
                });
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::SteelGrade;
    use crate::config::{BeamParameters, FirstRowZone};
    use crate::dimensions::SpacingPattern;
    use crate::sink::recording::{RecordedEntity, RecordingSink};

    fn config(name: &str) -> BeamConfiguration {
        BeamConfiguration::new(BeamParameters::example(name)).unwrap()
    }

    fn zoned(name: &str) -> BeamConfiguration {
        let mut params = BeamParameters::example(name);
        params.first_row_left = FirstRowZone::new(1000, 250);
        params.first_row_right = FirstRowZone::new(1350, 125);
        BeamConfiguration::new(params).unwrap()
    }

    #[test]
    fn test_style_names() {
        let styles = StylePlan::for_element("B-1", &DraftingSettings::default());
        assert_eq!(styles.layer_name(LayerRole::Outline), "B-1-Outline");
        assert_eq!(styles.layer_name(LayerRole::Hidden), "B-1-Hidden");
        assert_eq!(styles.text_style, "B-1-Text");
        assert_eq!(styles.dimension_style, "B-1_1_20");
        assert_eq!(styles.bar_label_style, "B-1_BAR_1_20");

        let definitions = styles.definitions();
        assert_eq!(definitions.len(), 10);
        assert!(definitions.contains(&("dimension style", "B-1_BAR_1_20".to_string())));
        assert!(definitions.contains(&("page", "B-1".to_string())));
    }

    #[test]
    fn test_height_dimension_offset_setting() {
        let settings = DraftingSettings {
            height_dimension_offset_mm: 350.0,
            ..DraftingSettings::default()
        };
        let planned = plan(&config("B-1"), &settings).unwrap();
        let heights: Vec<&LinearDimension> = planned
            .plan
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Dimension {
                    dimension,
                    style: DimRole::Architectural,
                } if dimension.angle_deg == 90.0 => Some(dimension),
                _ => None,
            })
            .collect();
        assert_eq!(heights.len(), 1);
        assert_eq!(heights[0].base, Point2::new(-350.0, 0.0));
        assert!((heights[0].measurement() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_definitions() {
        let mut sink = RecordingSink::new();
        draw(&config("B-1"), &DraftingSettings::default(), &mut sink).unwrap();

        assert_eq!(sink.tables.layers.len(), 6);
        let hidden = sink.tables.layers.iter().find(|l| l.name == "B-1-Hidden").unwrap();
        assert_eq!(hidden.line_style, LineStyle::Dashed);
        assert_eq!(hidden.color, 8);
        assert_eq!(sink.tables.text_styles[0].font, "Arial.ttf");
        assert_eq!(sink.tables.dim_styles.len(), 2);
        let page = &sink.tables.pages[0];
        assert_eq!(page.size_mm, (420.0, 297.0));
        assert!((page.scale - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_bill_of_example_beam() {
        let planned = plan(&config("B-1"), &DraftingSettings::default()).unwrap();
        let bill = &planned.report.bill;
        assert_eq!(bill.len(), 3);

        let top = bill.by_mark(1).unwrap();
        assert_eq!((top.diameter_mm, top.quantity, top.length_mm), (20, 2, 4660));
        let bottom = bill.by_mark(2).unwrap();
        assert_eq!((bottom.diameter_mm, bottom.quantity, bottom.length_mm), (12, 3, 3895));
        let stirrup = bill.by_mark(3).unwrap();
        assert_eq!(stirrup.length_mm, 1375);
        assert_eq!(stirrup.grade, SteelGrade::B500A);
        assert_eq!(stirrup.quantity as usize, planned.report.layout.stirrup_count());
    }

    #[test]
    fn test_stirrup_legs_match_layout() {
        let mut sink = RecordingSink::new();
        let report = draw(&zoned("B-1"), &DraftingSettings::default(), &mut sink).unwrap();
        assert_eq!(report.layout.stirrup_count(), 20);
        assert_eq!(sink.entities_on("B-1-Stirrups").len(), 20);

        let first = sink.entities_on("B-1-Stirrups")[0];
        match first {
            RecordedEntity::Polyline { points, width, .. } => {
                assert!((points[0].position().x - 257.5).abs() < 1e-9);
                assert!((width - 8.0).abs() < 1e-9);
            }
            other => panic!("unexpected entity {other:?}"),
        }
    }

    #[test]
    fn test_stirrup_callouts() {
        let mut sink = RecordingSink::new();
        draw(&zoned("B-1"), &DraftingSettings::default(), &mut sink).unwrap();

        let texts: Vec<String> = sink.dimensions().filter_map(|d| d.text.clone()).collect();
        assert!(texts.contains(&"4 x 250 = <>".to_string()));
        assert!(texts.contains(&"4 x 265 = <>".to_string()));
        assert!(texts.contains(&"11 x 125 = <>".to_string()));

        let left_zone = sink
            .dimensions()
            .find(|d| d.text.as_deref() == Some("4 x 250 = <>"))
            .unwrap();
        assert_eq!(left_zone.display_text(), "4 x 250 = 1000");
    }

    #[test]
    fn test_main_dimensions() {
        let mut sink = RecordingSink::new();
        draw(&config("B-1"), &DraftingSettings::default(), &mut sink).unwrap();
        let measured: Vec<String> = sink
            .dimensions()
            .filter(|d| d.text.is_none() && (d.base.y + 400.0).abs() < 1e-9)
            .map(LinearDimension::display_text)
            .collect();
        assert_eq!(measured, vec!["250", "3450", "250"]);
    }

    #[test]
    fn test_supports() {
        let mut sink = RecordingSink::new();
        draw(&config("B-1"), &DraftingSettings::default(), &mut sink).unwrap();

        let hatches = sink.entities_on("B-1-Hatch");
        assert_eq!(hatches.len(), 2);
        match hatches[1] {
            RecordedEntity::Hatch { paths, pattern, scale, .. } => {
                assert_eq!(pattern, "ANSI33");
                assert!((scale - 20.0).abs() < 1e-9);
                assert!((paths[0][0].x - 3700.0).abs() < 1e-9);
                assert!((paths[0][1].y - -200.0).abs() < 1e-9);
            }
            other => panic!("unexpected entity {other:?}"),
        }

        let hidden = sink.entities_on("B-1-Hidden");
        assert_eq!(hidden.len(), 2);
        match hidden[0] {
            RecordedEntity::Polyline { points, .. } => {
                assert!((points[0].position().x - -200.0).abs() < 1e-9);
                assert!((points[1].position().x - 450.0).abs() < 1e-9);
            }
            other => panic!("unexpected entity {other:?}"),
        }
    }

    #[test]
    fn test_schedule_cells_emitted() {
        let mut sink = RecordingSink::new();
        let report = draw(&config("B-1"), &DraftingSettings::default(), &mut sink).unwrap();
        let texts: Vec<&str> = sink.texts().map(|t| t.content.as_str()).collect();
        assert!(texts.contains(&"Bending schedule B-1"));
        assert!(texts.contains(&"B500SP"));
        assert!(texts.contains(&"B500A"));
        assert!(texts.contains(&"9.32"));

        let non_empty = report.schedule.cells.iter().filter(|c| c.text_cell(20.0).is_some()).count();
        assert_eq!(sink.texts().count(), non_empty);
    }

    #[test]
    fn test_plan_matches_emission() {
        let planned = plan(&zoned("B-1"), &DraftingSettings::default()).unwrap();
        let mut sink = RecordingSink::new();
        let handles = planned.plan.emit(&mut sink).unwrap();
        assert_eq!(handles.len(), planned.plan.primitives.len());
        assert_eq!(sink.entities.len(), planned.report.primitive_count);
    }

    #[test]
    fn test_diagonal_stirrup_style() {
        let settings = DraftingSettings {
            stirrup_style: StirrupStyle::Diagonal,
            ..DraftingSettings::default()
        };
        let planned = plan(&config("B-1"), &settings).unwrap();
        let stirrup = planned.report.bill.by_mark(3).unwrap();
        assert_ne!(stirrup.length_mm, 1375);
    }

    #[test]
    fn test_elements_share_sink() {
        let mut sink = RecordingSink::new();
        let settings = DraftingSettings::default();
        draw(&config("B-1"), &settings, &mut sink).unwrap();
        draw(&config("B-2"), &settings, &mut sink).unwrap();
        assert_eq!(sink.tables.layers.len(), 12);
        assert_eq!(sink.tables.pages.len(), 2);

        let before = sink.entities.len();
        let err = draw(&config("B-1"), &settings, &mut sink).unwrap_err();
        assert_eq!(err.error_code(), "SINK_FAILURE");
        assert_eq!(sink.entities.len(), before);
    }

    #[test]
    fn test_uniform_beam_end_to_end() {
        let mut params = BeamParameters::example("B-1");
        params.span_mm = 3000;
        params.height_mm = 500;
        params.secondary_spacing_mm = 400;
        let config = BeamConfiguration::new(params.clone()).unwrap();
        // 0.75 x 0.9 x 500 = 337.5, rounded down to 335
        assert_eq!(config.secondary_spacing_mm(), 335);

        let report = plan(&config, &DraftingSettings::default()).unwrap().report;
        let layout = &report.layout;
        // 3000 mod 335 leaves 320 mm, so the spacing shrinks to 330
        assert_eq!(layout.secondary_spacing_mm, 330);
        assert_eq!(layout.dimension_points, vec![0.0, 15.0, 2985.0, 3000.0]);
        for (a, b) in layout.offsets.iter().zip(layout.offsets.iter().rev()) {
            assert!((a + b - 3000.0).abs() < 1e-9, "offsets not symmetric: {:?}", layout.offsets);
        }

        assert_eq!(report.chain.pattern, SpacingPattern::UniformWithMargin);
        assert_eq!(report.chain.segments.len(), 3);
        let callouts: Vec<_> = report.chain.callouts().collect();
        assert_eq!(callouts.len(), 1);
        assert_eq!(callouts[0].override_text().as_deref(), Some("9 x 330 = <>"));

        // A spacing that divides the span leaves the bare two-breakpoint chain
        params.secondary_spacing_mm = 300;
        let report = plan(&BeamConfiguration::new(params).unwrap(), &DraftingSettings::default())
            .unwrap()
            .report;
        assert_eq!(report.layout.dimension_points, vec![0.0, 3000.0]);
        assert_eq!(report.chain.pattern, SpacingPattern::Uniform);
        assert_eq!(report.chain.callouts().count(), 1);
    }

    #[test]
    fn test_zoned_beam_end_to_end() {
        let report = plan(&zoned("B-1"), &DraftingSettings::default()).unwrap().report;
        assert_eq!(
            report.layout.dimension_points,
            vec![0.0, 7.5, 1007.5, 2067.5, 3442.5, 3450.0]
        );
        assert_eq!(report.chain.pattern, SpacingPattern::BothZonesWithMargin);

        let texts: Vec<String> = report.chain.callouts().filter_map(|s| s.override_text()).collect();
        assert_eq!(texts, vec!["4 x 250 = <>", "4 x 265 = <>", "11 x 125 = <>"]);
        assert_eq!(report.chain.brackets().count(), 2);
    }

    #[test]
    fn test_sink_failure_propagates() {
        let mut sink = RecordingSink::with_entity_limit(10);
        let err = draw(&config("B-1"), &DraftingSettings::default(), &mut sink).unwrap_err();
        assert_eq!(err.error_code(), "SINK_FAILURE");
        assert_eq!(sink.entities.len(), 10);
    }

    #[test]
    fn test_origin_moves_everything() {
        let mut params = BeamParameters::example("B-1");
        params.origin = Point2::new(1000.0, 2000.0);
        let moved = plan(&BeamConfiguration::new(params).unwrap(), &DraftingSettings::default()).unwrap();
        let base = plan(&config("B-1"), &DraftingSettings::default()).unwrap();

        assert_eq!(moved.report.bill, base.report.bill);
        match (&moved.plan.primitives[0], &base.plan.primitives[0]) {
            (Primitive::Polyline { points: a, .. }, Primitive::Polyline { points: b, .. }) => {
                assert!((a[0].position().x - b[0].position().x - 1000.0).abs() < 1e-9);
                assert!((a[0].position().y - b[0].position().y - 2000.0).abs() < 1e-9);
            }
            _ => panic!("outline expected first"),
        }
    }

    #[test]
    fn test_report_serializes() {
        let planned = plan(&config("B-1"), &DraftingSettings::default()).unwrap();
        let json = serde_json::to_string(&planned.report).unwrap();
        assert!(json.contains("\"element\":\"B-1\""));
        let plan_json = serde_json::to_string(&planned.plan).unwrap();
        assert!(plan_json.contains("\"primitive\":\"Dimension\""));
    }
}
