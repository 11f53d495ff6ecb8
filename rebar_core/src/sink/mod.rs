//! # Drawing Sink
//!
//! The boundary between the drafting engine and whatever document receives
//! the drawing. The engine defines its layers and styles, then hands over
//! primitives; it never reads anything back except the returned ids.
//!
//! Two sinks ship with the crate:
//!
//! - [`recording::RecordingSink`] - keeps every call in memory, persists as JSON
//! - [`dxf::DxfSink`] - writes an AutoCAD 2018 ASCII DXF file
//!
//! Names live in one namespace per sink. Defining a layer, text style,
//! dimension style or page twice under the same name fails with
//! [`DraftError::SinkFailure`], which is what keeps several engine runs
//! sharing one sink from overwriting each other.

pub mod dxf;
pub mod recording;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DraftError, DraftResult};
use crate::geometry::{Point2, Waypoint};

/// Opaque handle of an added entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextStyleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimStyleId(pub usize);

/// Line pattern of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Continuous,
    Dashed,
}

impl LineStyle {
    /// Linetype name in CAD tables
    pub fn name(&self) -> &'static str {
        match self {
            LineStyle::Continuous => "CONTINUOUS",
            LineStyle::Dashed => "DASHED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAnchor {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

/// Which point of the text box sits on the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl TextAnchor {
    pub const LEFT_MIDDLE: TextAnchor = TextAnchor::new(HorizontalAnchor::Start, VerticalAnchor::Middle);
    pub const CENTER: TextAnchor = TextAnchor::new(HorizontalAnchor::Center, VerticalAnchor::Middle);
    pub const RIGHT_MIDDLE: TextAnchor = TextAnchor::new(HorizontalAnchor::End, VerticalAnchor::Middle);

    pub const fn new(horizontal: HorizontalAnchor, vertical: VerticalAnchor) -> Self {
        TextAnchor { horizontal, vertical }
    }
}

/// A single line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    pub location: Point2,
    pub anchor: TextAnchor,
    pub content: String,
    /// Text height in drawing units
    pub height: f64,
}

/// Linear dimension between two points, measured along `angle_deg`.
///
/// The dimension line passes through `base`. `text` replaces the measured
/// value; a `<>` inside it stands for the measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDimension {
    pub base: Point2,
    pub p1: Point2,
    pub p2: Point2,
    pub angle_deg: f64,
    pub text: Option<String>,
}

impl LinearDimension {
    /// Horizontal dimension with the dimension line through `base`
    pub fn horizontal(base: Point2, p1: Point2, p2: Point2) -> Self {
        LinearDimension {
            base,
            p1,
            p2,
            angle_deg: 0.0,
            text: None,
        }
    }

    /// Vertical dimension with the dimension line through `base`
    pub fn vertical(base: Point2, p1: Point2, p2: Point2) -> Self {
        LinearDimension {
            angle_deg: 90.0,
            ..LinearDimension::horizontal(base, p1, p2)
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Distance between the two points projected on the dimension direction
    pub fn measurement(&self) -> f64 {
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        ((self.p2.x - self.p1.x) * cos + (self.p2.y - self.p1.y) * sin).abs()
    }

    /// Text shown on the drawing, with `<>` replaced by the measurement
    pub fn display_text(&self) -> String {
        let measured = format_measurement(self.measurement());
        match &self.text {
            Some(text) => text.replace("<>", &measured),
            None => measured,
        }
    }
}

/// Whole millimetres print without decimals, anything else with one.
pub fn format_measurement(value: f64) -> String {
    if (value - value.round()).abs() < 1e-6 {
        format!("{}", value.round())
    } else {
        format!("{value:.1}")
    }
}

/// Terminator drawn at both ends of a dimension line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionArrow {
    /// 45° architectural tick
    Oblique,
    None,
}

/// Settings of a dimension style. Lengths are paper millimetres, multiplied by
/// `scale` on the drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionStyleOptions {
    pub scale: f64,
    pub arrow: DimensionArrow,
    /// Name of a text style defined in the same sink
    pub text_style: String,
    pub text_height: f64,
    /// Place the text above the dimension line instead of centred on it
    pub text_above_line: bool,
    pub suppress_extension_lines: bool,
    pub suppress_dimension_line: bool,
    pub extension_beyond: f64,
    pub tick_size: f64,
}

impl DimensionStyleOptions {
    /// Oblique ticks, text above the line
    pub fn architectural(text_style: impl Into<String>, scale: f64) -> Self {
        DimensionStyleOptions {
            scale,
            arrow: DimensionArrow::Oblique,
            text_style: text_style.into(),
            text_height: 2.5,
            text_above_line: true,
            suppress_extension_lines: false,
            suppress_dimension_line: false,
            extension_beyond: 1.25,
            tick_size: 1.5,
        }
    }

    /// Text only: used to label bar segments
    pub fn bar_label(text_style: impl Into<String>, scale: f64) -> Self {
        DimensionStyleOptions {
            arrow: DimensionArrow::None,
            suppress_extension_lines: true,
            suppress_dimension_line: true,
            extension_beyond: 0.0,
            ..DimensionStyleOptions::architectural(text_style, scale)
        }
    }
}

/// Paper layout of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub name: String,
    /// Paper width and height in mm
    pub size_mm: (f64, f64),
    /// Top, right, bottom, left
    pub margins_mm: [f64; 4],
    /// Drawing units per paper unit
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    /// AutoCAD colour index
    pub color: u8,
    pub line_style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyleDef {
    pub name: String,
    pub font: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimStyleDef {
    pub name: String,
    pub options: DimensionStyleOptions,
}

/// Receiver of drawing primitives.
pub trait DrawingSink {
    fn define_layer(&mut self, name: &str, color: u8, line_style: Option<LineStyle>) -> DraftResult<LayerId>;

    fn define_text_style(&mut self, name: &str, font: &str) -> DraftResult<TextStyleId>;

    fn define_dimension_style(&mut self, name: &str, options: &DimensionStyleOptions) -> DraftResult<DimStyleId>;

    fn define_page(&mut self, page: &PageSetup) -> DraftResult<()>;

    /// Polyline through `points`; a bend waypoint draws an arc to the next point.
    fn add_polyline(&mut self, points: &[Waypoint], closed: bool, width: f64, layer: LayerId) -> DraftResult<Handle>;

    /// Region bounded by closed `paths`, filled with a named hatch pattern.
    fn add_hatched_region(
        &mut self,
        paths: &[Vec<Point2>],
        pattern: &str,
        scale: f64,
        layer: LayerId,
    ) -> DraftResult<Handle>;

    fn add_linear_dimension(
        &mut self,
        dimension: &LinearDimension,
        style: DimStyleId,
        layer: LayerId,
    ) -> DraftResult<Handle>;

    fn add_text_cell(&mut self, cell: &TextCell, style: TextStyleId, layer: LayerId) -> DraftResult<Handle>;

    /// Write the document. Terminal: nothing should be added afterwards.
    fn persist(&mut self, path: &Path) -> DraftResult<()>;
}

/// Name tables shared by the bundled sinks.
///
/// Enforces unique names and resolves ids handed back by the engine. Names
/// compare case-insensitively, as DXF symbol tables do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkTables {
    pub layers: Vec<LayerDef>,
    pub text_styles: Vec<TextStyleDef>,
    pub dim_styles: Vec<DimStyleDef>,
    pub pages: Vec<PageSetup>,
}

impl SinkTables {
    pub fn add_layer(&mut self, name: &str, color: u8, line_style: Option<LineStyle>) -> DraftResult<LayerId> {
        check_name("define_layer", name, self.layers.iter().map(|l| l.name.as_str()))?;
        self.layers.push(LayerDef {
            name: name.to_string(),
            color,
            line_style: line_style.unwrap_or(LineStyle::Continuous),
        });
        Ok(LayerId(self.layers.len() - 1))
    }

    pub fn add_text_style(&mut self, name: &str, font: &str) -> DraftResult<TextStyleId> {
        check_name("define_text_style", name, self.text_styles.iter().map(|s| s.name.as_str()))?;
        self.text_styles.push(TextStyleDef {
            name: name.to_string(),
            font: font.to_string(),
        });
        Ok(TextStyleId(self.text_styles.len() - 1))
    }

    pub fn add_dim_style(&mut self, name: &str, options: &DimensionStyleOptions) -> DraftResult<DimStyleId> {
        check_name("define_dimension_style", name, self.dim_styles.iter().map(|s| s.name.as_str()))?;
        if !self.text_styles.iter().any(|s| s.name.eq_ignore_ascii_case(&options.text_style)) {
            return Err(DraftError::sink_failure(
                "define_dimension_style",
                format!("{name}: unknown text style '{}'", options.text_style),
            ));
        }
        self.dim_styles.push(DimStyleDef {
            name: name.to_string(),
            options: options.clone(),
        });
        Ok(DimStyleId(self.dim_styles.len() - 1))
    }

    pub fn add_page(&mut self, page: &PageSetup) -> DraftResult<()> {
        check_name("define_page", &page.name, self.pages.iter().map(|p| p.name.as_str()))?;
        self.pages.push(page.clone());
        Ok(())
    }

    pub fn layer(&self, id: LayerId) -> DraftResult<&LayerDef> {
        self.layers
            .get(id.0)
            .ok_or_else(|| DraftError::sink_failure("layer", format!("unknown layer id {}", id.0)))
    }

    pub fn text_style(&self, id: TextStyleId) -> DraftResult<&TextStyleDef> {
        self.text_styles
            .get(id.0)
            .ok_or_else(|| DraftError::sink_failure("text_style", format!("unknown text style id {}", id.0)))
    }

    pub fn dim_style(&self, id: DimStyleId) -> DraftResult<&DimStyleDef> {
        self.dim_styles
            .get(id.0)
            .ok_or_else(|| DraftError::sink_failure("dimension_style", format!("unknown dimension style id {}", id.0)))
    }
}

fn check_name<'a>(operation: &str, name: &str, mut existing: impl Iterator<Item = &'a str>) -> DraftResult<()> {
    if name.is_empty() {
        return Err(DraftError::sink_failure(operation, "name must not be empty"));
    }
    if existing.any(|n| n.eq_ignore_ascii_case(name)) {
        return Err(DraftError::sink_failure(operation, format!("'{name}' is already defined")));
    }
    Ok(())
}
