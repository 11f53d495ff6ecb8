//! DXF sink built on the `dxf` crate.
//!
//! The document is written as AutoCAD 2018 (AC1032) ASCII DXF, which is UTF-8
//! throughout. Every sink call maps onto a native DXF record:
//!
//! - layers, text styles and dimension styles become LAYER, STYLE and
//!   DIMSTYLE table entries; the dashed layer linetype is a DASHED LTYPE
//! - polylines become LWPOLYLINE entities with per-vertex bulges and a
//!   constant width
//! - linear dimensions become rotated DIMENSION entities referencing their
//!   DIMSTYLE; the text-only bar label style becomes plain TEXT
//! - page setups become PLOTSETTINGS objects in millimetres
//!
//! The `dxf` crate has no HATCH entity. A hatched region is written the way
//! R12 files carried hatches: an anonymous `*X` block holding the boundary and
//! the pattern lines clipped to it, referenced by one INSERT on the hatch
//! layer.

use std::path::Path;

use dxf::entities::{DimensionBase, Entity, EntityType, Insert, LwPolyline, RotatedDimension, Text};
use dxf::enums::{
    AcadVersion, DimensionType, DrawingUnits, HorizontalTextJustification, PlotPaperUnits, Units,
    VerticalTextJustification,
};
use dxf::objects::{Object, ObjectType, PlotSettings};
use dxf::tables::{DimStyle, Layer, LineType, Style};
use dxf::{Block, Color, Drawing, LwPolylineVertex, Point};

use super::{
    DimStyleId, DimensionArrow, DimensionStyleOptions, DrawingSink, Handle, HorizontalAnchor, LayerId,
    LinearDimension, LineStyle, PageSetup, SinkTables, TextAnchor, TextCell, TextStyleId, VerticalAnchor,
};
use crate::errors::{DraftError, DraftResult};
use crate::file_io;
use crate::geometry::{Point2, Waypoint};

/// Code page announced in the header
pub const CODE_PAGE: &str = "ANSI_1252";

/// Dash and gap of the DASHED linetype
const DASHED_PATTERN: [f64; 2] = [12.7, -6.35];

/// One family of parallel lines in a hatch pattern, in millimetres at scale 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternLine {
    pub angle_deg: f64,
    /// Perpendicular shift of the family from the pattern origin
    pub offset: f64,
    /// Perpendicular distance between neighbouring lines
    pub spacing: f64,
    /// Dash (positive) and gap (negative) lengths; empty for solid lines
    pub dashes: &'static [f64],
}

const fn solid(angle_deg: f64, offset: f64, spacing: f64) -> PatternLine {
    PatternLine {
        angle_deg,
        offset,
        spacing,
        dashes: &[],
    }
}

const ANSI31: [PatternLine; 1] = [solid(45.0, 0.0, 3.175)];
const ANSI32: [PatternLine; 2] = [solid(45.0, 0.0, 9.525), solid(45.0, 3.175, 9.525)];
const ANSI33: [PatternLine; 2] = [
    solid(45.0, 0.0, 6.35),
    PatternLine {
        angle_deg: 45.0,
        offset: 3.175,
        spacing: 6.35,
        dashes: &[3.175, -1.5875],
    },
];
const ANSI37: [PatternLine; 2] = [solid(45.0, 0.0, 3.175), solid(135.0, 0.0, 3.175)];
const LINE: [PatternLine; 1] = [solid(0.0, 0.0, 3.175)];
const NET: [PatternLine; 2] = [solid(0.0, 0.0, 3.175), solid(90.0, 0.0, 3.175)];

/// Line families of a named hatch pattern (case-insensitive)
pub fn hatch_pattern(name: &str) -> Option<&'static [PatternLine]> {
    match name.to_ascii_uppercase().as_str() {
        "ANSI31" => Some(&ANSI31),
        "ANSI32" => Some(&ANSI32),
        "ANSI33" => Some(&ANSI33),
        "ANSI37" => Some(&ANSI37),
        "LINE" => Some(&LINE),
        "NET" => Some(&NET),
        _ => None,
    }
}

/// DXF document assembled from sink calls.
pub struct DxfSink {
    tables: SinkTables,
    drawing: Drawing,
    entity_count: usize,
    hatch_count: usize,
}

impl std::fmt::Debug for DxfSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DxfSink")
            .field("tables", &self.tables)
            .field("entity_count", &self.entity_count)
            .field("hatch_count", &self.hatch_count)
            .finish_non_exhaustive()
    }
}

impl Default for DxfSink {
    fn default() -> Self {
        DxfSink::new()
    }
}

impl DxfSink {
    pub fn new() -> Self {
        let mut drawing = Drawing::new();
        drawing.header.version = AcadVersion::R2018;
        drawing.header.drawing_code_page = CODE_PAGE.to_string();
        drawing.header.default_drawing_units = Units::Millimeters;
        drawing.header.drawing_units = DrawingUnits::Metric;

        drawing.add_line_type(LineType {
            name: LineStyle::Dashed.name().to_string(),
            description: "Dashed __ __ __".to_string(),
            total_pattern_length: DASHED_PATTERN.iter().map(|v| v.abs()).sum(),
            dash_dot_space_lengths: DASHED_PATTERN.to_vec(),
            ..Default::default()
        });

        DxfSink {
            tables: SinkTables::default(),
            drawing,
            entity_count: 0,
            hatch_count: 0,
        }
    }

    /// Number of entities added through the sink
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// The document as built so far
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    fn layer_name(&self, id: LayerId) -> DraftResult<String> {
        Ok(self.tables.layer(id)?.name.clone())
    }

    fn push(&mut self, mut entity: Entity, layer: String) -> Handle {
        entity.common.layer = layer;
        self.entity_count += 1;
        Handle(self.drawing.add_entity(entity).common.handle.0)
    }

    /// Render the document as DXF text.
    pub fn to_dxf_string(&self) -> DraftResult<String> {
        let buffer = self.to_dxf_bytes()?;
        String::from_utf8(buffer).map_err(|e| DraftError::sink_failure("to_dxf_string", e.to_string()))
    }

    fn to_dxf_bytes(&self) -> DraftResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.drawing
            .save(&mut buffer)
            .map_err(|e| DraftError::sink_failure("save", e.to_string()))?;
        Ok(buffer)
    }
}

fn point(p: Point2) -> Point {
    Point::new(p.x, p.y, 0.0)
}

fn dim_style_record(name: &str, options: &DimensionStyleOptions) -> DimStyle {
    let tick = match options.arrow {
        DimensionArrow::Oblique => options.tick_size,
        DimensionArrow::None => 0.0,
    };
    DimStyle {
        name: name.to_string(),
        dimensioning_scale_factor: options.scale,
        dimensioning_arrow_size: tick,
        dimensioning_tick_size: tick,
        dimensioning_text_height: options.text_height,
        dimension_extension_line_extension: options.extension_beyond,
        dimension_extension_line_offset: 0.0,
        text_above_dimension_line: options.text_above_line,
        dimension_text_inside_horizontal: false,
        dimension_text_outside_horizontal: false,
        suppress_first_dimension_extension_line: options.suppress_extension_lines,
        suppress_second_dimension_extension_line: options.suppress_extension_lines,
        ..Default::default()
    }
}

/// Text stored on a DIMENSION entity.
///
/// `<>` is left for the CAD program to fill in, except where the measurement
/// needs a decimal the zero-precision style would round away.
fn dimension_text(dimension: &LinearDimension) -> String {
    let measured = dimension.measurement();
    if (measured - measured.round()).abs() < 1e-6 {
        dimension.text.clone().unwrap_or_else(|| "<>".to_string())
    } else {
        dimension.display_text()
    }
}

fn justification(anchor: TextAnchor) -> (HorizontalTextJustification, VerticalTextJustification) {
    let horizontal = match anchor.horizontal {
        HorizontalAnchor::Start => HorizontalTextJustification::Left,
        HorizontalAnchor::Center => HorizontalTextJustification::Center,
        HorizontalAnchor::End => HorizontalTextJustification::Right,
    };
    let vertical = match anchor.vertical {
        VerticalAnchor::Bottom => VerticalTextJustification::Bottom,
        VerticalAnchor::Middle => VerticalTextJustification::Middle,
        VerticalAnchor::Top => VerticalTextJustification::Top,
    };
    (horizontal, vertical)
}

fn text_entity(at: Point2, height: f64, rotation_deg: f64, anchor: TextAnchor, content: &str, style: &str) -> Entity {
    let (horizontal, vertical) = justification(anchor);
    // Justified text is placed by its alignment point
    Entity::new(EntityType::Text(Text {
        location: point(at),
        second_alignment_point: point(at),
        text_height: height,
        value: content.to_string(),
        rotation: rotation_deg,
        text_style_name: style.to_string(),
        horizontal_text_justification: horizontal,
        vertical_text_justification: vertical,
        ..Default::default()
    }))
}

/// Point on the dimension line level with `p`
fn on_dimension_line(dimension: &LinearDimension, p: Point2) -> Point2 {
    let (sin, cos) = dimension.angle_deg.to_radians().sin_cos();
    let along = (p.x - dimension.base.x) * cos + (p.y - dimension.base.y) * sin;
    dimension.base.offset(along * cos, along * sin)
}

/// Where the label of `dimension` sits.
fn label_position(dimension: &LinearDimension, options: &DimensionStyleOptions) -> (Point2, TextAnchor) {
    let middle = on_dimension_line(dimension, dimension.p1).midpoint(on_dimension_line(dimension, dimension.p2));
    if options.text_above_line {
        let (sin, cos) = dimension.angle_deg.to_radians().sin_cos();
        let gap = 0.625 * options.scale;
        (
            middle.offset(-sin * gap, cos * gap),
            TextAnchor::new(HorizontalAnchor::Center, VerticalAnchor::Bottom),
        )
    } else {
        (middle, TextAnchor::CENTER)
    }
}

/// Pattern lines of `pattern` inside the region bounded by `paths`.
///
/// Boundaries are closed implicitly and combine even-odd, so an inner path
/// cuts a hole. Line families are anchored at the drawing origin and scaled
/// by `scale`.
pub fn hatch_lines(paths: &[Vec<Point2>], pattern: &[PatternLine], scale: f64) -> Vec<(Point2, Point2)> {
    let mut lines = Vec::new();
    if scale <= 0.0 {
        return lines;
    }
    let edges: Vec<(Point2, Point2)> = paths
        .iter()
        .filter(|path| path.len() >= 3)
        .flat_map(|path| path.iter().zip(path.iter().cycle().skip(1)).map(|(a, b)| (*a, *b)))
        .collect();
    if edges.is_empty() {
        return lines;
    }

    for family in pattern {
        let spacing = family.spacing * scale;
        if spacing <= 0.0 {
            continue;
        }
        let offset = family.offset * scale;
        let (sin, cos) = family.angle_deg.to_radians().sin_cos();
        let across = |p: Point2| -p.x * sin + p.y * cos;
        let along = |p: Point2| p.x * cos + p.y * sin;

        let (lo, hi) = edges
            .iter()
            .map(|(a, _)| across(*a))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let mut k = ((lo - offset) / spacing).ceil();
        while offset + k * spacing <= hi {
            let c = offset + k * spacing;
            k += 1.0;

            let mut crossings: Vec<f64> = edges
                .iter()
                .filter_map(|(a, b)| {
                    let (da, db) = (across(*a) - c, across(*b) - c);
                    if (da > 0.0) == (db > 0.0) {
                        return None;
                    }
                    let t = da / (da - db);
                    Some(along(*a) + t * (along(*b) - along(*a)))
                })
                .collect();
            crossings.sort_by(|a, b| a.total_cmp(b));

            let at = |s: f64| Point2::new(s * cos - c * sin, s * sin + c * cos);
            for pair in crossings.chunks_exact(2) {
                for (start, end) in dash_runs(pair[0], pair[1], family.dashes, scale) {
                    lines.push((at(start), at(end)));
                }
            }
        }
    }
    lines
}

/// Drawn runs of a dashed line between `start` and `end`, phased from 0.
fn dash_runs(start: f64, end: f64, dashes: &[f64], scale: f64) -> Vec<(f64, f64)> {
    let period: f64 = dashes.iter().map(|d| d.abs() * scale).sum();
    if dashes.is_empty() || period <= 0.0 {
        return vec![(start, end)];
    }

    let mut runs = Vec::new();
    let mut cursor = (start / period).floor() * period;
    while cursor < end {
        for dash in dashes {
            let length = dash.abs() * scale;
            if *dash > 0.0 {
                let (a, b) = (cursor.max(start), (cursor + length).min(end));
                if b > a {
                    runs.push((a, b));
                }
            }
            cursor += length;
        }
    }
    runs
}

impl DrawingSink for DxfSink {
    fn define_layer(&mut self, name: &str, color: u8, line_style: Option<LineStyle>) -> DraftResult<LayerId> {
        let id = self.tables.add_layer(name, color, line_style)?;
        self.drawing.add_layer(Layer {
            name: name.to_string(),
            color: Color::from_index(color),
            line_type_name: line_style.unwrap_or(LineStyle::Continuous).name().to_string(),
            ..Default::default()
        });
        Ok(id)
    }

    fn define_text_style(&mut self, name: &str, font: &str) -> DraftResult<TextStyleId> {
        let id = self.tables.add_text_style(name, font)?;
        self.drawing.add_style(Style {
            name: name.to_string(),
            primary_font_file_name: font.to_string(),
            ..Default::default()
        });
        Ok(id)
    }

    fn define_dimension_style(&mut self, name: &str, options: &DimensionStyleOptions) -> DraftResult<DimStyleId> {
        let id = self.tables.add_dim_style(name, options)?;
        self.drawing.add_dim_style(dim_style_record(name, options));
        Ok(id)
    }

    fn define_page(&mut self, page: &PageSetup) -> DraftResult<()> {
        self.tables.add_page(page)?;
        let [top, right, bottom, left] = page.margins_mm;
        let settings = PlotSettings {
            page_setup_name: page.name.clone(),
            paper_size: format!("{}x{}mm", page.size_mm.0, page.size_mm.1),
            unprintable_left_margin_size: left,
            unprintable_bottom_margin_size: bottom,
            unprintable_right_margin_size: right,
            unprintable_top_margin_size: top,
            plot_paper_units: PlotPaperUnits::Millimeters,
            custom_print_scale_numerator: 1.0,
            custom_print_scale_denominator: page.scale,
            ..Default::default()
        };
        self.drawing.add_object(Object::new(ObjectType::PlotSettings(settings)));
        if self.tables.pages.len() == 1 {
            self.drawing.header.line_type_scale = page.scale;
        }
        Ok(())
    }

    fn add_polyline(&mut self, points: &[Waypoint], closed: bool, width: f64, layer: LayerId) -> DraftResult<Handle> {
        if points.len() < 2 {
            return Err(DraftError::sink_failure("add_polyline", "a polyline needs at least two points"));
        }
        let layer = self.layer_name(layer)?;

        let mut polyline = LwPolyline {
            constant_width: width,
            vertices: points
                .iter()
                .map(|p| {
                    let at = p.position();
                    LwPolylineVertex {
                        x: at.x,
                        y: at.y,
                        bulge: p.bulge(),
                        ..Default::default()
                    }
                })
                .collect(),
            ..Default::default()
        };
        polyline.set_is_closed(closed);
        Ok(self.push(Entity::new(EntityType::LwPolyline(polyline)), layer))
    }

    fn add_hatched_region(
        &mut self,
        paths: &[Vec<Point2>],
        pattern: &str,
        scale: f64,
        layer: LayerId,
    ) -> DraftResult<Handle> {
        let family = hatch_pattern(pattern)
            .ok_or_else(|| DraftError::sink_failure("add_hatched_region", format!("unknown hatch pattern '{pattern}'")))?;
        let layer = self.layer_name(layer)?;

        let mut entities = Vec::new();
        for path in paths.iter().filter(|p| p.len() >= 2) {
            let mut boundary = LwPolyline {
                vertices: path
                    .iter()
                    .map(|p| LwPolylineVertex {
                        x: p.x,
                        y: p.y,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            };
            boundary.set_is_closed(true);
            entities.push(Entity::new(EntityType::LwPolyline(boundary)));
        }
        let lines = hatch_lines(paths, family, scale);
        log::debug!("hatch {pattern} on {layer}: {} lines", lines.len());
        for (start, end) in lines {
            entities.push(Entity::new(EntityType::Line(dxf::entities::Line::new(point(start), point(end)))));
        }
        for entity in &mut entities {
            entity.common.layer = layer.clone();
        }

        self.hatch_count += 1;
        let name = format!("*X{}", self.hatch_count);
        let mut block = Block {
            name: name.clone(),
            layer: layer.clone(),
            entities,
            ..Default::default()
        };
        block.set_is_anonymous(true);
        self.drawing.add_block(block);

        let insert = Insert {
            name,
            ..Default::default()
        };
        Ok(self.push(Entity::new(EntityType::Insert(insert)), layer))
    }

    fn add_linear_dimension(
        &mut self,
        dimension: &LinearDimension,
        style: DimStyleId,
        layer: LayerId,
    ) -> DraftResult<Handle> {
        let def = self.tables.dim_style(style)?.clone();
        let layer = self.layer_name(layer)?;
        let options = &def.options;
        let (label_at, anchor) = label_position(dimension, options);

        // No dimension line, ticks or extension lines: only the label is left
        if options.suppress_dimension_line {
            let text = text_entity(
                label_at,
                options.text_height * options.scale,
                dimension.angle_deg,
                anchor,
                &dimension.display_text(),
                &options.text_style,
            );
            return Ok(self.push(text, layer));
        }

        let base = DimensionBase {
            definition_point_1: point(on_dimension_line(dimension, dimension.p2)),
            text_mid_point: point(label_at),
            dimension_type: DimensionType::RotatedHorizontalOrVertical,
            actual_measurement: dimension.measurement(),
            text: dimension_text(dimension),
            dimension_style_name: def.name.clone(),
            ..Default::default()
        };

        let rotated = RotatedDimension {
            dimension_base: base,
            definition_point_2: point(dimension.p1),
            definition_point_3: point(dimension.p2),
            rotation_angle: dimension.angle_deg,
            ..Default::default()
        };
        Ok(self.push(Entity::new(EntityType::RotatedDimension(rotated)), layer))
    }

    fn add_text_cell(&mut self, cell: &TextCell, style: TextStyleId, layer: LayerId) -> DraftResult<Handle> {
        let style = self.tables.text_style(style)?.name.clone();
        let layer = self.layer_name(layer)?;
        let text = text_entity(cell.location, cell.height, 0.0, cell.anchor, &cell.content, &style);
        Ok(self.push(text, layer))
    }

    fn persist(&mut self, path: &Path) -> DraftResult<()> {
        let buffer = self.to_dxf_bytes()?;
        file_io::write_atomic(path, &buffer)?;
        log::info!(
            "saved {} ({} layers, {} entities)",
            path.display(),
            self.tables.layers.len(),
            self.entity_count
        );
        Ok(())
    }
}
