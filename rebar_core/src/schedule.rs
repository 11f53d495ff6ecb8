//! # Bending Schedule Table
//!
//! Lays out the bar-bending schedule of a [`SteelBill`] as a grid of cells.
//!
//! ## Layout
//!
//! ```text
//! +------------------------------------------------------------------+
//! | Title                                                            |
//! +------+-----+--------+---------+-------+-------------+------------+
//! | Mark |  Ø  | Length | Qty/el. | Qty   |   B500SP    |   B500A    |
//! |      |     |        |         | total +------+------+------------+
//! |      |     |        |         |       |  Ø20 |  Ø12 |    Ø8      |
//! +------+-----+--------+---------+-------+------+------+------------+
//! |  1   | 20  |  4660  |    2    |   2   | 9.32 |   -  |     -      |
//! |  ... one row per mark                                            |
//! +------------------------------------------+------+------+---------+
//! | footer rows: length, unit mass, mass, mass per grade, totals     |
//! +------------------------------------------------------------------+
//! ```
//!
//! Grades and their diameters keep first-seen order. The bar block has a
//! fixed total width split evenly between its (grade, diameter) columns.
//!
//! Widths and heights are paper millimetres multiplied by
//! [`ScheduleOptions::scale`]; the table grows downwards from its top-left
//! corner. The layout is rebuilt from scratch on every call and is fully
//! determined by the bill and the options.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bill::{SteelBill, SteelBillEntry, SteelGrade};
use crate::geometry::Point2;
use crate::sink::{TextAnchor, TextCell};
use crate::units::{round_to, KgPerMeter, Meters, Millimeters};

const MARK_WIDTH: f64 = 10.0;
const DIAMETER_WIDTH: f64 = 12.0;
const LENGTH_WIDTH: f64 = 15.0;
const QUANTITY_WIDTH: f64 = 12.0;
const BAR_BLOCK_WIDTH: f64 = 60.0;
const REMARKS_WIDTH: f64 = 25.0;

const TITLE_HEIGHT: f64 = 8.0;
const HEADER_HEIGHT: f64 = 5.0;
const ROW_HEIGHT: f64 = 5.0;

/// Text height in paper millimetres
pub const TEXT_HEIGHT: f64 = 2.5;
const TEXT_PADDING: f64 = 1.0;

/// Number of fixed leading columns (mark to quantity total)
pub const LEADING_COLUMNS: usize = 5;

/// Table placement and content options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub title: String,
    /// Top-left corner of the table
    pub origin: Point2,
    /// Drawing units per paper millimetre
    pub scale: f64,
    /// Number of identical elements; multiplies quantities and lengths
    pub element_multiplier: u32,
    /// Per-element multipliers overriding `element_multiplier`, keyed by
    /// element name (used for project-wide schedules)
    #[serde(default)]
    pub element_multipliers: BTreeMap<String, u32>,
    /// Add a trailing remarks column
    pub remarks: bool,
}

impl ScheduleOptions {
    pub fn new(title: impl Into<String>, origin: Point2, scale: f64, element_multiplier: u32) -> Self {
        ScheduleOptions {
            title: title.into(),
            origin,
            scale,
            element_multiplier,
            element_multipliers: BTreeMap::new(),
            remarks: false,
        }
    }

    pub fn multiplier_for(&self, element_name: &str) -> u32 {
        self.element_multipliers
            .get(element_name)
            .copied()
            .unwrap_or(self.element_multiplier)
    }
}

/// Diameters of one steel grade, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeGroup {
    pub grade: SteelGrade,
    pub diameters_mm: Vec<u32>,
}

/// Group the bill's diameters by grade, both in first-seen order.
pub fn group_by_grade(bill: &SteelBill) -> Vec<GradeGroup> {
    let mut groups: Vec<GradeGroup> = Vec::new();
    for entry in bill.entries() {
        match groups.iter_mut().find(|g| g.grade == entry.grade) {
            Some(group) => {
                if !group.diameters_mm.contains(&entry.diameter_mm) {
                    group.diameters_mm.push(entry.diameter_mm);
                }
            }
            None => groups.push(GradeGroup {
                grade: entry.grade.clone(),
                diameters_mm: vec![entry.diameter_mm],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Mark,
    Diameter,
    Length,
    QuantityPerElement,
    QuantityTotal,
    Bar { grade: SteelGrade, diameter_mm: u32 },
    Remarks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    /// Left edge
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FooterKind {
    Length,
    UnitMass,
    Mass,
    GradeMass,
    TotalLength,
    TotalMass,
}

impl FooterKind {
    const ALL: [FooterKind; 6] = [
        FooterKind::Length,
        FooterKind::UnitMass,
        FooterKind::Mass,
        FooterKind::GradeMass,
        FooterKind::TotalLength,
        FooterKind::TotalMass,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FooterKind::Length => "Length [m]",
            FooterKind::UnitMass => "Unit mass [kg/m]",
            FooterKind::Mass => "Mass [kg]",
            FooterKind::GradeMass => "Mass per grade [kg]",
            FooterKind::TotalLength => "Total length [m]",
            FooterKind::TotalMass => "Total mass [kg]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    Title,
    GradeHeader,
    DiameterHeader,
    Mark(u32),
    Footer(FooterKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSpec {
    pub kind: RowKind,
    /// Top edge
    pub y: f64,
    pub height: f64,
}

/// Content of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Text(String),
    Number { value: f64, decimals: usize },
    /// The row's bar does not belong to this column
    NotApplicable,
    Empty,
}

impl CellValue {
    fn integer(value: u32) -> Self {
        CellValue::Number {
            value: f64::from(value),
            decimals: 0,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            CellValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number { value, decimals } => write!(f, "{:.*}", *decimals, value),
            CellValue::NotApplicable => f.write_str("-"),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One rectangle of the grid, possibly spanning several rows or columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
    /// Top-left corner
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: CellValue,
    pub anchor: TextAnchor,
}

impl TableCell {
    /// Closed rectangle, counter-clockwise from the top-left corner
    pub fn outline(&self) -> Vec<Point2> {
        vec![
            Point2::new(self.x, self.y),
            Point2::new(self.x, self.y - self.height),
            Point2::new(self.x + self.width, self.y - self.height),
            Point2::new(self.x + self.width, self.y),
        ]
    }

    /// Insertion point of the label for the cell's anchor
    pub fn text_location(&self, padding: f64) -> Point2 {
        use crate::sink::{HorizontalAnchor, VerticalAnchor};

        let x = match self.anchor.horizontal {
            HorizontalAnchor::Start => self.x + padding,
            HorizontalAnchor::Center => self.x + self.width / 2.0,
            HorizontalAnchor::End => self.x + self.width - padding,
        };
        let y = match self.anchor.vertical {
            VerticalAnchor::Top => self.y - padding,
            VerticalAnchor::Middle => self.y - self.height / 2.0,
            VerticalAnchor::Bottom => self.y - self.height + padding,
        };
        Point2::new(x, y)
    }

    /// Label to hand to a drawing sink; `None` for empty cells
    pub fn text_cell(&self, scale: f64) -> Option<TextCell> {
        if self.value == CellValue::Empty {
            return None;
        }
        Some(TextCell {
            location: self.text_location(TEXT_PADDING * scale),
            anchor: self.anchor,
            content: self.value.to_string(),
            height: TEXT_HEIGHT * scale,
        })
    }
}

/// Totals of one (grade, diameter) column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTotal {
    pub grade: SteelGrade,
    pub diameter_mm: u32,
    pub length: Meters,
    pub unit_mass: KgPerMeter,
    pub mass_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTotal {
    pub grade: SteelGrade,
    pub mass_kg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub columns: Vec<ColumnTotal>,
    pub grades: Vec<GradeTotal>,
    pub length: Meters,
    pub mass_kg: f64,
}

/// Fully laid-out bending schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendingScheduleTable {
    pub options: ScheduleOptions,
    pub groups: Vec<GradeGroup>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<RowSpec>,
    pub cells: Vec<TableCell>,
    pub totals: ScheduleTotals,
}

impl BendingScheduleTable {
    /// Lay out the schedule of `bill`.
    pub fn build(bill: &SteelBill, options: &ScheduleOptions) -> Self {
        let groups = group_by_grade(bill);
        let columns = plan_columns(&groups, options);
        let rows = plan_rows(bill, !groups.is_empty(), options);

        let mut table = BendingScheduleTable {
            options: options.clone(),
            groups,
            columns,
            rows,
            cells: Vec::new(),
            totals: ScheduleTotals::default(),
        };
        table.fill_header();
        table.fill_marks(bill);
        table.totals = table.compute_totals();
        table.fill_footer();

        log::debug!(
            "schedule '{}': {} columns, {} rows, {} cells",
            table.options.title,
            table.columns.len(),
            table.rows.len(),
            table.cells.len()
        );
        table
    }

    pub fn width(&self) -> f64 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn height(&self) -> f64 {
        self.rows.iter().map(|r| r.height).sum()
    }

    /// Index of the (grade, diameter) column
    pub fn bar_column(&self, grade: &SteelGrade, diameter_mm: u32) -> Option<usize> {
        self.columns.iter().position(|c| match &c.kind {
            ColumnKind::Bar { grade: g, diameter_mm: d } => g == grade && *d == diameter_mm,
            _ => false,
        })
    }

    fn row_of(&self, kind: RowKind) -> Option<usize> {
        self.rows.iter().position(|r| r.kind == kind)
    }

    /// Value at the intersection of a mark row and a column
    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.column == column)
    }

    /// Value of the (grade, diameter) column for a mark
    pub fn bar_value(&self, mark: u32, grade: &SteelGrade, diameter_mm: u32) -> Option<&CellValue> {
        let row = self.row_of(RowKind::Mark(mark))?;
        let column = self.bar_column(grade, diameter_mm)?;
        self.cell(row, column).map(|c| &c.value)
    }

    fn bar_columns(&self) -> impl Iterator<Item = (usize, &SteelGrade, u32)> {
        self.columns.iter().enumerate().filter_map(|(i, c)| match &c.kind {
            ColumnKind::Bar { grade, diameter_mm } => Some((i, grade, *diameter_mm)),
            _ => None,
        })
    }

    fn push(&mut self, row: usize, column: usize, row_span: usize, column_span: usize, value: CellValue, anchor: TextAnchor) {
        let first_row = &self.rows[row];
        let first_column = &self.columns[column];
        let height = self.rows[row..row + row_span].iter().map(|r| r.height).sum();
        let width = self.columns[column..column + column_span].iter().map(|c| c.width).sum();
        self.cells.push(TableCell {
            row,
            column,
            row_span,
            column_span,
            x: first_column.x,
            y: first_row.y,
            width,
            height,
            value,
            anchor,
        });
    }

    fn fill_header(&mut self) {
        let all = self.columns.len();
        self.push(0, 0, 1, all, CellValue::Text(self.options.title.clone()), TextAnchor::LEFT_MIDDLE);

        let labels = ["Mark", "Ø [mm]", "Length [mm]", "Qty/el.", "Qty total"];
        for (column, label) in labels.into_iter().enumerate() {
            self.push(1, column, 2, 1, CellValue::Text(label.to_string()), TextAnchor::CENTER);
        }

        let mut column = LEADING_COLUMNS;
        for group in self.groups.clone() {
            let span = group.diameters_mm.len();
            self.push(1, column, 1, span, CellValue::Text(group.grade.to_string()), TextAnchor::CENTER);
            for diameter in &group.diameters_mm {
                self.push(2, column, 1, 1, CellValue::Text(format!("Ø{diameter}")), TextAnchor::CENTER);
                column += 1;
            }
        }

        if self.options.remarks {
            self.push(1, all - 1, 2, 1, CellValue::Text("Remarks".to_string()), TextAnchor::CENTER);
        }
    }

    fn fill_marks(&mut self, bill: &SteelBill) {
        let bar_columns: Vec<(usize, SteelGrade, u32)> =
            self.bar_columns().map(|(i, g, d)| (i, g.clone(), d)).collect();

        for entry in bill.entries() {
            let Some(row) = self.row_of(RowKind::Mark(entry.mark)) else {
                continue;
            };
            let multiplier = self.options.multiplier_for(&entry.element_name);

            self.push(row, 0, 1, 1, CellValue::integer(entry.mark), TextAnchor::CENTER);
            self.push(row, 1, 1, 1, CellValue::integer(entry.diameter_mm), TextAnchor::CENTER);
            self.push(row, 2, 1, 1, CellValue::integer(entry.length_mm), TextAnchor::RIGHT_MIDDLE);
            self.push(row, 3, 1, 1, CellValue::integer(entry.quantity), TextAnchor::RIGHT_MIDDLE);
            self.push(row, 4, 1, 1, CellValue::integer(entry.quantity * multiplier), TextAnchor::RIGHT_MIDDLE);

            for (column, grade, diameter) in &bar_columns {
                let value = if entry.grade == *grade && entry.diameter_mm == *diameter {
                    CellValue::Number {
                        value: bar_length_m(entry, multiplier),
                        decimals: 2,
                    }
                } else {
                    CellValue::NotApplicable
                };
                self.push(row, *column, 1, 1, value, TextAnchor::RIGHT_MIDDLE);
            }

            if self.options.remarks {
                let last = self.columns.len() - 1;
                self.push(row, last, 1, 1, CellValue::Empty, TextAnchor::LEFT_MIDDLE);
            }
        }
    }

    /// Sum the numeric cells of every bar column
    fn compute_totals(&self) -> ScheduleTotals {
        let mark_rows: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches!(r.kind, RowKind::Mark(_)))
            .map(|(i, _)| i)
            .collect();

        let mut totals = ScheduleTotals::default();
        for (column, grade, diameter_mm) in self.bar_columns() {
            let sum: f64 = mark_rows
                .iter()
                .filter_map(|row| self.cell(*row, column))
                .filter_map(|c| c.value.number())
                .sum();
            let length = Meters(round_to(sum, 2));
            let unit_mass = KgPerMeter::for_bar_diameter(diameter_mm);
            let mass_kg = round_to((unit_mass * length).0, 2);

            match totals.grades.iter_mut().find(|g| g.grade == *grade) {
                Some(grade_total) => grade_total.mass_kg = round_to(grade_total.mass_kg + mass_kg, 2),
                None => totals.grades.push(GradeTotal {
                    grade: grade.clone(),
                    mass_kg,
                }),
            }
            totals.length = Meters(round_to((totals.length + length).0, 2));
            totals.mass_kg = round_to(totals.mass_kg + mass_kg, 2);
            totals.columns.push(ColumnTotal {
                grade: grade.clone(),
                diameter_mm,
                length,
                unit_mass,
                mass_kg,
            });
        }
        totals
    }

    fn fill_footer(&mut self) {
        let footer_rows: Vec<(usize, FooterKind)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| match r.kind {
                RowKind::Footer(kind) => Some((i, kind)),
                _ => None,
            })
            .collect();
        let bar_count = self.totals.columns.len();
        let remarks = self.options.remarks;
        let last = self.columns.len() - 1;

        for (row, kind) in footer_rows {
            self.push(
                row,
                0,
                1,
                LEADING_COLUMNS,
                CellValue::Text(kind.label().to_string()),
                TextAnchor::LEFT_MIDDLE,
            );

            match kind {
                FooterKind::Length | FooterKind::UnitMass | FooterKind::Mass => {
                    for index in 0..bar_count {
                        let total = &self.totals.columns[index];
                        let value = match kind {
                            FooterKind::Length => CellValue::Number {
                                value: total.length.0,
                                decimals: 2,
                            },
                            FooterKind::UnitMass => CellValue::Number {
                                value: total.unit_mass.0,
                                decimals: 3,
                            },
                            _ => CellValue::Number {
                                value: total.mass_kg,
                                decimals: 2,
                            },
                        };
                        self.push(row, LEADING_COLUMNS + index, 1, 1, value, TextAnchor::RIGHT_MIDDLE);
                    }
                }
                FooterKind::GradeMass => {
                    let mut column = LEADING_COLUMNS;
                    for index in 0..self.groups.len() {
                        let span = self.groups[index].diameters_mm.len();
                        let value = CellValue::Number {
                            value: self.totals.grades[index].mass_kg,
                            decimals: 2,
                        };
                        self.push(row, column, 1, span, value, TextAnchor::CENTER);
                        column += span;
                    }
                }
                FooterKind::TotalLength => {
                    let value = CellValue::Number {
                        value: self.totals.length.0,
                        decimals: 2,
                    };
                    self.push(row, LEADING_COLUMNS, 1, bar_count, value, TextAnchor::CENTER);
                }
                FooterKind::TotalMass => {
                    let value = CellValue::Number {
                        value: self.totals.mass_kg,
                        decimals: 2,
                    };
                    self.push(row, LEADING_COLUMNS, 1, bar_count, value, TextAnchor::CENTER);
                }
            }

            if remarks {
                self.push(row, last, 1, 1, CellValue::Empty, TextAnchor::LEFT_MIDDLE);
            }
        }
    }
}

/// `round(length/1000 × quantity × multiplier, 2)` metres
fn bar_length_m(entry: &SteelBillEntry, multiplier: u32) -> f64 {
    let length: Meters = Millimeters(f64::from(entry.length_mm)).into();
    round_to(length.0 * f64::from(entry.quantity) * f64::from(multiplier), 2)
}

fn plan_columns(groups: &[GradeGroup], options: &ScheduleOptions) -> Vec<ColumnSpec> {
    let mut kinds = vec![
        (ColumnKind::Mark, MARK_WIDTH),
        (ColumnKind::Diameter, DIAMETER_WIDTH),
        (ColumnKind::Length, LENGTH_WIDTH),
        (ColumnKind::QuantityPerElement, QUANTITY_WIDTH),
        (ColumnKind::QuantityTotal, QUANTITY_WIDTH),
    ];

    let bar_count: usize = groups.iter().map(|g| g.diameters_mm.len()).sum();
    if bar_count > 0 {
        let bar_width = BAR_BLOCK_WIDTH / bar_count as f64;
        for group in groups {
            for diameter in &group.diameters_mm {
                kinds.push((
                    ColumnKind::Bar {
                        grade: group.grade.clone(),
                        diameter_mm: *diameter,
                    },
                    bar_width,
                ));
            }
        }
    }
    if options.remarks {
        kinds.push((ColumnKind::Remarks, REMARKS_WIDTH));
    }

    let mut x = options.origin.x;
    kinds
        .into_iter()
        .map(|(kind, width)| {
            let width = width * options.scale;
            let column = ColumnSpec { kind, x, width };
            x += width;
            column
        })
        .collect()
}

fn plan_rows(bill: &SteelBill, with_footer: bool, options: &ScheduleOptions) -> Vec<RowSpec> {
    let mut kinds = vec![
        (RowKind::Title, TITLE_HEIGHT),
        (RowKind::GradeHeader, HEADER_HEIGHT),
        (RowKind::DiameterHeader, HEADER_HEIGHT),
    ];
    kinds.extend(bill.entries().iter().map(|e| (RowKind::Mark(e.mark), ROW_HEIGHT)));
    if with_footer {
        kinds.extend(FooterKind::ALL.iter().map(|k| (RowKind::Footer(*k), ROW_HEIGHT)));
    }

    let mut y = options.origin.y;
    kinds
        .into_iter()
        .map(|(kind, height)| {
            let height = height * options.scale;
            let row = RowSpec { kind, y, height };
            y -= height;
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill() -> SteelBill {
        let mut bill = SteelBill::new();
        bill.record("B-1", 20, 2, 4660, SteelGrade::B500SP);
        bill.record("B-1", 12, 3, 3890, SteelGrade::B500SP);
        bill.record("B-1", 8, 14, 1380, SteelGrade::B500A);
        bill
    }

    fn options(multiplier: u32) -> ScheduleOptions {
        ScheduleOptions::new("Bending schedule B-1", Point2::new(5000.0, 0.0), 20.0, multiplier)
    }

    #[test]
    fn test_grade_groups_first_seen_order() {
        let mut bill = bill();
        bill.record("B-1", 16, 2, 1000, SteelGrade::B500SP);
        let groups = group_by_grade(&bill);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].grade, SteelGrade::B500SP);
        assert_eq!(groups[0].diameters_mm, vec![20, 12, 16]);
        assert_eq!(groups[1].diameters_mm, vec![8]);
    }

    #[test]
    fn test_column_plan() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        assert_eq!(table.columns.len(), LEADING_COLUMNS + 3);
        // bar block split evenly
        for column in &table.columns[LEADING_COLUMNS..] {
            assert!((column.width - 20.0 * 20.0).abs() < 1e-9);
        }
        assert!((table.width() - (61.0 + 60.0) * 20.0).abs() < 1e-9);
        assert!((table.columns[0].x - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_row_plan() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        // title + 2 header rows + 3 marks + 6 footer rows
        assert_eq!(table.rows.len(), 12);
        assert_eq!(table.rows[3].kind, RowKind::Mark(1));
        assert!((table.rows[1].y - -160.0).abs() < 1e-9);
        assert!((table.height() - (8.0 + 10.0 * 5.0 + 5.0) * 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_values_and_placeholder() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        let value = table.bar_value(1, &SteelGrade::B500SP, 20).unwrap();
        assert_eq!(value.to_string(), "9.32");
        let value = table.bar_value(3, &SteelGrade::B500A, 8).unwrap();
        assert_eq!(value.number(), Some(19.32));

        let placeholder = table.bar_value(1, &SteelGrade::B500A, 8).unwrap();
        assert_eq!(*placeholder, CellValue::NotApplicable);
        assert_eq!(placeholder.to_string(), "-");
    }

    #[test]
    fn test_multiplier_scales_linearly() {
        let single = BendingScheduleTable::build(&bill(), &options(1));
        let triple = BendingScheduleTable::build(&bill(), &options(3));

        for entry in bill().entries() {
            let one = single.bar_value(entry.mark, &entry.grade, entry.diameter_mm).unwrap();
            let three = triple.bar_value(entry.mark, &entry.grade, entry.diameter_mm).unwrap();
            let (one, three) = (one.number().unwrap(), three.number().unwrap());
            assert!((three - 3.0 * one).abs() < 1e-9, "mark {}: {three} vs {one}", entry.mark);
        }
        let row = triple.row_of(RowKind::Mark(3)).unwrap();
        assert_eq!(triple.cell(row, 4).unwrap().value.to_string(), "42");
    }

    #[test]
    fn test_totals() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        let totals = &table.totals;
        assert_eq!(totals.columns.len(), 3);
        assert_eq!(totals.columns[0].length, Meters(9.32));
        assert_eq!(totals.columns[1].length, Meters(11.67));
        assert_eq!(totals.columns[2].length, Meters(19.32));
        assert_eq!(totals.columns[2].unit_mass, KgPerMeter(0.395));

        // 9.32 × 2.466 = 22.98, 11.67 × 0.888 = 10.36
        assert!((totals.columns[0].mass_kg - 22.98).abs() < 1e-9);
        assert!((totals.grades[0].mass_kg - 33.34).abs() < 1e-9);
        assert!((totals.length.0 - 40.31).abs() < 1e-9);
        let grades: f64 = totals.grades.iter().map(|g| g.mass_kg).sum();
        assert!((totals.mass_kg - grades).abs() < 1e-6);
    }

    #[test]
    fn test_footer_cells() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        let row = table.row_of(RowKind::Footer(FooterKind::UnitMass)).unwrap();
        assert_eq!(table.cell(row, LEADING_COLUMNS).unwrap().value.to_string(), "2.466");

        let row = table.row_of(RowKind::Footer(FooterKind::GradeMass)).unwrap();
        let grade_cell = table.cell(row, LEADING_COLUMNS).unwrap();
        assert_eq!(grade_cell.column_span, 2);

        let row = table.row_of(RowKind::Footer(FooterKind::TotalLength)).unwrap();
        let total = table.cell(row, LEADING_COLUMNS).unwrap();
        assert_eq!(total.column_span, 3);
        assert_eq!(total.value.to_string(), "40.31");
    }

    #[test]
    fn test_empty_bill() {
        let table = BendingScheduleTable::build(&SteelBill::new(), &options(1));
        assert!(table.groups.is_empty());
        assert_eq!(table.columns.len(), LEADING_COLUMNS);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.totals, ScheduleTotals::default());
    }

    #[test]
    fn test_remarks_column() {
        let mut opts = options(1);
        opts.remarks = true;
        let table = BendingScheduleTable::build(&bill(), &opts);
        assert_eq!(table.columns.last().unwrap().kind, ColumnKind::Remarks);
        let header = table.cell(1, table.columns.len() - 1).unwrap();
        assert_eq!(header.row_span, 2);
    }

    #[test]
    fn test_project_multipliers() {
        let mut bill = bill();
        bill.record("B-2", 20, 2, 4660, SteelGrade::B500SP);
        let mut opts = options(1);
        opts.element_multipliers.insert("B-2".to_string(), 4);
        let table = BendingScheduleTable::build(&bill, &opts);
        assert_eq!(table.bar_value(4, &SteelGrade::B500SP, 20).unwrap().number(), Some(37.28));
        assert_eq!(table.bar_value(1, &SteelGrade::B500SP, 20).unwrap().number(), Some(9.32));
    }

    #[test]
    fn test_text_cells() {
        let table = BendingScheduleTable::build(&bill(), &options(1));
        let title = table.cells[0].text_cell(20.0).unwrap();
        assert_eq!(title.anchor, TextAnchor::LEFT_MIDDLE);
        assert!((title.location.x - 5020.0).abs() < 1e-9);
        assert!((title.location.y - -80.0).abs() < 1e-9);
        assert!((title.height - 50.0).abs() < 1e-9);
        assert_eq!(table.cells[0].outline().len(), 4);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let first = BendingScheduleTable::build(&bill(), &options(2));
        let second = BendingScheduleTable::build(&bill(), &options(2));
        assert_eq!(first, second);

        let json = serde_json::to_string(&first).unwrap();
        assert_eq!(json, serde_json::to_string(&second).unwrap());
        let restored: BendingScheduleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&restored).unwrap(), json);
    }
}
