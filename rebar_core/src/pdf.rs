//! # PDF Export
//!
//! Prints bending schedules to PDF using Typst.
//!
//! ## Architecture
//!
//! - Typst templates are embedded as string constants
//! - The laid-out [`BendingScheduleTable`] is converted cell by cell into a
//!   Typst `table`, keeping its spans and alignment
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use rebar_core::config::{BeamConfiguration, BeamParameters};
//! use rebar_core::drafting::{self, DraftingSettings};
//! use rebar_core::pdf::render_schedule_pdf;
//!
//! let beam = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
//! let planned = drafting::plan(&beam, &DraftingSettings::default()).unwrap();
//! let pdf = render_schedule_pdf(&planned.report.schedule, "Jane Engineer", "25-001").unwrap();
//! std::fs::write("B-1_schedule.pdf", pdf).unwrap();
//! ```

use chrono::Utc;
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::drafting::DrawingReport;
use crate::errors::{DraftError, DraftResult};
use crate::project::Project;
use crate::schedule::BendingScheduleTable;
use crate::sink::{HorizontalAnchor, VerticalAnchor};

/// Fonts bundled with typst-assets, parsed once per process
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    let mut fonts = Vec::new();
    for font_bytes in typst_assets::fonts() {
        let buffer = Bytes::new(font_bytes.to_vec());
        for font in Font::iter(buffer) {
            fonts.push(font);
        }
    }
    log::debug!("pdf: loaded {} bundled fonts", fonts.len());
    fonts
});

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts = FONTS.clone();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// PDF Templates
// ============================================================================

/// Page setup shared by every document
const PAGE_PREAMBLE: &str = r##"
#set page(
  paper: "a4",
  flipped: true,
  margin: (top: 15mm, bottom: 15mm, left: 15mm, right: 15mm),
  header: align(right)[
    #text(size: 8pt, fill: gray)[Reinforcement Bending Schedule]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 8pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 8pt)[Page #counter(page).display()]],
      align(right)[#text(size: 8pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 9pt)
"##;

/// Typst template for a single schedule
const SCHEDULE_TEMPLATE: &str = r##"
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 10pt, radius: 4pt)[
    #text(size: 16pt, weight: "bold")[{{TITLE}}]
  ]
]

#v(8pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 2pt,
  [Engineer:], [{{ENGINEER}}],
  [Job ID:], [{{JOB_ID}}],
  [Date:], [{{DATE}}],
)

#v(8pt)

{{SCHEDULE}}

#v(8pt)

*Total steel mass:* {{TOTAL_MASS}} kg
"##;

/// Typst template for the element summary of a project
const ELEMENTS_TEMPLATE: &str = r##"
#pagebreak()

== Elements

#table(
  columns: (auto, auto, auto, auto, auto, 1fr),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, right, right, right, left),
  table.header([*Element*], [*Count*], [*Stirrups*], [*Spacing (mm)*], [*Marks*], [*Dimension chain*]),
{{ROWS}}
)
"##;

// ============================================================================
// Rendering
// ============================================================================

/// Render one bending schedule to PDF.
///
/// # Arguments
///
/// * `table` - Laid-out schedule, as returned by the drafting pipeline
/// * `engineer` - Name printed in the title block
/// * `job_id` - Job number printed in the title block and footer
pub fn render_schedule_pdf(table: &BendingScheduleTable, engineer: &str, job_id: &str) -> DraftResult<Vec<u8>> {
    let source = schedule_source(table, engineer, job_id);
    compile(source)
}

/// Render the combined schedule of a project, followed by a summary of
/// its elements.
///
/// Fails if the project has no elements.
pub fn render_project_pdf(project: &Project, reports: &[DrawingReport]) -> DraftResult<Vec<u8>> {
    if reports.is_empty() {
        return Err(DraftError::Internal {
            message: "Project has no elements to export".to_string(),
        });
    }

    let table = project.schedule(reports);
    let mut source = schedule_source(&table, &project.meta.engineer, &project.meta.job_id);

    let rows = reports
        .iter()
        .map(|report| {
            let count = project
                .find_by_name(&report.element)
                .map(|(_, element)| element.element_count())
                .unwrap_or(1);
            format!(
                "  [{}], [{}], [{}], [{}], [{}], [{:?}],",
                escape_typst(&report.element),
                count,
                report.layout.stirrup_count(),
                report.layout.secondary_spacing_mm,
                report.bill.len(),
                report.chain.pattern
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    source.push_str(&ELEMENTS_TEMPLATE.replace("{{ROWS}}", &rows));

    compile(source)
}

fn schedule_source(table: &BendingScheduleTable, engineer: &str, job_id: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let job_id = escape_typst(job_id);

    let mut source = PAGE_PREAMBLE
        .replace("{{JOB_ID}}", &job_id)
        .replace("{{DATE}}", &date);
    source.push_str(
        &SCHEDULE_TEMPLATE
            .replace("{{TITLE}}", &escape_typst(&table.options.title))
            .replace("{{ENGINEER}}", &escape_typst(engineer))
            .replace("{{JOB_ID}}", &job_id)
            .replace("{{DATE}}", &date)
            .replace("{{SCHEDULE}}", &schedule_table(table))
            .replace("{{TOTAL_MASS}}", &format!("{:.2}", table.totals.mass_kg)),
    );
    source
}

/// Typst `table` reproducing the schedule grid.
///
/// Column widths keep the drawn proportions; every cell is placed at its
/// explicit grid position so spans survive.
fn schedule_table(table: &BendingScheduleTable) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("{:.3}fr", c.width))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    out.push_str("#table(\n");
    out.push_str(&format!("  columns: ({columns},),\n"));
    out.push_str("  inset: 4pt,\n  stroke: 0.5pt,\n");
    for cell in &table.cells {
        // title row is set in bold, like the drawn one's larger box
        let text = escape_typst(&cell.value.to_string());
        let body = if cell.row == 0 { format!("*{text}*") } else { text };
        out.push_str(&format!(
            "  table.cell(x: {}, y: {}, colspan: {}, rowspan: {}, align: {})[{}],\n",
            cell.column,
            cell.row,
            cell.column_span,
            cell.row_span,
            typst_alignment(cell.anchor.horizontal, cell.anchor.vertical),
            body
        ));
    }
    out.push_str(")\n");
    out
}

fn typst_alignment(horizontal: HorizontalAnchor, vertical: VerticalAnchor) -> &'static str {
    match (horizontal, vertical) {
        (HorizontalAnchor::Start, VerticalAnchor::Top) => "left + top",
        (HorizontalAnchor::Start, VerticalAnchor::Middle) => "left + horizon",
        (HorizontalAnchor::Start, VerticalAnchor::Bottom) => "left + bottom",
        (HorizontalAnchor::Center, VerticalAnchor::Top) => "center + top",
        (HorizontalAnchor::Center, VerticalAnchor::Middle) => "center + horizon",
        (HorizontalAnchor::Center, VerticalAnchor::Bottom) => "center + bottom",
        (HorizontalAnchor::End, VerticalAnchor::Top) => "right + top",
        (HorizontalAnchor::End, VerticalAnchor::Middle) => "right + horizon",
        (HorizontalAnchor::End, VerticalAnchor::Bottom) => "right + bottom",
    }
}

fn compile(source: String) -> DraftResult<Vec<u8>> {
    let world = PdfWorld::new(source);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        DraftError::Internal {
            message: format!("Typst compilation failed: {}", error_msgs.join("; ")),
        }
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        DraftError::Internal {
            message: format!("PDF rendering failed: {}", error_msgs.join("; ")),
        }
    })?;

    log::info!("pdf: rendered {} bytes", pdf_bytes.len());
    Ok(pdf_bytes)
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}
