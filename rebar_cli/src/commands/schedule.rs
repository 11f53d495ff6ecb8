use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use rebar_core::drafting::DrawingReport;
use rebar_core::file_io;
use rebar_core::pdf;
use rebar_core::schedule::BendingScheduleTable;

use crate::input;
use crate::lock;
use crate::OutputFormat;

pub fn execute(file: &Path, pdf_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let project = input::load(file)?;
    let reports: Vec<DrawingReport> = project.plan_all()?.into_iter().map(|p| p.report).collect();
    let table = project.schedule(&reports);

    if let Some(path) = pdf_path {
        let _lock = lock::acquire(path)?;
        let bytes = pdf::render_project_pdf(&project, &reports)?;
        file_io::write_atomic(path, &bytes)?;
        log::info!("schedule written to {}", path.display());
    }

    let mut writer = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", serde_json::to_string_pretty(&table)?)?;
        }
        OutputFormat::Text => {
            write_table(&mut writer, &table)?;
        }
    }

    Ok(())
}

/// Plain-text rendition, one line per schedule row
fn write_table(mut writer: impl Write, table: &BendingScheduleTable) -> io::Result<()> {
    for row in 0..table.rows.len() {
        let line = table
            .cells
            .iter()
            .filter(|c| c.row == row)
            .map(|c| format!("{:>8}", c.value))
            .collect::<Vec<_>>()
            .join(" |");
        writeln!(writer, "{}", line.trim_end())?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total length: {:.2} m", table.totals.length.0)?;
    writeln!(writer, "Total mass:   {:.2} kg", table.totals.mass_kg)?;
    Ok(())
}
