use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use rebar_core::drafting::DrawingReport;

use crate::commands::draw::write_summary;
use crate::input;
use crate::OutputFormat;

/// Plans every element; nothing is written.
pub fn execute(file: &Path, format: OutputFormat) -> Result<()> {
    let project = input::load(file)?;
    let reports: Vec<DrawingReport> = project.plan_all()?.into_iter().map(|p| p.report).collect();

    let mut writer = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", serde_json::to_string_pretty(&reports)?)?;
        }
        OutputFormat::Text => {
            write_summary(&mut writer, &reports)?;
            writeln!(writer, "{} element(s) OK", reports.len())?;
        }
    }

    Ok(())
}
