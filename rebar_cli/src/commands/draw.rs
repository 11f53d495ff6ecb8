use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rebar_core::drafting::DrawingReport;
use rebar_core::file_io;
use rebar_core::pdf;
use rebar_core::sink::dxf::DxfSink;
use rebar_core::sink::DrawingSink;

use crate::input;
use crate::lock;
use crate::OutputFormat;

pub fn execute(file: &Path, out_dir: &Path, with_pdf: bool, format: OutputFormat) -> Result<()> {
    let project = input::load(file)?;
    let stem = input::output_stem(file);

    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let dxf_path = out_dir.join(format!("{stem}.dxf"));
    let _dxf_lock = lock::acquire(&dxf_path)?;

    let mut sink = DxfSink::new();
    let reports = project.draw_all(&mut sink)?;
    sink.persist(&dxf_path)?;

    let pdf_path = if with_pdf {
        let path = out_dir.join(format!("{stem}_schedule.pdf"));
        let _pdf_lock = lock::acquire(&path)?;
        let bytes = pdf::render_project_pdf(&project, &reports)?;
        file_io::write_atomic(&path, &bytes)?;
        Some(path)
    } else {
        None
    };

    let mut writer = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "drawing": dxf_path,
                "schedule_pdf": pdf_path,
                "entities": sink.entity_count(),
                "elements": reports,
            });
            writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        OutputFormat::Text => {
            write_summary(&mut writer, &reports)?;
            writeln!(writer, "{} entities written to {}", sink.entity_count(), dxf_path.display())?;
            if let Some(path) = pdf_path {
                writeln!(writer, "Schedule written to {}", path.display())?;
            }
        }
    }

    Ok(())
}

pub fn write_summary(mut writer: impl Write, reports: &[DrawingReport]) -> io::Result<()> {
    for report in reports {
        writeln!(
            writer,
            "{:<12} {:>3} stirrups @ {} mm  {:?}  {} mark(s)",
            report.element,
            report.layout.stirrup_count(),
            report.layout.secondary_spacing_mm,
            report.chain.pattern,
            report.bill.len()
        )?;
    }
    Ok(())
}
