use std::path::Path;

use anyhow::{Context, Result};
use rebar_core::config::{BeamConfiguration, BeamParameters};
use rebar_core::file_io;
use rebar_core::project::Project;
use serde::Deserialize;

/// One beam or several, as accepted in a plain JSON input file
#[derive(Deserialize)]
#[serde(untagged)]
enum BeamInput {
    One(BeamParameters),
    Many(Vec<BeamParameters>),
}

/// Load a project file, or wrap loose beam parameters in a fresh project.
pub fn load(path: &Path) -> Result<Project> {
    if path.extension().is_some_and(|ext| ext == file_io::PROJECT_EXTENSION) {
        return file_io::load_project(path).with_context(|| format!("loading project {}", path.display()));
    }

    let content = file_io::read_to_string(path)?;
    let beams = match serde_json::from_str::<BeamInput>(&content)
        .with_context(|| format!("parsing beam parameters in {}", path.display()))?
    {
        BeamInput::One(params) => vec![params],
        BeamInput::Many(params) => params,
    };

    let job = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut project = Project::new("", job, "");
    for params in beams {
        let name = params.name.clone();
        let element = BeamConfiguration::new(params).with_context(|| format!("element {name}"))?;
        project.add_element(element)?;
    }
    log::debug!("loaded {} element(s) from {}", project.element_count(), path.display());
    Ok(project)
}

/// File stem used for outputs derived from `path`
pub fn output_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "drawing".to_string())
}
