//! # Project Data Structures
//!
//! The `Project` struct is the root container for a set of beam elements
//! drawn together. Projects serialize to `.rbp` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: DraftingSettings (page, scales, fonts, stirrup style)
//! └── elements: HashMap<Uuid, BeamConfiguration>
//! ```
//!
//! Element names must be unique within a project: they name the layers and
//! styles of each element in the shared drawing.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::config::{BeamConfiguration, BeamParameters};
//! use rebar_core::project::Project;
//!
//! let mut project = Project::new("Jane Engineer", "25-042", "ACME Corp");
//! let beam = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
//! project.add_element(beam).unwrap();
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("B-1"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bill::SteelBill;
use crate::config::BeamConfiguration;
use crate::drafting::{self, DraftingSettings, DrawingReport, PlannedDrawing};
use crate::errors::{DraftError, DraftResult};
use crate::schedule::{BendingScheduleTable, ScheduleOptions};
use crate::sink::DrawingSink;

/// Current schema version for .rbp files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, engineer, job info)
    pub meta: ProjectMetadata,

    /// Drawing conventions shared by all elements
    #[serde(default)]
    pub settings: DraftingSettings,

    /// Beam elements keyed by UUID
    pub elements: HashMap<Uuid, BeamConfiguration>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `engineer` - Name of the responsible engineer
    /// * `job_id` - Job/project number (e.g., "25-001")
    /// * `client` - Client name
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: DraftingSettings::default(),
            elements: HashMap::new(),
        }
    }

    /// Add a beam element and return its UUID.
    ///
    /// Fails if an element with the same name already exists.
    pub fn add_element(&mut self, element: BeamConfiguration) -> DraftResult<Uuid> {
        if self.find_by_name(element.name()).is_some() {
            return Err(DraftError::configuration(
                "name",
                element.name(),
                "An element with this name already exists in the project",
            ));
        }
        let id = Uuid::new_v4();
        self.elements.insert(id, element);
        self.touch();
        Ok(id)
    }

    /// Remove an element by UUID.
    ///
    /// Returns the removed element if it existed.
    pub fn remove_element(&mut self, id: &Uuid) -> Option<BeamConfiguration> {
        let element = self.elements.remove(id);
        if element.is_some() {
            self.touch();
        }
        element
    }

    pub fn get_element(&self, id: &Uuid) -> Option<&BeamConfiguration> {
        self.elements.get(id)
    }

    /// Element whose name matches `name`, ignoring ASCII case
    pub fn find_by_name(&self, name: &str) -> Option<(&Uuid, &BeamConfiguration)> {
        self.elements.iter().find(|(_, e)| e.name().eq_ignore_ascii_case(name))
    }

    /// Fails if two elements share a name, ignoring ASCII case.
    ///
    /// `add_element` keeps this true; files edited by hand may not.
    pub fn check_unique_names(&self) -> DraftResult<()> {
        let mut seen = std::collections::HashSet::new();
        for element in self.sorted_elements() {
            if !seen.insert(element.name().to_ascii_uppercase()) {
                return Err(DraftError::configuration(
                    "name",
                    element.name(),
                    "An element with this name already exists in the project",
                ));
            }
        }
        Ok(())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements ordered by name
    pub fn sorted_elements(&self) -> Vec<&BeamConfiguration> {
        let mut elements: Vec<&BeamConfiguration> = self.elements.values().collect();
        elements.sort_by(|a, b| a.name().cmp(b.name()));
        elements
    }

    /// Plan every element, in name order, without drawing anything.
    ///
    /// Fails if two elements would define the same layer, style or page
    /// name, e.g. the bar label style of `B` and the dimension style of
    /// `B_BAR`.
    pub fn plan_all(&self) -> DraftResult<Vec<PlannedDrawing>> {
        let planned = self
            .sorted_elements()
            .into_iter()
            .map(|element| drafting::plan(element, &self.settings))
            .collect::<DraftResult<Vec<_>>>()?;
        check_distinct_definitions(&planned)?;
        Ok(planned)
    }

    /// Draw every element into one sink, in name order.
    ///
    /// All elements are planned before the first one is emitted, so an
    /// element that cannot be planned leaves the sink untouched.
    pub fn draw_all(&self, sink: &mut dyn DrawingSink) -> DraftResult<Vec<DrawingReport>> {
        let planned = self.plan_all()?;

        let mut reports = Vec::with_capacity(planned.len());
        for drawing in planned {
            drawing.plan.emit(sink)?;
            log::info!("{}: {} primitives", drawing.report.element, drawing.report.primitive_count);
            reports.push(drawing.report);
        }
        Ok(reports)
    }

    /// Bending schedule covering every element of the project.
    ///
    /// Bills are merged in name order; each element's rows use its own
    /// element count.
    pub fn schedule(&self, reports: &[DrawingReport]) -> BendingScheduleTable {
        let mut bill = SteelBill::new();
        for report in reports {
            bill.extend(&report.bill);
        }

        let mut options = ScheduleOptions::new(
            format!("Bending schedule {}", self.meta.job_id),
            self.settings.schedule_offset,
            self.settings.dimension_scale,
            1,
        );
        options.remarks = self.settings.schedule_remarks;
        for element in self.elements.values() {
            options
                .element_multipliers
                .insert(element.name().to_string(), element.element_count());
        }
        BendingScheduleTable::build(&bill, &options)
    }
}

fn check_distinct_definitions(planned: &[PlannedDrawing]) -> DraftResult<()> {
    // DXF symbol tables ignore case
    let mut owners: HashMap<(&'static str, String), &str> = HashMap::new();
    for drawing in planned {
        let styles = &drawing.plan.styles;
        for (kind, name) in styles.definitions() {
            let key = (kind, name.to_ascii_uppercase());
            if let Some(owner) = owners.get(&key) {
                return Err(DraftError::configuration(
                    "name",
                    styles.element.as_str(),
                    format!("{kind} '{name}' is also defined by element '{owner}'"),
                ));
            }
            owners.insert(key, styles.element.as_str());
        }
    }
    Ok(())
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeamParameters;
    use crate::sink::recording::RecordingSink;

    fn beam(name: &str) -> BeamConfiguration {
        BeamConfiguration::new(BeamParameters::example(name)).unwrap()
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Test Engineer", "25-001", "Test Client");
        assert_eq!(project.meta.engineer, "Test Engineer");
        assert_eq!(project.meta.job_id, "25-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert!(project.elements.is_empty());
    }

    #[test]
    fn test_add_and_remove_element() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        let id = project.add_element(beam("B-1")).unwrap();
        assert_eq!(project.element_count(), 1);
        assert_eq!(project.get_element(&id).unwrap().name(), "B-1");

        assert!(project.remove_element(&id).is_some());
        assert!(project.remove_element(&id).is_none());
        assert_eq!(project.element_count(), 0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B-1")).unwrap();
        let err = project.add_element(beam("B-1")).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        let id = project.add_element(beam("B-1")).unwrap();

        let json = serde_json::to_string_pretty(&project).unwrap();
        let restored: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.meta.job_id, "25-001");
        assert_eq!(restored.get_element(&id), project.get_element(&id));
        assert_eq!(restored.settings, project.settings);
    }

    #[test]
    fn test_draw_all_in_name_order() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B-2")).unwrap();
        project.add_element(beam("B-1")).unwrap();

        let mut sink = RecordingSink::new();
        let reports = project.draw_all(&mut sink).unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.element.as_str()).collect();
        assert_eq!(names, vec!["B-1", "B-2"]);
        assert_eq!(sink.tables.layers[0].name, "B-1-Outline");
        assert_eq!(sink.tables.pages.len(), 2);
    }

    #[test]
    fn test_colliding_style_names_rejected_before_emitting() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B")).unwrap();
        project.add_element(beam("B_BAR")).unwrap();

        let err = project.plan_all().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("B_BAR_1_20"));

        let mut sink = RecordingSink::new();
        assert!(project.draw_all(&mut sink).is_err());
        assert!(sink.entities.is_empty());
        assert!(sink.tables.layers.is_empty());
        assert!(sink.tables.dim_styles.is_empty());
    }

    #[test]
    fn test_names_differing_in_case_rejected() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B-1")).unwrap();
        let err = project.add_element(beam("b-1")).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert_eq!(project.element_count(), 1);

        // A hand-edited file can still hold both
        project.elements.insert(Uuid::new_v4(), beam("b-1"));
        assert!(project.check_unique_names().is_err());

        let err = project.plan_all().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("also defined by element 'B-1'"));

        let mut sink = RecordingSink::new();
        assert!(project.draw_all(&mut sink).is_err());
        assert!(sink.entities.is_empty());
        assert!(sink.tables.layers.is_empty());
    }

    #[test]
    fn test_similar_names_without_collision() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B")).unwrap();
        project.add_element(beam("B_1")).unwrap();

        let mut sink = RecordingSink::new();
        let reports = project.draw_all(&mut sink).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(sink.tables.dim_styles.len(), 4);
    }

    #[test]
    fn test_project_schedule() {
        let mut project = Project::new("Engineer", "25-001", "Client");
        project.add_element(beam("B-1")).unwrap();
        let mut params = BeamParameters::example("B-2");
        params.element_count = 2;
        project.add_element(BeamConfiguration::new(params).unwrap()).unwrap();

        let mut sink = RecordingSink::new();
        let reports = project.draw_all(&mut sink).unwrap();
        let table = project.schedule(&reports);

        // same specifications, different elements: six marks
        assert_eq!(table.rows.iter().filter(|r| matches!(r.kind, crate::schedule::RowKind::Mark(_))).count(), 6);
        let b1 = table.bar_value(1, &crate::bill::SteelGrade::B500SP, 20).unwrap();
        let b2 = table.bar_value(4, &crate::bill::SteelGrade::B500SP, 20).unwrap();
        assert!((b2.number().unwrap() - 2.0 * b1.number().unwrap()).abs() < 1e-9);
    }
}
