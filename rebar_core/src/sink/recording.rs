//! In-memory sink that keeps every call.
//!
//! Used by tests to inspect what a drafting run emitted, and by the CLI to
//! export the emitted primitives as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    DimStyleId, DimensionStyleOptions, DrawingSink, Handle, LayerId, LinearDimension, LineStyle, PageSetup,
    SinkTables, TextCell, TextStyleId,
};
use crate::errors::{DraftError, DraftResult};
use crate::file_io;
use crate::geometry::{Point2, Waypoint};

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity")]
pub enum RecordedEntity {
    Polyline {
        points: Vec<Waypoint>,
        closed: bool,
        width: f64,
        layer: LayerId,
    },
    Hatch {
        paths: Vec<Vec<Point2>>,
        pattern: String,
        scale: f64,
        layer: LayerId,
    },
    Dimension {
        dimension: LinearDimension,
        style: DimStyleId,
        layer: LayerId,
    },
    Text {
        cell: TextCell,
        style: TextStyleId,
        layer: LayerId,
    },
}

impl RecordedEntity {
    pub fn layer(&self) -> LayerId {
        match self {
            RecordedEntity::Polyline { layer, .. }
            | RecordedEntity::Hatch { layer, .. }
            | RecordedEntity::Dimension { layer, .. }
            | RecordedEntity::Text { layer, .. } => *layer,
        }
    }
}

/// Sink that records definitions and entities in call order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSink {
    pub tables: SinkTables,
    pub entities: Vec<(Handle, RecordedEntity)>,
    #[serde(skip)]
    entity_limit: Option<usize>,
    #[serde(skip)]
    persisted: Vec<PathBuf>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// A sink that refuses entities beyond `limit`, like a full container.
    pub fn with_entity_limit(limit: usize) -> Self {
        RecordingSink {
            entity_limit: Some(limit),
            ..RecordingSink::default()
        }
    }

    fn push(&mut self, operation: &str, entity: RecordedEntity) -> DraftResult<Handle> {
        self.tables.layer(entity.layer())?;
        if let Some(limit) = self.entity_limit {
            if self.entities.len() >= limit {
                return Err(DraftError::sink_failure(operation, format!("entity limit of {limit} reached")));
            }
        }
        let handle = Handle(self.entities.len() as u64 + 1);
        self.entities.push((handle, entity));
        Ok(handle)
    }

    /// Entities placed on the layer with the given name
    pub fn entities_on(&self, layer_name: &str) -> Vec<&RecordedEntity> {
        let Some(index) = self.tables.layers.iter().position(|l| l.name == layer_name) else {
            return Vec::new();
        };
        self.entities
            .iter()
            .map(|(_, e)| e)
            .filter(|e| e.layer() == LayerId(index))
            .collect()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &LinearDimension> {
        self.entities.iter().filter_map(|(_, e)| match e {
            RecordedEntity::Dimension { dimension, .. } => Some(dimension),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextCell> {
        self.entities.iter().filter_map(|(_, e)| match e {
            RecordedEntity::Text { cell, .. } => Some(cell),
            _ => None,
        })
    }

    /// Paths passed to [`DrawingSink::persist`]
    pub fn persisted(&self) -> &[PathBuf] {
        &self.persisted
    }
}

impl DrawingSink for RecordingSink {
    fn define_layer(&mut self, name: &str, color: u8, line_style: Option<LineStyle>) -> DraftResult<LayerId> {
        self.tables.add_layer(name, color, line_style)
    }

    fn define_text_style(&mut self, name: &str, font: &str) -> DraftResult<TextStyleId> {
        self.tables.add_text_style(name, font)
    }

    fn define_dimension_style(&mut self, name: &str, options: &DimensionStyleOptions) -> DraftResult<DimStyleId> {
        self.tables.add_dim_style(name, options)
    }

    fn define_page(&mut self, page: &PageSetup) -> DraftResult<()> {
        self.tables.add_page(page)
    }

    fn add_polyline(&mut self, points: &[Waypoint], closed: bool, width: f64, layer: LayerId) -> DraftResult<Handle> {
        if points.len() < 2 {
            return Err(DraftError::sink_failure("add_polyline", "a polyline needs at least two points"));
        }
        self.push(
            "add_polyline",
            RecordedEntity::Polyline {
                points: points.to_vec(),
                closed,
                width,
                layer,
            },
        )
    }

    fn add_hatched_region(
        &mut self,
        paths: &[Vec<Point2>],
        pattern: &str,
        scale: f64,
        layer: LayerId,
    ) -> DraftResult<Handle> {
        self.push(
            "add_hatched_region",
            RecordedEntity::Hatch {
                paths: paths.to_vec(),
                pattern: pattern.to_string(),
                scale,
                layer,
            },
        )
    }

    fn add_linear_dimension(
        &mut self,
        dimension: &LinearDimension,
        style: DimStyleId,
        layer: LayerId,
    ) -> DraftResult<Handle> {
        self.tables.dim_style(style)?;
        self.push(
            "add_linear_dimension",
            RecordedEntity::Dimension {
                dimension: dimension.clone(),
                style,
                layer,
            },
        )
    }

    fn add_text_cell(&mut self, cell: &TextCell, style: TextStyleId, layer: LayerId) -> DraftResult<Handle> {
        self.tables.text_style(style)?;
        self.push(
            "add_text_cell",
            RecordedEntity::Text {
                cell: cell.clone(),
                style,
                layer,
            },
        )
    }

    fn persist(&mut self, path: &Path) -> DraftResult<()> {
        let json = serde_json::to_string_pretty(&*self)?;
        file_io::write_atomic(path, json.as_bytes())?;
        self.persisted.push(path.to_path_buf());
        Ok(())
    }
}
