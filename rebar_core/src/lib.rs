//! # rebar_core - Reinforced-Concrete Beam Drafting Engine
//!
//! `rebar_core` turns a handful of beam parameters into a complete
//! reinforcement drawing: elevation with stirrups and supports, bar detail
//! call-outs, cross-section, and a bending schedule with steel totals.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Plan, then emit**: geometry is computed in full before a drawing sink
//!   sees anything, so a rejected configuration never leaves half a drawing
//! - **Sink-agnostic**: the engine talks to a [`sink::DrawingSink`]; DXF and
//!   an in-memory recorder are bundled
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use rebar_core::config::{BeamConfiguration, BeamParameters};
//! use rebar_core::drafting::{self, DraftingSettings};
//! use rebar_core::sink::recording::RecordingSink;
//!
//! let beam = BeamConfiguration::new(BeamParameters::example("B-1")).unwrap();
//! let mut sink = RecordingSink::new();
//! let report = drafting::draw(&beam, &DraftingSettings::default(), &mut sink).unwrap();
//! assert_eq!(report.bill.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Beam parameters and validation
//! - [`geometry`] - Points, bends and bar paths
//! - [`spacing`] - Stirrup allocation along the span
//! - [`dimensions`] - Dimension chain selection
//! - [`bill`] - Deduplicated bill of reinforcement
//! - [`schedule`] - Bending schedule layout and totals
//! - [`drafting`] - The drawing pipeline
//! - [`sink`] - Drawing sink trait, DXF writer, recorder
//! - [`project`] - Multi-element project container
//! - [`pdf`] - Schedule printing via Typst
//! - [`units`] - Unit wrappers and rounding
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod bill;
pub mod config;
pub mod dimensions;
pub mod drafting;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod pdf;
pub mod project;
pub mod schedule;
pub mod sink;
pub mod spacing;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::{BeamConfiguration, BeamParameters};
pub use drafting::{draw, DraftingSettings, DrawingReport};
pub use errors::{DraftError, DraftResult};
pub use file_io::{load_project, save_project, FileLock};
pub use project::{Project, ProjectMetadata};
