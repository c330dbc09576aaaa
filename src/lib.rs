//! Attenuator and beam-splitter characterization.
//!
//! Reads bench measurements from a workbook, derives decibel loss, detected
//! power or the FV/FB power ratio with propagated uncertainty, and charts
//! the result as PNG files or in an interactive viewer.

pub mod app;
pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod filename;
pub mod pipeline;
pub mod state;
pub mod ui;

pub use config::{ChannelDescriptor, Experiment, MissingSheetPolicy, RunConfig};
pub use error::{AnalysisError, DomainViolation};
pub use pipeline::{run, RunOutput};
