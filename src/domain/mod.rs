//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed model set (`ModelKind`) and CLI model selection (`ModelSpec`)
//! - measurement tables and their reduction (`SampleSet`, `ReducedCurve`)
//! - fit outputs (`FitResult`, `FittedModel`)
//! - inversion requests/answers (`InversionTarget`, `Inversion`)
//! - the explicit run configuration (`RunConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
