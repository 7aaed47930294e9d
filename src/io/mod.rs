//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - fit JSON and reduced-curve CSV exports (`export`)
//! - seeded synthetic tables (`synth`)

pub mod export;
pub mod ingest;
pub mod synth;

pub use export::*;
pub use ingest::*;
pub use synth::*;
