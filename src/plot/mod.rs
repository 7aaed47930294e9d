//! PNG comparison charts (one per fitted model).

pub mod chart;

pub use chart::*;
