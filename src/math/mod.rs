//! Mathematical utilities: grids, reductions and linear least squares.

pub mod grid;
pub mod ols;
pub mod stats;

pub use grid::*;
pub use ols::*;
pub use stats::*;
