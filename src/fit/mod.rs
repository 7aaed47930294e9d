//! Curve fitting and inversion.
//!
//! Responsibilities:
//!
//! - fit one model kind by Levenberg–Marquardt (`fitter`)
//! - fit every requested kind and apply the failure policy (`batch`)
//! - invert a fitted model by grid search (`inversion`)

pub mod batch;
pub mod fitter;
pub mod inversion;

pub use batch::*;
pub use fitter::*;
pub use inversion::*;
