//! Reporting utilities: equation strings and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting and inversion code stays free of presentation details
//! - output changes are localized (console lines are what lab scripts grep)

pub mod equation;
pub mod format;

pub use equation::*;
pub use format::*;
