//! `lumfit` library crate.
//!
//! The binary (`lum`) is a thin wrapper around this library so that:
//!
//! - fitting and inversion are testable without spawning processes
//! - the lab's analysis notebooks/scripts can reuse the models directly
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
