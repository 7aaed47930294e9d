//! Luminance model implementations.
//!
//! Models are implemented as small, pure functions so that fitting, inversion
//! and chart code can stay generic over `ModelKind`.

pub mod model;

pub use model::*;
