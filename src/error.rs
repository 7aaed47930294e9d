//! Application error type.
//!
//! Every failure carries the process exit code the `lum` binary reports, so
//! `main` can stay a one-line match:
//!
//! - `2`: input/config/output problems (nothing was fitted)
//! - `3`: data that cannot support the requested model
//! - `4`: numerical or rendering failures

use std::path::PathBuf;

use crate::domain::ModelKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to load data from '{}': {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{} model needs at least {params} points, got {points}", kind.display_name())]
    InsufficientData {
        kind: ModelKind,
        points: usize,
        params: usize,
    },

    #[error("{} model domain error: {reason}", kind.display_name())]
    Domain { kind: ModelKind, reason: String },

    #[error("{} fit did not converge: {reason}", kind.display_name())]
    FitDidNotConverge { kind: ModelKind, reason: String },

    #[error("Chart rendering failed: {0}")]
    Plot(String),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn not_converged(kind: ModelKind, reason: impl Into<String>) -> Self {
        Self::FitDidNotConverge {
            kind,
            reason: reason.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::DataLoad { .. } | AppError::InvalidConfig(_) | AppError::Io { .. } => 2,
            AppError::InsufficientData { .. } | AppError::Domain { .. } => 3,
            AppError::FitDidNotConverge { .. } | AppError::Plot(_) | AppError::Terminal(_) => 4,
        }
    }
}
