//! Configuration errors surfaced when building the physics tables

use thiserror::Error;

/// A fatal problem with boot-time configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("type catalog is empty")]
    EmptyCatalog,

    #[error("type {index} has invalid mass {mass} (must be finite and > 0)")]
    InvalidMass { index: usize, mass: f32 },

    #[error("force matrix has {rows} rows, expected {expected} (one per type)")]
    MatrixRowCount { rows: usize, expected: usize },

    #[error("force matrix row {row} has {len} entries, expected {expected}")]
    MatrixRowLength {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("force matrix coefficient [{row}][{col}] is not finite")]
    NonFiniteCoefficient { row: usize, col: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn param(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name,
            reason: reason.into(),
        }
    }
}
