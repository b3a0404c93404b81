//! Planner error taxonomy
//!
//! Domain errors surfaced to the user. Loading failures keep their anyhow
//! context chain inside `PlannerError::Data`.

use thiserror::Error;

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Country has no row in one of the bounds reference tables
    #[error("unsupported country: '{country}' not found in reference table '{table}'")]
    UnsupportedCountry { country: String, table: String },

    /// Country name is not in the boundary collection
    #[error("unknown country: '{0}'")]
    UnknownCountry(String),

    #[error("no country selected")]
    NoCountrySelected,

    #[error("no available area defined")]
    NoAvailableArea,

    #[error("no project area drawn")]
    NoProjectArea,

    #[error("invalid weight for {factor}: {value} (expected 0-5)")]
    InvalidWeight { factor: String, value: u8 },

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("grid mismatch for layer '{layer}': expected {expected} pixels, got {actual}")]
    GridMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Data(#[from] anyhow::Error),
}

impl PlannerError {
    /// Precondition and validation failures the user can fix by acting again
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PlannerError::Data(_) | PlannerError::GridMismatch { .. })
    }
}
