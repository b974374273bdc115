//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::solver::SolveStatus;

/// Everything that can end a planning run.
///
/// All variants are terminal: no partial plan is ever returned alongside one.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Missing or malformed GHG-intensity data.
    #[error("intensity data error: {0}")]
    Data(String),

    /// A physical or tariff constant is out of range; raised before any
    /// variable is declared.
    #[error("model build error: {0}")]
    ModelBuild(String),

    /// The solver finished without an optimal assignment.
    #[error("solver finished with status {0}")]
    Solver(SolveStatus),

    /// The solved assignment does not match the declared model shape.
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;
