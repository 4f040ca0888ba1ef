//! The module contains the errors the engine can throw.
//!
//! The engine never clamps or silently corrects a budget: anything that would
//! break the dashboard invariants is reported as one of these errors and left
//! to the caller.
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid household: {0}")]
    InvalidHousehold(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),
}
