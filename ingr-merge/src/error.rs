//! Error types for ingr-merge
//!
//! Expected absence (no parse, no quantity) is never an error; it shows up as
//! omitted fields. Only two things reach the caller: a hard unit failure and
//! a collaborator failure.

use crate::types::ParserError;
use crate::units::UnitError;
use thiserror::Error;

/// Reconciliation error
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Winning quantity/unit pair has no base unit for its dimensionality
    #[error("'{description}': {source}")]
    NoBaseUnit {
        description: String,
        #[source]
        source: UnitError,
    },

    /// Statistical parser failed or broke its output contract
    #[error("statistical parser failed: {0}")]
    Parser(#[from] ParserError),
}

/// Result type for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;
