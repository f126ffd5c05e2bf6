//! ingr-merge library interface
//!
//! Reconciles two independent ingredient parsers into one canonical record
//! per description, then normalizes the measure to metric base units.

pub mod candidate;
pub mod error;
pub mod orchestrator;
pub mod parsers;
pub mod quantity;
pub mod reconciler;
pub mod types;
pub mod units;

pub use crate::error::{ReconcileError, ReconcileResult};
pub use crate::orchestrator::{merge, Reconciler, DEFAULT_NORMALIZER_TAG};
pub use crate::parsers::{CommandGrammarParser, CommandStatisticalParser};
pub use crate::quantity::parse_quantity;
pub use crate::types::{
    Candidate, GrammarFailure, GrammarGuess, GrammarParser, MergedRecord, ParserError,
    ProductField, StatisticalGuess, StatisticalParser,
};
pub use crate::units::{DimensionalAnalysis, UnitError, UnitNormalizer, UnitRegistry};
