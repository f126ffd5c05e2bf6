//! Core Types and Trait Definitions for ingr-merge
//!
//! Defines the data contracts between the pipeline stages:
//! - **Parsers:** `StatisticalParser` (batch) and `GrammarParser` (single line)
//! - **Candidates:** one `Candidate` per parser per description
//! - **Output:** `MergedRecord`, the canonical reconciled ingredient
//!
//! Parser traits are transport-agnostic: an in-process implementation, an RPC
//! client and a subprocess wrapper all plug in the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Candidate Records
// ============================================================================

/// One parser's structured guess for a description
///
/// `parser` is the provenance tag copied onto any field this candidate wins.
/// `description` is the normalized input and is identical across both
/// candidates of a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub parser: String,
    pub description: String,
    pub product: Option<String>,
    pub quantity: Option<f64>,
    pub units: Option<String>,
}

impl Candidate {
    /// Create a candidate with no field values
    pub fn empty(parser: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            description: description.into(),
            product: None,
            quantity: None,
            units: None,
        }
    }

    /// True if both a quantity and a non-empty unit are present
    pub fn has_measure(&self) -> bool {
        self.quantity.is_some() && self.units.as_deref().is_some_and(|u| !u.is_empty())
    }
}

// ============================================================================
// Merged Record
// ============================================================================

/// Product name with provenance, nested under the `product` key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductField {
    pub product: String,
    /// `None` when the chosen product text is empty
    pub product_parser: Option<String>,
}

/// Canonical reconciled ingredient
///
/// Fields without a chosen value are omitted from JSON; callers treat a
/// missing key as "unknown", not as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductField>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_parser: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_parser: Option<String>,
}

impl MergedRecord {
    /// Record carrying only the description (fully unparseable line)
    pub fn bare(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            product: None,
            quantity: None,
            quantity_parser: None,
            units: None,
            units_parser: None,
        }
    }
}

// ============================================================================
// Statistical Parser
// ============================================================================

/// Raw quantity as emitted by the statistical parser (usually text)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Text(String),
    Number(f64),
}

impl RawQuantity {
    /// Quantity as text, suitable for the quantity normalizer
    pub fn as_text(&self) -> String {
        match self {
            RawQuantity::Text(text) => text.clone(),
            RawQuantity::Number(value) => value.to_string(),
        }
    }
}

/// One statistical parser output item (any field may be missing or null)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticalGuess {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub qty: Option<RawQuantity>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Batch translation of descriptions into structured guesses
///
/// Contract: the returned sequence is parallel to the input, same length and
/// same order. Callers pair results by position.
pub trait StatisticalParser: Send + Sync {
    /// Provenance tag for candidates built from this parser
    fn name(&self) -> &str;

    /// Parse a whole batch in one call
    fn parse_batch(&self, descriptions: &[String]) -> Result<Vec<StatisticalGuess>, ParserError>;
}

// ============================================================================
// Grammar Parser
// ============================================================================

/// Structured guess from the grammar parser
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GrammarGuess {
    #[serde(default)]
    pub ingredient: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Grammar parse failure, carrying the character offset where parsing broke
#[derive(Debug, Clone, PartialEq, Error)]
#[error("grammar parse failed{}: {message}", column_suffix(.offset))]
pub struct GrammarFailure {
    /// Character (not byte) offset into the description, if reported
    pub offset: Option<usize>,
    pub message: String,
}

impl GrammarFailure {
    pub fn at(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub fn without_offset(message: impl Into<String>) -> Self {
        Self {
            offset: None,
            message: message.into(),
        }
    }
}

fn column_suffix(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at column {o}")).unwrap_or_default()
}

/// Single-description grammar parser
pub trait GrammarParser: Send + Sync {
    /// Provenance tag for candidates built from this parser
    fn name(&self) -> &str;

    /// Parse one description
    fn parse(&self, description: &str) -> Result<GrammarGuess, GrammarFailure>;
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Statistical parser (collaborator) failure
#[derive(Debug, Error)]
pub enum ParserError {
    /// Failed to start the parser process
    #[error("failed to start parser '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error talking to the parser
    #[error("parser I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parser exited unsuccessfully
    #[error("parser exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    /// Output was not the expected JSON
    #[error("failed to parse parser output: {0}")]
    Json(String),

    /// Input the transport cannot carry (e.g. embedded newline)
    #[error("invalid parser input: {0}")]
    InvalidInput(String),

    /// Output length differs from input length (pairing impossible)
    #[error("parser returned {actual} results for {expected} descriptions")]
    LengthMismatch { expected: usize, actual: usize },
}
