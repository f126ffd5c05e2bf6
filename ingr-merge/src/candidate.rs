//! Candidate Adapter
//!
//! Maps each parser's raw output into a `Candidate` tagged with the parser's
//! provenance name.

use crate::quantity::parse_quantity;
use crate::types::{Candidate, GrammarFailure, GrammarGuess, GrammarParser, StatisticalGuess};
use tracing::{debug, warn};

/// Normalize a raw description: trimmed and lower-cased
pub fn normalize_description(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Adapt one statistical parser item for `description`
///
/// The description is the one sent at the same batch position; the parser's
/// `input` echo is only checked, never trusted as the key.
pub fn from_statistical(parser: &str, description: &str, guess: StatisticalGuess) -> Candidate {
    if let Some(echo) = guess.input.as_deref() {
        if echo.trim() != description {
            warn!(
                parser,
                description,
                echo,
                "Statistical parser echoed a different input"
            );
        }
    }

    Candidate {
        parser: parser.to_string(),
        description: description.to_string(),
        product: guess.name,
        quantity: guess.qty.and_then(|q| parse_quantity(&q.as_text())),
        units: guess.unit,
    }
}

/// Adapt a successful grammar parse for `description`
pub fn from_grammar(parser: &str, description: &str, guess: GrammarGuess) -> Candidate {
    Candidate {
        parser: parser.to_string(),
        description: description.to_string(),
        product: guess.ingredient,
        quantity: guess.amount,
        units: guess.unit,
    }
}

/// Run the grammar parser with one retry from the reported failure offset
///
/// 1. Parse the full description.
/// 2. On failure at offset `n`, parse the suffix starting at character `n`.
///
/// Returns `Err` with the last failure if neither attempt succeeded.
pub fn parse_with_offset_retry(
    parser: &dyn GrammarParser,
    description: &str,
) -> Result<GrammarGuess, GrammarFailure> {
    let failure = match parser.parse(description) {
        Ok(guess) => return Ok(guess),
        Err(failure) => failure,
    };

    let offset = failure.offset.ok_or_else(|| failure.clone())?;
    let suffix = char_suffix(description, offset).ok_or_else(|| failure.clone())?;

    debug!(
        description,
        offset,
        suffix,
        "Grammar parse failed, retrying from failure offset"
    );
    parser.parse(suffix)
}

/// Grammar candidate for `description`, absent if both attempts fail
pub fn grammar_candidate(parser: &dyn GrammarParser, description: &str) -> Option<Candidate> {
    match parse_with_offset_retry(parser, description) {
        Ok(guess) => Some(from_grammar(parser.name(), description, guess)),
        Err(failure) => {
            debug!(description, %failure, "No grammar candidate");
            None
        }
    }
}

/// Suffix of `text` starting at character offset `offset`
///
/// `None` when the offset is past the end or leaves nothing to parse.
fn char_suffix(text: &str, offset: usize) -> Option<&str> {
    let (start, _) = text.char_indices().nth(offset)?;
    let suffix = &text[start..];
    if suffix.trim().is_empty() {
        None
    } else {
        Some(suffix)
    }
}
