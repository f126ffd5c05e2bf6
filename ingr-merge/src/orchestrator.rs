//! Merge Orchestrator
//!
//! Composes adapters, reconciler and unit normalizer:
//!
//! 1. One statistical batch call for all descriptions (order-paired)
//! 2. Per description: grammar candidate (with offset retry)
//! 3. Per description: field reconciliation, then unit normalization
//!
//! Normalization uses the quantity winner's magnitude and the units winner's
//! unit. A hard failure propagates. A soft failure retries once with the
//! losing candidate's own pair, and if that also fails the provisional
//! values stay as merged.

use crate::candidate::{from_statistical, grammar_candidate, normalize_description};
use crate::error::{ReconcileError, ReconcileResult};
use crate::reconciler::merge_fields;
use crate::types::{Candidate, GrammarParser, MergedRecord, ParserError, StatisticalParser};
use crate::units::{
    DimensionalAnalysis, MeasureSource, NormalizedUnits, UnitError, UnitNormalizer, UnitRegistry,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default provenance suffix for normalized fields
pub const DEFAULT_NORMALIZER_TAG: &str = "normalizer";

fn apply_units(record: &mut MergedRecord, normalized: NormalizedUnits) {
    record.quantity = Some(normalized.quantity);
    record.quantity_parser = Some(normalized.quantity_parser);
    record.units = Some(normalized.units);
    record.units_parser = Some(normalized.units_parser);
}

/// Merge two candidates for `description` into the canonical record
///
/// `a` is the statistical candidate, `b` the grammar candidate; either may be
/// absent. Fails only with a hard `UnitError::NoBaseUnit`.
pub fn merge(
    normalizer: &UnitNormalizer<'_>,
    description: &str,
    a: Option<&Candidate>,
    b: Option<&Candidate>,
) -> Result<MergedRecord, UnitError> {
    let (mut record, winners) = merge_fields(description, a, b);

    let quantity_winner = winners.quantity.pick(a, b);
    let units_winner = winners.units.pick(a, b);
    let source = MeasureSource {
        quantity: quantity_winner.and_then(|c| c.quantity),
        quantity_parser: quantity_winner.map(|c| c.parser.as_str()).unwrap_or_default(),
        units: units_winner.and_then(|c| c.units.as_deref()),
        units_parser: units_winner.map(|c| c.parser.as_str()).unwrap_or_default(),
    };

    let err = match normalizer.normalize(source) {
        Ok(normalized) => {
            apply_units(&mut record, normalized);
            return Ok(record);
        }
        Err(err) if err.is_hard() => return Err(err),
        Err(err) => err,
    };

    let loser = winners
        .units
        .other()
        .pick(a, b)
        .filter(|candidate| candidate.has_measure());
    let Some(loser) = loser else {
        debug!(description, %err, "Units left un-normalized");
        return Ok(record);
    };

    let fallback = MeasureSource {
        quantity: loser.quantity,
        quantity_parser: &loser.parser,
        units: loser.units.as_deref(),
        units_parser: &loser.parser,
    };
    match normalizer.normalize(fallback) {
        Ok(normalized) => {
            debug!(
                description,
                parser = %loser.parser,
                "Normalized using the losing candidate's measure"
            );
            apply_units(&mut record, normalized);
        }
        Err(fallback_err) => {
            warn!(
                description,
                %err,
                %fallback_err,
                "Unit normalization failed for both candidates, keeping merged values"
            );
        }
    }
    Ok(record)
}

/// Batch reconciliation service over pluggable collaborators
pub struct Reconciler {
    statistical: Box<dyn StatisticalParser>,
    grammar: Box<dyn GrammarParser>,
    analysis: Arc<dyn DimensionalAnalysis>,
    normalizer_tag: String,
}

impl Reconciler {
    /// Reconciler using the shared built-in unit registry
    pub fn new(statistical: Box<dyn StatisticalParser>, grammar: Box<dyn GrammarParser>) -> Self {
        Self {
            statistical,
            grammar,
            analysis: UnitRegistry::shared_handle(),
            normalizer_tag: DEFAULT_NORMALIZER_TAG.to_string(),
        }
    }

    /// Replace the dimensional-analysis service
    pub fn with_analysis(mut self, analysis: Arc<dyn DimensionalAnalysis>) -> Self {
        self.analysis = analysis;
        self
    }

    /// Replace the provenance suffix of normalized fields
    pub fn with_normalizer_tag(mut self, tag: impl Into<String>) -> Self {
        self.normalizer_tag = tag.into();
        self
    }

    /// Reconcile one description
    pub fn reconcile(&self, description: &str) -> ReconcileResult<MergedRecord> {
        let mut records = self.reconcile_all(&[description.to_string()])?;
        records.pop().ok_or_else(|| {
            ParserError::LengthMismatch {
                expected: 1,
                actual: 0,
            }
            .into()
        })
    }

    /// Reconcile a batch, failing on the first hard unit failure
    ///
    /// Output order matches input order. The statistical parser is called
    /// once for the whole batch.
    pub fn reconcile_all(&self, descriptions: &[String]) -> ReconcileResult<Vec<MergedRecord>> {
        let statistical = self.statistical_candidates(descriptions)?;
        let normalizer = UnitNormalizer::new(self.analysis.as_ref(), &self.normalizer_tag);

        statistical
            .iter()
            .map(|candidate| self.merge_one(&normalizer, candidate))
            .collect()
    }

    /// Reconcile a batch, reporting hard unit failures per description
    ///
    /// Only a collaborator failure aborts the whole batch.
    pub fn reconcile_each(
        &self,
        descriptions: &[String],
    ) -> ReconcileResult<Vec<ReconcileResult<MergedRecord>>> {
        let statistical = self.statistical_candidates(descriptions)?;
        let normalizer = UnitNormalizer::new(self.analysis.as_ref(), &self.normalizer_tag);

        Ok(statistical
            .iter()
            .map(|candidate| self.merge_one(&normalizer, candidate))
            .collect())
    }

    fn statistical_candidates(&self, descriptions: &[String]) -> ReconcileResult<Vec<Candidate>> {
        if descriptions.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = descriptions
            .iter()
            .map(|d| normalize_description(d))
            .collect();

        info!(
            count = normalized.len(),
            parser = self.statistical.name(),
            "Running statistical parser"
        );
        let guesses = self.statistical.parse_batch(&normalized)?;
        if guesses.len() != normalized.len() {
            return Err(ParserError::LengthMismatch {
                expected: normalized.len(),
                actual: guesses.len(),
            }
            .into());
        }

        Ok(normalized
            .iter()
            .zip(guesses)
            .map(|(description, guess)| {
                from_statistical(self.statistical.name(), description, guess)
            })
            .collect())
    }

    fn merge_one(
        &self,
        normalizer: &UnitNormalizer<'_>,
        statistical: &Candidate,
    ) -> ReconcileResult<MergedRecord> {
        let description = statistical.description.as_str();
        let grammar = grammar_candidate(self.grammar.as_ref(), description);

        merge(normalizer, description, Some(statistical), grammar.as_ref()).map_err(|source| {
            ReconcileError::NoBaseUnit {
                description: description.to_string(),
                source,
            }
        })
    }
}
