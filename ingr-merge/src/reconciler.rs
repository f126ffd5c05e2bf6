//! Field Reconciler - Per-Field Winner Selection
//!
//! Given the statistical candidate `A` and the grammar candidate `B` for one
//! description, picks a winner for each field independently:
//! - **product:** the shorter non-empty name wins, `A` on ties
//! - **quantity:** `A` if it has one (or `B` is absent), else `B`
//! - **units:** `A` if it has one (or `B` is absent), else `B`
//!
//! An absent candidate behaves like one with every field `None`.
//!
//! The shorter-product rule compensates for the statistical parser tending to
//! fold modifiers into the name. It is unvalidated against accuracy data.

use crate::types::{Candidate, MergedRecord, ProductField};
use tracing::debug;

/// Which candidate won a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Candidate `A`, from the statistical parser
    Statistical,
    /// Candidate `B`, from the grammar parser
    Grammar,
}

impl Side {
    /// The candidate on this side
    pub fn pick<'a>(self, a: Option<&'a Candidate>, b: Option<&'a Candidate>) -> Option<&'a Candidate> {
        match self {
            Side::Statistical => a,
            Side::Grammar => b,
        }
    }

    /// The opposite side
    pub fn other(self) -> Side {
        match self {
            Side::Statistical => Side::Grammar,
            Side::Grammar => Side::Statistical,
        }
    }
}

/// Winner of each field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Winners {
    pub product: Side,
    pub quantity: Side,
    pub units: Side,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Product winner: shorter non-empty name, statistical on ties
pub fn product_winner(a: Option<&Candidate>, b: Option<&Candidate>) -> Side {
    let (a, b) = match (a, b) {
        (_, None) => return Side::Statistical,
        (None, Some(_)) => return Side::Grammar,
        (Some(a), Some(b)) => (a, b),
    };

    match (non_empty(a.product.as_ref()), non_empty(b.product.as_ref())) {
        (None, _) => Side::Grammar,
        (Some(_), None) => Side::Statistical,
        (Some(a_name), Some(b_name)) => {
            if a_name.chars().count() <= b_name.chars().count() {
                Side::Statistical
            } else {
                Side::Grammar
            }
        }
    }
}

/// Quantity winner: statistical whenever it has a quantity
pub fn quantity_winner(a: Option<&Candidate>, b: Option<&Candidate>) -> Side {
    if b.is_none() || a.is_some_and(|a| a.quantity.is_some()) {
        Side::Statistical
    } else {
        Side::Grammar
    }
}

/// Units winner: statistical whenever it has a unit
pub fn units_winner(a: Option<&Candidate>, b: Option<&Candidate>) -> Side {
    if b.is_none() || a.is_some_and(|a| non_empty(a.units.as_ref()).is_some()) {
        Side::Statistical
    } else {
        Side::Grammar
    }
}

/// Select the winner of every field
pub fn select_winners(a: Option<&Candidate>, b: Option<&Candidate>) -> Winners {
    Winners {
        product: product_winner(a, b),
        quantity: quantity_winner(a, b),
        units: units_winner(a, b),
    }
}

/// Build the provisional (un-normalized) merged record
///
/// Each field is copied from its winner together with the winner's parser
/// tag. A field whose winning value is missing is left unset.
pub fn merge_fields(
    description: &str,
    a: Option<&Candidate>,
    b: Option<&Candidate>,
) -> (MergedRecord, Winners) {
    let winners = select_winners(a, b);
    let mut record = MergedRecord::bare(description);

    if let Some(winner) = winners.product.pick(a, b) {
        record.product = winner.product.as_ref().map(|product| ProductField {
            product: product.clone(),
            product_parser: (!product.is_empty()).then(|| winner.parser.clone()),
        });
    }

    if let Some(winner) = winners.quantity.pick(a, b) {
        if let Some(quantity) = winner.quantity {
            record.quantity = Some(quantity);
            record.quantity_parser = Some(winner.parser.clone());
        }
    }

    if let Some(winner) = winners.units.pick(a, b) {
        if let Some(units) = non_empty(winner.units.as_ref()) {
            record.units = Some(units.to_string());
            record.units_parser = Some(winner.parser.clone());
        }
    }

    debug!(
        description,
        product = ?winners.product,
        quantity = ?winners.quantity,
        units = ?winners.units,
        "Field winners selected"
    );

    (record, winners)
}
