//! Test Helper Utilities
//!
//! Scripted parsers for exercising the reconciler without external processes.

#![allow(dead_code)]

use ingr_merge::types::{RawQuantity, StatisticalGuess};
use ingr_merge::{GrammarFailure, GrammarGuess, GrammarParser, ParserError, StatisticalParser};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Statistical guess with a text quantity
pub fn stat(name: &str, qty: Option<&str>, unit: Option<&str>) -> StatisticalGuess {
    StatisticalGuess {
        input: None,
        name: Some(name.to_string()),
        qty: qty.map(|q| RawQuantity::Text(q.to_string())),
        unit: unit.map(str::to_string),
    }
}

/// Grammar guess
pub fn gram(ingredient: &str, amount: Option<f64>, unit: Option<&str>) -> GrammarGuess {
    GrammarGuess {
        ingredient: Some(ingredient.to_string()),
        amount,
        unit: unit.map(str::to_string),
    }
}

/// Statistical parser answering from a table keyed by normalized description
///
/// Unknown descriptions get an all-null guess. Every batch it receives is
/// recorded so tests can check call count and order.
#[derive(Clone, Default)]
pub struct ScriptedStatistical {
    answers: HashMap<String, StatisticalGuess>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    drop_last: bool,
}

impl ScriptedStatistical {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, description: &str, guess: StatisticalGuess) -> Self {
        self.answers.insert(description.to_string(), guess);
        self
    }

    /// Return one result fewer than requested
    pub fn short_by_one(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

impl StatisticalParser for ScriptedStatistical {
    fn name(&self) -> &str {
        "statistical"
    }

    fn parse_batch(&self, descriptions: &[String]) -> Result<Vec<StatisticalGuess>, ParserError> {
        self.batches.lock().unwrap().push(descriptions.to_vec());

        let mut guesses: Vec<StatisticalGuess> = descriptions
            .iter()
            .map(|d| {
                let mut guess = self.answers.get(d).cloned().unwrap_or_default();
                guess.input = Some(d.clone());
                guess
            })
            .collect();
        if self.drop_last {
            guesses.pop();
        }
        Ok(guesses)
    }
}

/// Statistical parser that always fails like a crashed process
pub struct BrokenStatistical;

impl StatisticalParser for BrokenStatistical {
    fn name(&self) -> &str {
        "statistical"
    }

    fn parse_batch(&self, _descriptions: &[String]) -> Result<Vec<StatisticalGuess>, ParserError> {
        Err(ParserError::ExitStatus {
            code: Some(1),
            stderr: "model file not found".to_string(),
        })
    }
}

/// Grammar parser answering from a table; anything else fails without offset
#[derive(Clone, Default)]
pub struct ScriptedGrammar {
    answers: HashMap<String, Result<GrammarGuess, GrammarFailure>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, description: &str, guess: GrammarGuess) -> Self {
        self.answers.insert(description.to_string(), Ok(guess));
        self
    }

    pub fn fail(mut self, description: &str, failure: GrammarFailure) -> Self {
        self.answers.insert(description.to_string(), Err(failure));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GrammarParser for ScriptedGrammar {
    fn name(&self) -> &str {
        "grammar"
    }

    fn parse(&self, description: &str) -> Result<GrammarGuess, GrammarFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(description)
            .cloned()
            .unwrap_or_else(|| Err(GrammarFailure::without_offset("no parse")))
    }
}
