//! Grammar parser process client
//!
//! Runs the grammar parser once per description, passing the description as
//! the final argument. Stdout is one JSON object, either a guess:
//!
//! ```json
//! {"ingredient": "flour", "amount": 1.5, "unit": "cup"}
//! ```
//!
//! or a parse failure with the character column where parsing stopped:
//!
//! ```json
//! {"error": {"column": 4, "message": "unexpected token"}}
//! ```

use crate::types::{GrammarFailure, GrammarGuess, GrammarParser};
use ingr_common::config::GrammarConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct FailureBody {
    #[serde(default)]
    column: Option<usize>,
    #[serde(default)]
    message: Option<String>,
}

// `Failure` first: a guess has only optional fields and would match anything.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GrammarResponse {
    Failure { error: FailureBody },
    Guess(GrammarGuess),
}

impl From<FailureBody> for GrammarFailure {
    fn from(body: FailureBody) -> Self {
        let message = body.message.unwrap_or_else(|| "parse error".to_string());
        match body.column {
            Some(column) => GrammarFailure::at(column, message),
            None => GrammarFailure::without_offset(message),
        }
    }
}

/// Grammar parser backed by a child process
pub struct CommandGrammarParser {
    program: PathBuf,
    args: Vec<String>,
    name: String,
}

impl CommandGrammarParser {
    pub fn new(program: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            name: name.into(),
        }
    }

    /// Client configured from the `[grammar]` config section
    pub fn from_config(config: &GrammarConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            name: config.parser_name.clone(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

fn parse_response(stdout: &[u8]) -> Option<Result<GrammarGuess, GrammarFailure>> {
    let response: GrammarResponse = serde_json::from_slice(stdout).ok()?;
    Some(match response {
        GrammarResponse::Guess(guess) => Ok(guess),
        GrammarResponse::Failure { error } => Err(error.into()),
    })
}

impl GrammarParser for CommandGrammarParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, description: &str) -> Result<GrammarGuess, GrammarFailure> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(description)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                warn!(program = %self.program.display(), error = %e, "Failed to start grammar parser");
                GrammarFailure::without_offset(format!(
                    "failed to start '{}': {e}",
                    self.program.display()
                ))
            })?;

        // A failure payload is honoured regardless of exit status
        if let Some(result) = parse_response(&output.stdout) {
            debug!(description, ok = result.is_ok(), "Grammar parser responded");
            return result;
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(GrammarFailure::without_offset(format!(
                "exited with status {:?}: {stderr}",
                output.status.code()
            )));
        }

        warn!(description, "Grammar parser produced unreadable output");
        Err(GrammarFailure::without_offset("unreadable parser output"))
    }
}
