//! Statistical parser process client
//!
//! Runs the model-based tagger as a child process. Descriptions are written
//! to stdin joined by newlines; stdout must be one JSON array with an item per
//! input line, in input order.

use crate::types::{ParserError, StatisticalGuess, StatisticalParser};
use ingr_common::config::StatisticalConfig;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Statistical parser backed by a child process
pub struct CommandStatisticalParser {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    name: String,
}

impl CommandStatisticalParser {
    /// Client for `program` with no arguments and an empty environment
    pub fn new(program: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            name: name.into(),
        }
    }

    /// Client configured from the `[statistical]` config section
    pub fn from_config(config: &StatisticalConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            env: config.env.clone(),
            name: config.parser_name.clone(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl StatisticalParser for CommandStatisticalParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse_batch(&self, descriptions: &[String]) -> Result<Vec<StatisticalGuess>, ParserError> {
        if let Some(bad) = descriptions.iter().find(|d| d.contains('\n')) {
            return Err(ParserError::InvalidInput(format!(
                "description contains a newline: {bad:?}"
            )));
        }

        debug!(
            program = %self.program.display(),
            count = descriptions.len(),
            "Spawning statistical parser"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ParserError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock
        // on a full stdout pipe while we are still writing.
        let input = descriptions.join("\n");
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                match stdin.write_all(input.as_bytes()) {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })
        });

        let output = child.wait_with_output()?;

        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| ParserError::Io(std::io::Error::other("stdin writer panicked")))??;
        }

        if !output.status.success() {
            return Err(ParserError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let guesses: Vec<StatisticalGuess> = serde_json::from_slice(&output.stdout)
            .map_err(|e| ParserError::Json(e.to_string()))?;

        if guesses.len() != descriptions.len() {
            return Err(ParserError::LengthMismatch {
                expected: descriptions.len(),
                actual: guesses.len(),
            });
        }

        info!(
            parser = %self.name,
            count = guesses.len(),
            "Statistical parser completed"
        );
        Ok(guesses)
    }
}
