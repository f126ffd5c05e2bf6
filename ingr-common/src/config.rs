//! Bootstrap configuration loading and config file resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `INGR_CONFIG` environment variable
//! 3. `~/.config/ingr/config.toml` if it exists
//! 4. Built-in defaults (no file)
//!
//! Every key in the file is optional. Missing sections fall back to the
//! built-in defaults so a partial file only overrides what it names.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "INGR_CONFIG";

/// Complete bootstrap configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Statistical (model-based) parser process
    pub statistical: StatisticalConfig,

    /// Grammar-based parser process
    pub grammar: GrammarConfig,

    /// Unit normalizer provenance settings
    pub normalizer: NormalizerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Statistical parser process settings
///
/// The process receives newline-joined descriptions on stdin and prints
/// one JSON array on stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    /// Program to execute
    pub program: PathBuf,

    /// Arguments passed before any input
    pub args: Vec<String>,

    /// Complete environment of the child process (inherited env is cleared)
    pub env: BTreeMap<String, String>,

    /// Provenance tag recorded on fields this parser wins
    pub parser_name: String,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), "/usr/bin:/usr/local/bin".to_string());
        env.insert("PYTHONPATH".to_string(), "..".to_string());

        Self {
            program: PathBuf::from("bin/parse-ingredients.py"),
            args: vec!["--model-file".to_string(), "model/latest".to_string()],
            env,
            parser_name: "statistical".to_string(),
        }
    }
}

/// Grammar parser process settings
///
/// The process is run once per description, with the description as its
/// final argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Program to execute
    pub program: PathBuf,

    /// Arguments passed before the description
    pub args: Vec<String>,

    /// Provenance tag recorded on fields this parser wins
    pub parser_name: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bin/parse-ingredient-grammar"),
            args: Vec::new(),
            parser_name: "grammar".to_string(),
        }
    }
}

/// Unit normalizer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Suffix appended to parser tags of normalized fields (`"<parser>+<tag>"`)
    pub tag: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            tag: "normalizer".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.statistical.parser_name.trim().is_empty() {
            return Err(Error::Config("statistical.parser_name must not be empty".to_string()));
        }
        if self.grammar.parser_name.trim().is_empty() {
            return Err(Error::Config("grammar.parser_name must not be empty".to_string()));
        }
        if self.statistical.parser_name == self.grammar.parser_name {
            return Err(Error::Config(format!(
                "parser names must differ (both are '{}')",
                self.grammar.parser_name
            )));
        }
        if self.normalizer.tag.trim().is_empty() {
            return Err(Error::Config("normalizer.tag must not be empty".to_string()));
        }
        if self.statistical.program.as_os_str().is_empty() {
            return Err(Error::Config("statistical.program must not be empty".to_string()));
        }
        if self.grammar.program.as_os_str().is_empty() {
            return Err(Error::Config("grammar.program must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Locates the config file following the documented priority order
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var: String,
    default_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver reading `INGR_CONFIG` and `~/.config/ingr/config.toml`
    pub fn new() -> Self {
        Self {
            env_var: CONFIG_ENV_VAR.to_string(),
            default_path: dirs::config_dir().map(|d| d.join("ingr").join("config.toml")),
        }
    }

    /// Resolver with explicit environment variable and default location
    pub fn with_sources(env_var: impl Into<String>, default_path: Option<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            default_path,
        }
    }

    /// Resolve the config path, returning whether it was explicitly requested
    ///
    /// Explicit paths (CLI or environment) are returned even if missing so
    /// the caller can report them; the default location only counts when
    /// the file exists.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<(PathBuf, bool)> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some((path.to_path_buf(), true));
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), true));
            }
        }

        // Priority 3: Default location, only if present
        match &self.default_path {
            Some(path) if path.exists() => Some((path.clone(), false)),
            _ => None,
        }
    }

    /// Resolve and load the configuration
    ///
    /// A missing explicit file is an error. No file at all yields defaults.
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        match self.resolve(cli_arg) {
            Some((path, explicit)) => {
                if explicit && !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bundled_parser_invocation() {
        let config = TomlConfig::default();
        assert_eq!(config.statistical.program, PathBuf::from("bin/parse-ingredients.py"));
        assert_eq!(config.statistical.args, vec!["--model-file", "model/latest"]);
        assert_eq!(
            config.statistical.env.get("PATH").map(String::as_str),
            Some("/usr/bin:/usr/local/bin")
        );
        assert_eq!(config.normalizer.tag, "normalizer");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = TomlConfig::parse(
            r#"
            [grammar]
            program = "/opt/ingreedy/parse"
            "#,
        )
        .unwrap();

        assert_eq!(config.grammar.program, PathBuf::from("/opt/ingreedy/parse"));
        assert_eq!(config.grammar.parser_name, "grammar");
        assert_eq!(config.statistical.parser_name, "statistical");
    }

    #[test]
    fn test_duplicate_parser_names_rejected() {
        let result = TomlConfig::parse(
            r#"
            [statistical]
            parser_name = "nyt"
            [grammar]
            parser_name = "nyt"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_normalizer_tag_rejected() {
        let result = TomlConfig::parse("[normalizer]\ntag = \"\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::parse("[logging\nlevel = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
