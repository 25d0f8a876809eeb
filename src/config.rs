//! Configuration loading and management for graderace.
//!
//! Loads settings from `graderace.toml` when one exists, falling back to built-in
//! defaults. The Gemini API key always comes from the environment (or `.env`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Config file name looked up in the working directory and `~/.config/graderace/`
pub const CONFIG_FILE_NAME: &str = "graderace.toml";

/// Environment file loaded from the working directory when present
pub const ENV_FILE_NAME: &str = ".env";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Page fetching and extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// CSS selector of the element holding the race data
    pub container: String,
    /// WHATWG label of the page encoding
    pub encoding: String,
    /// Fail on malformed byte sequences instead of substituting U+FFFD
    pub strict_decoding: bool,
    /// User-Agent header sent with the page request
    pub user_agent: String,
}

/// Summarizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model name; anything containing "pro" selects the pro tier
    pub model: String,
    /// Instruction prefixed to the extracted text
    pub instruction: String,
    /// Base URL of the Generative Language API
    pub base_url: String,
}

/// Output sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Copy the summary to the system clipboard
    pub clipboard: bool,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub no_clipboard: bool,
}

impl Config {
    /// Load configuration, loading `.env` first and reading the API key from the environment.
    ///
    /// An explicit `path` must exist. Without one, the standard locations are
    /// searched and built-in defaults are used when nothing is found.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env_file(path, Path::new(ENV_FILE_NAME))
    }

    /// Same as [`Config::load`] but reads environment overrides from `env_file`
    pub fn load_with_env_file(path: Option<&Path>, env_file: &Path) -> Result<Self, ConfigError> {
        load_dotenv(env_file)?;

        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::find_config_file(Path::new("."), dirs::home_dir().as_deref()) {
                Some(found) => Self::load_from(&found)?,
                None => {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            },
        };

        config.api.gemini_key = std::env::var(API_KEY_VAR).ok();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides, consuming the loaded config
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(model) = overrides.model {
            self.agent.model = model;
        }
        if overrides.no_clipboard {
            self.output.clipboard = false;
        }
        self
    }

    /// The Gemini API key, if one is set and not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .gemini_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Find the config file in `cwd`, then under `home/.config/graderace/`
    fn find_config_file(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
        let local_config = cwd.join(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = home?
            .join(".config")
            .join("graderace")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }
}

/// Load variables from `path`; a missing file is not an error.
fn load_dotenv(path: &Path) -> Result<(), ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded environment file");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            container: "div#main_contents".to_string(),
            encoding: "Shift_JIS".to_string(),
            strict_decoding: true,
            user_agent: concat!("graderace/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "flash".to_string(),
            instruction: "次の文章を要約してください。".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { clipboard: true }
    }
}
