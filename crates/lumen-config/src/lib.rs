//! Configuration management for lumen.
//!
//! Parses `lumen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings are applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `render.current_host`
//! - `structures.service_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use lumen_render::Theme;
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "lumen.toml";

/// Largest accepted coalescing window.
const MAX_WINDOW_MS: u64 = 10_000;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub theme: Option<Theme>,
    /// Override sanitization (`--trusted` sets this to false).
    pub sanitize: Option<bool>,
    pub math: Option<bool>,
    /// Override the structure service URL. Enables structure rendering when
    /// the file has no `[structures]` section.
    pub structure_service: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    /// Structure rendering; disabled when the section is absent.
    pub structures: Option<StructuresConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[render]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub theme: Theme,
    /// Sanitize generated HTML. Disable only for trusted content.
    pub sanitize: bool,
    /// Extract math with the literal fallback renderer.
    pub math: bool,
    /// Host the output is served from, for external link detection.
    pub current_host: Option<String>,
    /// Number code block lines unless the fence says otherwise.
    pub line_numbers: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            sanitize: true,
            math: true,
            current_host: None,
            line_numbers: false,
        }
    }
}

/// `[structures]` section. `service_url` is required when present.
#[derive(Debug, Deserialize)]
pub struct StructuresConfig {
    pub service_url: String,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StructuresConfig {
    /// Section with default tuning for `service_url`.
    #[must_use]
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            window_ms: default_window_ms(),
            cache_capacity: default_cache_capacity(),
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.service_url, "structures.service_url")?;
        require_http_url(&self.service_url, "structures.service_url")?;

        if self.window_ms > MAX_WINDOW_MS {
            return Err(ConfigError::Validation(format!(
                "structures.window_ms cannot exceed {MAX_WINDOW_MS}"
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "structures.cache_capacity must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }
}

fn default_window_ms() -> u64 {
    50
}

fn default_cache_capacity() -> usize {
    lumen_cache::DEFAULT_CAPACITY
}

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`structures.service_url`").
        field: String,
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `lumen.toml` in the current directory and its parents, falling back
    /// to defaults when none exists.
    ///
    /// CLI settings are applied after loading and validated together with the
    /// file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text and expand environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or expansion fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.render.current_host {
            require_non_empty(host, "render.current_host")?;
        }
        if let Some(structures) = &self.structures {
            structures.validate()?;
        }
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = settings.theme {
            self.render.theme = theme;
        }
        if let Some(sanitize) = settings.sanitize {
            self.render.sanitize = sanitize;
        }
        if let Some(math) = settings.math {
            self.render.math = math;
        }
        if let Some(url) = &settings.structure_service {
            match &mut self.structures {
                Some(structures) => structures.service_url.clone_from(url),
                None => self.structures = Some(StructuresConfig::new(url.clone())),
            }
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = &self.render.current_host {
            self.render.current_host = Some(expand::expand_env(host, "render.current_host")?);
        }
        if let Some(structures) = &mut self.structures {
            structures.service_url =
                expand::expand_env(&structures.service_url, "structures.service_url")?;
        }
        Ok(())
    }
}
