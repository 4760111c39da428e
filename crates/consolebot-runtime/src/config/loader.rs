//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`consolebot.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`consolebot.yaml`, `consolebot.yml`, ...)
//!
//! Both features can be enabled simultaneously; if so, both file formats are searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`consolebot.{profile}.toml`)
//! 3. Main config file (`consolebot.toml`)
//! 4. Environment variables (`CONSOLEBOT_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `CONSOLEBOT_` prefix with `__` as separator:
//!
//! - `CONSOLEBOT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `CONSOLEBOT_CONSOLE__BOT__NICKNAME=Helper` → `console.bot.nickname = "Helper"`
//! - `CONSOLEBOT_CONSOLE__FORCE_TO_ME=true` → `console.force_to_me = true`
//!
//! # Example
//!
//! ```rust,ignore
//! use consolebot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config/consolebot.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::RuntimeConfig;

/// Prefix of environment variables read by the loader.
pub const ENV_PREFIX: &str = "CONSOLEBOT_";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `CONSOLEBOT_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var("CONSOLEBOT_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds `<user config dir>/consolebot` to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("consolebot"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a full configuration on top of every other source.
    pub fn merge(mut self, config: RuntimeConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single value by dotted key, e.g. `("console.force_to_me", true)`.
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<RuntimeConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: RuntimeConfig = figment.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            bot_id = %config.console.bot.id,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RuntimeConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(std::mem::take(&mut self.overrides)))
    }

    /// Merges a single config file, dispatching on its extension.
    #[allow(unused_variables)]
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("consolebot"));
        }
        paths
    }

    /// Searches `search_paths × base_names`, profile variant first. Stops at
    /// the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        #[allow(unused_variables)]
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["consolebot.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &[
                    "consolebot.yaml",
                    "consolebot.yml",
                    "config.yaml",
                    "config.yml",
                ],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<RuntimeConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, still honoring `CONSOLEBOT_*`.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<RuntimeConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn empty_dir() -> PathBuf {
        std::env::temp_dir().join("consolebot-loader-tests-empty")
    }

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new()
            .search_path(empty_dir())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.console.bot.id, "robot");
        assert_eq!(config.console.frontend.chat_history_limit, 500);
    }

    #[test]
    fn test_overrides_win() {
        let mut base = RuntimeConfig::default();
        base.logging.level = LogLevel::Debug;

        let config = ConfigLoader::new()
            .search_path(empty_dir())
            .without_env()
            .merge(base)
            .set("console.force_to_me", true)
            .set("console.nicknames", vec!["helper"])
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.console.force_to_me);
        assert_eq!(config.console.nicknames, vec!["helper"]);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file(empty_dir().join("nope.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_load_toml_file() {
        let dir = std::env::temp_dir().join(format!("consolebot-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("consolebot.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "warn"

[console]
nicknames = ["bot"]

[console.bot]
nickname = "Helper"
"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(&dir)
            .without_env()
            .load()
            .unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.console.bot.nickname, "Helper");
        assert_eq!(config.console.bot.id, "robot");
        assert_eq!(config.console.nicknames, vec!["bot"]);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
