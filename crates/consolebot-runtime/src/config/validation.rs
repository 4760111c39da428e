//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RuntimeConfig};
use consolebot_adapter::{ConsoleConfig, FrontendConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RuntimeConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_console_config(&config.console)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for target in logging.filters.keys() {
        if target.trim().is_empty() {
            return Err(ConfigError::validation("Log filter target cannot be empty"));
        }
    }

    Ok(())
}

fn validate_console_config(console: &ConsoleConfig) -> ConfigResult<()> {
    if console.bot.id.trim().is_empty() {
        return Err(ConfigError::missing_field("console.bot.id"));
    }

    if console.bot.id.contains(' ') {
        return Err(ConfigError::validation("Bot ID cannot contain spaces"));
    }

    if console.nicknames.iter().any(|n| n.trim().is_empty()) {
        return Err(ConfigError::validation("Nicknames cannot be empty"));
    }

    if console.shutdown_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Shutdown timeout must be greater than 0",
        ));
    }

    validate_frontend_config(&console.frontend)
}

fn validate_frontend_config(frontend: &FrontendConfig) -> ConfigResult<()> {
    if frontend.user.id.trim().is_empty() {
        return Err(ConfigError::missing_field("console.frontend.user.id"));
    }

    if frontend.chat_history_limit == 0 {
        return Err(ConfigError::validation(
            "Chat history limit must be greater than 0",
        ));
    }

    if frontend.log_history_limit == 0 {
        return Err(ConfigError::validation(
            "Log history limit must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = RuntimeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_bot_id() {
        let mut config = RuntimeConfig::default();
        config.console.bot.id = "  ".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_validate_empty_nickname() {
        let mut config = RuntimeConfig::default();
        config.console.nicknames = vec!["bot".to_string(), String::new()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = RuntimeConfig::default();
        config.console.frontend.chat_history_limit = 0;
        assert!(validate_config(&config).is_err());

        let mut config = RuntimeConfig::default();
        config.console.shutdown_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = RuntimeConfig::default();
        config.logging.output = LogOutput::File;
        let result = validate_config(&config);
        assert!(
            matches!(result, Err(ConfigError::MissingField { ref field }) if field == "logging.file_path")
        );

        config.logging.file_path = Some("consolebot.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
