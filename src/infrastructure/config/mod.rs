//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::messaging::{DispatchMessages, MatchPolicy, DEFAULT_PREFIX};

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub messages: MessagesConfig,
    pub plugins: PluginConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    /// Chat ids ending with this are direct (private) chats
    pub direct_chat_suffix: String,
    /// Drop inbound messages authored by the bot account before dispatch
    pub ignore_own_messages: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MessagesConfig {
    pub private_only: String,
    pub handler_failed: String,
    pub processing_failed: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub watch: bool,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DispatchConfig {
    pub match_policy: MatchPolicy,
    pub handler_timeout_secs: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "plugbot".to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            direct_chat_suffix: "@s.whatsapp.net".to_string(),
            ignore_own_messages: true,
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        let dispatch = DispatchMessages::default();
        Self {
            private_only: dispatch.private_only,
            handler_failed: dispatch.handler_failed,
            processing_failed: "An error occurred while processing your request.".to_string(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./command"),
            watch: true,
            debounce_ms: 0,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        // An empty prefix would turn every message into a command
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            if !prefix.trim().is_empty() {
                config.bot.prefix = prefix;
            }
        }

        if let Ok(dir) = std::env::var("PLUGIN_DIR") {
            config.plugins.directory = PathBuf::from(dir);
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::InvalidValue("prefix must not be empty".to_string()));
        }
        if self.bot.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "prefix must not contain whitespace: {:?}",
                self.bot.prefix
            )));
        }
        if self.dispatch.handler_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "handler-timeout-secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dispatch_messages(&self) -> DispatchMessages {
        DispatchMessages {
            private_only: self.messages.private_only.clone(),
            handler_failed: self.messages.handler_failed.clone(),
        }
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.dispatch.handler_timeout_secs.map(Duration::from_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.plugins.debounce_ms)
    }
}
