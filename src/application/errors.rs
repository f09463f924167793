//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Plugin loading and watching errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Load error: {0}")]
    Load(String),

    #[error("Failed to import {origin}: {reason}")]
    Import { origin: String, reason: String },

    #[error("Invalid plugin {origin}: {reason}")]
    Validation { origin: String, reason: String },

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result alias for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Failure raised by a command handler
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Reply failed: {0}")]
    Reply(#[from] BotError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Handler panicked")]
    Panicked,

    #[error("Handler timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// `fetch_json` capability errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
