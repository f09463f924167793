//! plugbot - plugin registry and command dispatcher for chat bots
//!
//! Plugins are discovered in a directory, validated and swapped into a
//! `PluginRegistry` as one snapshot. The `CommandDispatcher` routes prefixed
//! commands to the matching units, enforcing their access restrictions and
//! containing handler failures.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{BotError, HandlerError, PluginError};
pub use application::messaging::{CommandDispatcher, ContextBuilder, ExecutionContext};
pub use domain::entities::{InboundMessage, OutboundPayload, PluginDescriptor, PluginUnit};
pub use domain::traits::{Bot, CommandHandler, Responder};
pub use infrastructure::plugins::{PluginLoader, PluginRegistry, PluginWatcher};
