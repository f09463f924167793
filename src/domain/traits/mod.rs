//! Domain traits - Abstractions for plugin code and infrastructure implementations

pub mod bot;
pub mod handler;

pub use bot::{Bot, BotInfo};
pub use handler::{CommandHandler, Responder};
