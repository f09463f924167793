//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Plugin loading, registry and directory watching
//! - Adapters: Transport integrations

pub mod adapters;
pub mod config;
pub mod plugins;
