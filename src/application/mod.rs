//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Inbound event processing
//! - Errors: Domain-specific errors
//! - Messaging: Context building, command dispatching

pub mod errors;
pub mod services;
pub mod messaging;
