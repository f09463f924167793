//! Domain layer - Core types with no transport or filesystem concerns
//! 
//! This layer contains:
//! - Entities: Message envelopes, plugin units
//! - Traits: Seams for handlers, reply callbacks and transport adapters

pub mod entities;
pub mod traits;
