//! Domain entities - Inbound envelopes, outbound payloads and plugin units

pub mod message;
pub mod plugin;

pub use message::{ContextInfo, InboundMessage, MessageBody, MessageKey, OutboundPayload, Payload};
pub use plugin::{BoundHandler, PluginDescriptor, PluginUnit};
