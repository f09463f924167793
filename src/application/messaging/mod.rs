//! Message handling - Context building and command dispatch

pub mod context;
pub mod dispatcher;

pub use context::{ContextBuilder, ExecutionContext, FetchOptions, DEFAULT_PREFIX};
pub use dispatcher::{CommandDispatcher, DispatchMessages, DispatchOutcome, MatchPolicy};
