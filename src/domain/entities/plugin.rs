use std::fmt;
use std::sync::Arc;

use libloading::Library;

use crate::application::errors::PluginError;
use crate::domain::traits::CommandHandler;

/// Unvalidated shape exported by a plugin source unit
#[derive(Clone, Default)]
pub struct PluginDescriptor {
    pub commands: Option<Vec<String>>,
    pub handler: Option<Arc<dyn CommandHandler>>,
    pub restrict_to_bot_self: bool,
    pub restrict_to_private_chat: bool,
    /// Shared library the handler's code lives in, if any
    pub(crate) library: Option<Arc<Library>>,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("commands", &self.commands)
            .field("handler", &self.handler.is_some())
            .field("restrict_to_bot_self", &self.restrict_to_bot_self)
            .field("restrict_to_private_chat", &self.restrict_to_private_chat)
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}

impl PluginDescriptor {
    pub fn new(commands: Vec<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            commands: Some(commands),
            handler: Some(handler),
            restrict_to_bot_self: false,
            restrict_to_private_chat: false,
            library: None,
        }
    }

    pub fn bot_self_only(mut self) -> Self {
        self.restrict_to_bot_self = true;
        self
    }

    pub fn private_only(mut self) -> Self {
        self.restrict_to_private_chat = true;
        self
    }

    /// Check the descriptor and turn it into a registry entry.
    ///
    /// `origin` names the source unit (usually its file name) for diagnostics.
    pub fn validate(self, origin: impl Into<String>) -> Result<PluginUnit, PluginError> {
        let origin = origin.into();

        let commands = match self.commands {
            Some(commands) if !commands.is_empty() => commands,
            _ => {
                return Err(PluginError::Validation {
                    origin,
                    reason: "invalid command list".to_string(),
                })
            }
        };

        let Some(handler) = self.handler else {
            return Err(PluginError::Validation {
                origin,
                reason: "missing handler".to_string(),
            });
        };

        Ok(PluginUnit {
            origin,
            commands,
            handler,
            restrict_to_bot_self: self.restrict_to_bot_self,
            restrict_to_private_chat: self.restrict_to_private_chat,
            library: self.library,
        })
    }
}

/// A validated command family in the registry. Never mutated after creation.
pub struct PluginUnit {
    origin: String,
    commands: Vec<String>,
    handler: Arc<dyn CommandHandler>,
    restrict_to_bot_self: bool,
    restrict_to_private_chat: bool,
    // Declared after `handler` so the handler's code is dropped before it is unmapped.
    library: Option<Arc<Library>>,
}

impl PluginUnit {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Exact, case-sensitive command match
    pub fn answers_to(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }

    /// Handler that also pins the unit's library, for use after the unit is gone
    pub fn bound_handler(&self) -> BoundHandler {
        BoundHandler {
            handler: Arc::clone(&self.handler),
            library: self.library.clone(),
        }
    }

    pub fn restrict_to_bot_self(&self) -> bool {
        self.restrict_to_bot_self
    }

    pub fn restrict_to_private_chat(&self) -> bool {
        self.restrict_to_private_chat
    }
}

/// A unit's handler together with the library its code lives in
pub struct BoundHandler {
    handler: Arc<dyn CommandHandler>,
    // Must stay after `handler`: fields drop in declaration order.
    library: Option<Arc<Library>>,
}

impl BoundHandler {
    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl fmt::Debug for PluginUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginUnit")
            .field("origin", &self.origin)
            .field("commands", &self.commands)
            .field("restrict_to_bot_self", &self.restrict_to_bot_self)
            .field("restrict_to_private_chat", &self.restrict_to_private_chat)
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use crate::application::messaging::ExecutionContext;
    use crate::domain::entities::InboundMessage;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _m: &InboundMessage, _ctx: &ExecutionContext) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn test_validate_accepts_complete_unit() {
        let unit = PluginDescriptor::new(vec!["ping".into()], Arc::new(Noop))
            .private_only()
            .validate("ping.yaml")
            .unwrap();
        assert_eq!(unit.origin(), "ping.yaml");
        assert!(unit.answers_to("ping"));
        assert!(!unit.answers_to("Ping"));
        assert!(unit.restrict_to_private_chat());
        assert!(!unit.restrict_to_bot_self());
    }

    #[test]
    fn test_validate_rejects_missing_commands() {
        let desc = PluginDescriptor {
            handler: Some(Arc::new(Noop)),
            ..Default::default()
        };
        assert!(matches!(desc.validate("a"), Err(PluginError::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_commands() {
        let desc = PluginDescriptor::new(vec![], Arc::new(Noop));
        assert!(matches!(desc.validate("a"), Err(PluginError::Validation { .. })));
    }

    #[test]
    fn test_bound_handler_without_library() {
        let unit = PluginDescriptor::new(vec!["ping".into()], Arc::new(Noop))
            .validate("ping.yaml")
            .unwrap();
        assert!(!unit.bound_handler().is_dynamic());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_bound_handler_keeps_library_after_unit_drops() {
        let library = Arc::new(unsafe { Library::new("libc.so.6") }.unwrap());
        let mapped = Arc::downgrade(&library);
        let mut descriptor = PluginDescriptor::new(vec!["ping".into()], Arc::new(Noop));
        descriptor.library = Some(library);
        let unit = descriptor.validate("ping.so").unwrap();

        let bound = unit.bound_handler();
        assert!(bound.is_dynamic());
        drop(unit);
        assert!(mapped.upgrade().is_some());

        drop(bound);
        assert!(mapped.upgrade().is_none());
    }

    #[test]
    fn test_validate_rejects_missing_handler() {
        let desc = PluginDescriptor {
            commands: Some(vec!["x".into()]),
            ..Default::default()
        };
        let err = desc.validate("x.yaml").unwrap_err();
        assert!(err.to_string().contains("missing handler"));
    }
}
