//! Command dispatcher - Routes parsed commands to plugin handlers

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::context::{ContextBuilder, ExecutionContext};
use crate::application::errors::{BotError, HandlerError};
use crate::domain::entities::{InboundMessage, PluginUnit};
use crate::domain::traits::Responder;
use crate::infrastructure::plugins::PluginRegistry;

/// How candidates sharing a command token are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Run every matching unit in registry order. A bot-self mismatch halts the
    /// whole dispatch; a private-chat mismatch replies and halts.
    #[default]
    FanOut,
    /// First matching unit whose restrictions pass wins. Mismatches only skip
    /// that candidate; the private-only reply is sent when nothing ran.
    FirstEligible,
}

/// User-facing texts sent by the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchMessages {
    pub private_only: String,
    pub handler_failed: String,
}

impl Default for DispatchMessages {
    fn default() -> Self {
        Self {
            private_only: "This command is only available in private chat.".to_string(),
            handler_failed: "An error occurred while executing the command.".to_string(),
        }
    }
}

/// What a single dispatch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Text did not start with the prefix
    NotACommand,
    /// No registry unit answers to the command
    NoMatch,
    /// Halted on a bot-self-only unit without invoking anything
    BotSelfOnly,
    /// Private-only reply sent without invoking anything
    PrivateOnly,
    /// At least one handler ran
    Executed { invoked: usize, failed: usize },
}

/// Routes inbound text to the handlers of the current registry snapshot
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<PluginRegistry>,
    contexts: ContextBuilder,
    messages: Arc<DispatchMessages>,
    policy: MatchPolicy,
    handler_timeout: Option<Duration>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<PluginRegistry>, contexts: ContextBuilder) -> Self {
        Self {
            registry,
            contexts,
            messages: Arc::new(DispatchMessages::default()),
            policy: MatchPolicy::default(),
            handler_timeout: None,
        }
    }

    pub fn with_messages(mut self, messages: DispatchMessages) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Abort handlers that run longer than `limit`
    pub fn with_handler_timeout(mut self, limit: Option<Duration>) -> Self {
        self.handler_timeout = limit;
        self
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Dispatch one inbound text.
    ///
    /// Handler failures are contained here: they are logged and answered with the
    /// generic failure message. `Err` is only returned when sending a dispatcher
    /// reply through `responder` fails.
    pub async fn dispatch(
        &self,
        text: &str,
        message: &InboundMessage,
        responder: Arc<dyn Responder>,
    ) -> Result<DispatchOutcome, BotError> {
        let Some(ctx) = self.contexts.build(text, message, Arc::clone(&responder)) else {
            return Ok(DispatchOutcome::NotACommand);
        };

        // Routed against this snapshot even if a reload lands mid-dispatch.
        let snapshot = self.registry.snapshot();

        let mut matched = false;
        let mut private_rejected = false;
        let mut invoked = 0;
        let mut failed = 0;

        for unit in snapshot.iter().filter(|u| u.answers_to(&ctx.command)) {
            matched = true;

            if unit.restrict_to_bot_self() && !ctx.is_bot_self {
                debug!("Command {} restricted to bot account ({})", ctx.command, unit.origin());
                match self.policy {
                    MatchPolicy::FanOut => {
                        return Ok(Self::outcome(DispatchOutcome::BotSelfOnly, invoked, failed));
                    }
                    MatchPolicy::FirstEligible => continue,
                }
            }

            if unit.restrict_to_private_chat() && !ctx.is_private_chat {
                match self.policy {
                    MatchPolicy::FanOut => {
                        responder.send(self.messages.private_only.as_str().into()).await?;
                        return Ok(Self::outcome(DispatchOutcome::PrivateOnly, invoked, failed));
                    }
                    MatchPolicy::FirstEligible => {
                        private_rejected = true;
                        continue;
                    }
                }
            }

            invoked += 1;
            if let Err(e) = self.invoke(unit, message, &ctx).await {
                error!("Error executing plugin {}: {}", ctx.command, e);
                failed += 1;
                responder.send(self.messages.handler_failed.as_str().into()).await?;
            }

            if self.policy == MatchPolicy::FirstEligible {
                break;
            }
        }

        if invoked > 0 {
            return Ok(DispatchOutcome::Executed { invoked, failed });
        }
        if private_rejected {
            responder.send(self.messages.private_only.as_str().into()).await?;
            return Ok(DispatchOutcome::PrivateOnly);
        }
        if matched {
            return Ok(DispatchOutcome::BotSelfOnly);
        }

        debug!("No plugin answers to {}", ctx.command);
        Ok(DispatchOutcome::NoMatch)
    }

    fn outcome(halted: DispatchOutcome, invoked: usize, failed: usize) -> DispatchOutcome {
        if invoked > 0 {
            DispatchOutcome::Executed { invoked, failed }
        } else {
            halted
        }
    }

    /// Run one handler on its own task so a panic is caught like an error.
    ///
    /// The task owns the unit's library, so an aborted or detached task never
    /// outlives the code it is running.
    async fn invoke(
        &self,
        unit: &PluginUnit,
        message: &InboundMessage,
        ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        info!("Executing command: {} ({})", ctx.command, unit.origin());

        let bound = unit.bound_handler();
        let message = message.clone();
        let ctx = ctx.clone();
        let task = tokio::spawn(async move { bound.handler().handle(&message, &ctx).await });
        let abort = task.abort_handle();

        let joined = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return Err(HandlerError::TimedOut(limit));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(HandlerError::Panicked),
            Err(e) => Err(HandlerError::ExecutionFailed(e.to_string())),
        }
    }
}
