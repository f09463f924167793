//! Context builder - Turns an inbound message into a handler execution context

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};

use crate::application::errors::{BotError, FetchError};
use crate::domain::entities::{ContextInfo, InboundMessage, MessageBody, OutboundPayload};
use crate::domain::traits::Responder;

/// Display name used when the sender has none
const DEFAULT_PUSH_NAME: &str = "User";

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "!";

/// Request options for `ExecutionContext::fetch_json`
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Defaults to GET
    pub method: Option<Method>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchOptions {
    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Some(Method::POST),
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Per-invocation data and capabilities handed to a command handler
#[derive(Clone)]
pub struct ExecutionContext {
    pub prefix: String,
    pub command: String,
    /// Arguments rejoined with single spaces
    pub text: String,
    pub args: Vec<String>,
    pub push_name: String,
    pub is_bot_self: bool,
    pub is_private_chat: bool,
    pub quoted: Option<MessageBody>,
    pub quoted_context: Option<ContextInfo>,
    pub mime: Option<String>,
    responder: Arc<dyn Responder>,
    http: Client,
}

impl ExecutionContext {
    /// Send a reply through the transport callback
    pub async fn reply(&self, payload: impl Into<OutboundPayload>) -> Result<(), BotError> {
        self.responder.send(payload.into()).await
    }

    /// Suspend the calling task only
    pub async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Perform an HTTP request and parse the response body as JSON
    pub async fn fetch_json(&self, url: &str, options: FetchOptions) -> Result<serde_json::Value, FetchError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| FetchError::InvalidRequest(format!("{}: {}", url, e)))?;

        let mut request = self.http.request(options.method.unwrap_or(Method::GET), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("prefix", &self.prefix)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("push_name", &self.push_name)
            .field("is_bot_self", &self.is_bot_self)
            .field("is_private_chat", &self.is_private_chat)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

/// Builds execution contexts; never touches the plugin registry
#[derive(Clone)]
pub struct ContextBuilder {
    prefix: String,
    direct_chat_suffix: String,
    http: Client,
}

impl ContextBuilder {
    /// An empty `prefix` falls back to `DEFAULT_PREFIX`; it would match any text.
    pub fn new(prefix: impl Into<String>, direct_chat_suffix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: if prefix.is_empty() { DEFAULT_PREFIX.to_string() } else { prefix },
            direct_chat_suffix: direct_chat_suffix.into(),
            http: Client::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a context for `text`, or `None` when it is not a command
    pub fn build(
        &self,
        text: &str,
        message: &InboundMessage,
        responder: Arc<dyn Responder>,
    ) -> Option<ExecutionContext> {
        let mut tokens = text.split_whitespace();
        let raw = tokens.next()?.to_lowercase();
        let command = raw.strip_prefix(self.prefix.as_str())?.to_string();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let body = message.body.as_ref();
        let quoted_context = body.and_then(MessageBody::context_info).cloned();
        let quoted = quoted_context
            .as_ref()
            .and_then(|c| c.quoted_message.as_deref())
            .cloned();

        Some(ExecutionContext {
            prefix: self.prefix.clone(),
            command,
            text: args.join(" "),
            args,
            push_name: message
                .push_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PUSH_NAME.to_string()),
            is_bot_self: message.key.from_me,
            is_private_chat: self.is_private_chat(message),
            quoted,
            quoted_context,
            mime: body.and_then(MessageBody::mime).map(str::to_string),
            responder,
            http: self.http.clone(),
        })
    }

    fn is_private_chat(&self, message: &InboundMessage) -> bool {
        message
            .chat_id()
            .map(|jid| jid.ends_with(&self.direct_chat_suffix))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Payload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<OutboundPayload>>);

    #[async_trait]
    impl Responder for Collect {
        async fn send(&self, payload: OutboundPayload) -> Result<(), BotError> {
            self.0.lock().unwrap().push(payload);
            Ok(())
        }
    }

    fn builder() -> ContextBuilder {
        ContextBuilder::new("!", "@s.whatsapp.net")
    }

    #[test]
    fn test_build_parses_command_and_args() {
        let msg = InboundMessage::from_text("62812@s.whatsapp.net", "").with_push_name("Budi");
        let ctx = builder()
            .build("  !PING   hello   world ", &msg, Arc::new(Collect::default()))
            .unwrap();

        assert_eq!(ctx.command, "ping");
        assert_eq!(ctx.args, vec!["hello", "world"]);
        assert_eq!(ctx.text, "hello world");
        assert_eq!(ctx.push_name, "Budi");
        assert!(ctx.is_private_chat);
        assert!(!ctx.is_bot_self);
        assert_eq!(ctx.mime.as_deref(), Some("conversation"));
    }

    #[test]
    fn test_build_without_prefix_is_not_a_command() {
        let msg = InboundMessage::from_text("1@g.us", "ping");
        assert!(builder().build("ping", &msg, Arc::new(Collect::default())).is_none());
        assert!(builder().build("   ", &msg, Arc::new(Collect::default())).is_none());
    }

    #[test]
    fn test_empty_prefix_falls_back_to_default() {
        let builder = ContextBuilder::new("", "@s.whatsapp.net");
        assert_eq!(builder.prefix(), DEFAULT_PREFIX);

        let msg = InboundMessage::from_text("1@g.us", "hello there");
        assert!(builder.build("hello there", &msg, Arc::new(Collect::default())).is_none());
        assert_eq!(builder.build("!hello", &msg, Arc::new(Collect::default())).unwrap().command, "hello");
    }

    #[test]
    fn test_build_strips_prefix_once() {
        let msg = InboundMessage::from_text("1@g.us", "!!x");
        let ctx = builder().build("!!x", &msg, Arc::new(Collect::default())).unwrap();
        assert_eq!(ctx.command, "!x");
    }

    #[test]
    fn test_build_group_chat_and_quote() {
        let quoted = MessageBody::text("original");
        let body = MessageBody::new(vec![Payload::ExtendedText {
            text: "!q".into(),
            context_info: Some(ContextInfo {
                stanza_id: Some("abc".into()),
                participant: None,
                quoted_message: Some(Box::new(quoted.clone())),
            }),
        }]);
        let msg = InboundMessage::new("123-456@g.us", body).with_from_me(true);
        let ctx = builder().build("!q", &msg, Arc::new(Collect::default())).unwrap();

        assert!(!ctx.is_private_chat);
        assert!(ctx.is_bot_self);
        assert_eq!(ctx.push_name, "User");
        assert_eq!(ctx.quoted, Some(quoted));
        assert_eq!(ctx.quoted_context.unwrap().stanza_id.as_deref(), Some("abc"));
        assert_eq!(ctx.mime.as_deref(), Some("extendedTextMessage"));
    }

    #[test]
    fn test_build_without_body_has_no_mime() {
        let mut msg = InboundMessage::from_text("1@g.us", "");
        msg.body = None;
        let ctx = builder().build("!x", &msg, Arc::new(Collect::default())).unwrap();
        assert!(ctx.mime.is_none());
        assert!(ctx.quoted.is_none());
    }

    #[tokio::test]
    async fn test_reply_passes_through() {
        let sink = Arc::new(Collect::default());
        let msg = InboundMessage::from_text("1@g.us", "!x");
        let ctx = builder().build("!x", &msg, sink.clone()).unwrap();
        ctx.reply("pong").await.unwrap();
        assert_eq!(*sink.0.lock().unwrap(), vec![OutboundPayload::Text("pong".into())]);
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_bad_url() {
        let msg = InboundMessage::from_text("1@g.us", "!x");
        let ctx = builder().build("!x", &msg, Arc::new(Collect::default())).unwrap();
        let err = ctx.fetch_json("not a url", FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }
}
