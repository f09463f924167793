use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Addressing data for an inbound message
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageKey {
    pub id: String,
    pub remote_jid: Option<String>,
    pub from_me: bool,
}

/// Reply/quote metadata attached to an extended text message
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContextInfo {
    pub stanza_id: Option<String>,
    pub participant: Option<String>,
    pub quoted_message: Option<Box<MessageBody>>,
}

/// One typed payload inside a message body
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Payload {
    Conversation(String),
    ExtendedText {
        text: String,
        context_info: Option<ContextInfo>,
    },
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Document { caption: Option<String> },
    Other { type_key: String },
}

impl Payload {
    /// Transport type key of this payload, used as the content-type hint
    pub fn type_key(&self) -> &str {
        match self {
            Payload::Conversation(_) => "conversation",
            Payload::ExtendedText { .. } => "extendedTextMessage",
            Payload::Image { .. } => "imageMessage",
            Payload::Video { .. } => "videoMessage",
            Payload::Document { .. } => "documentMessage",
            Payload::Other { type_key } => type_key,
        }
    }
}

/// Message body - ordered list of typed payloads
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MessageBody {
    pub payloads: Vec<Payload>,
}

impl MessageBody {
    pub fn new(payloads: Vec<Payload>) -> Self {
        Self { payloads }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Payload::Conversation(text.into())])
    }

    /// First payload type key, if the body has any typed payload
    pub fn mime(&self) -> Option<&str> {
        self.payloads.first().map(Payload::type_key)
    }

    /// Context info of the extended text payload
    pub fn context_info(&self) -> Option<&ContextInfo> {
        self.payloads.iter().find_map(|p| match p {
            Payload::ExtendedText { context_info, .. } => context_info.as_ref(),
            _ => None,
        })
    }

    fn conversation(&self) -> Option<&str> {
        self.payloads.iter().find_map(|p| match p {
            Payload::Conversation(text) => Some(text.as_str()),
            _ => None,
        })
    }

    fn extended_text(&self) -> Option<&str> {
        self.payloads.iter().find_map(|p| match p {
            Payload::ExtendedText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn caption(&self, key: &str) -> Option<&str> {
        self.payloads.iter().find_map(|p| match p {
            Payload::Image { caption } | Payload::Video { caption } | Payload::Document { caption }
                if p.type_key() == key =>
            {
                caption.as_deref()
            }
            _ => None,
        })
    }
}

/// Inbound message envelope as delivered by the transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InboundMessage {
    pub key: MessageKey,
    pub push_name: Option<String>,
    pub body: Option<MessageBody>,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(remote_jid: impl Into<String>, body: MessageBody) -> Self {
        Self {
            key: MessageKey {
                id: uuid::Uuid::new_v4().to_string(),
                remote_jid: Some(remote_jid.into()),
                from_me: false,
            },
            push_name: None,
            body: Some(body),
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(remote_jid: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(remote_jid, MessageBody::text(text))
    }

    pub fn with_push_name(mut self, name: impl Into<String>) -> Self {
        self.push_name = Some(name.into());
        self
    }

    pub fn with_from_me(mut self, from_me: bool) -> Self {
        self.key.from_me = from_me;
        self
    }

    /// Chat the message arrived in
    pub fn chat_id(&self) -> Option<&str> {
        self.key.remote_jid.as_deref()
    }

    /// Extract the command-bearing text, if any
    pub fn text(&self) -> Option<&str> {
        let body = self.body.as_ref()?;
        body.conversation()
            .or_else(|| body.extended_text())
            .or_else(|| body.caption("imageMessage"))
            .or_else(|| body.caption("videoMessage"))
            .or_else(|| body.caption("documentMessage"))
            .filter(|t| !t.is_empty())
    }
}

/// Outbound reply content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OutboundPayload {
    Text(String),
    Rich(serde_json::Value),
}

impl OutboundPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundPayload::Text(s) => Some(s),
            OutboundPayload::Rich(_) => None,
        }
    }
}

impl From<String> for OutboundPayload {
    fn from(text: String) -> Self {
        OutboundPayload::Text(text)
    }
}

impl From<&str> for OutboundPayload {
    fn from(text: &str) -> Self {
        OutboundPayload::Text(text.to_string())
    }
}

impl From<serde_json::Value> for OutboundPayload {
    fn from(value: serde_json::Value) -> Self {
        OutboundPayload::Rich(value)
    }
}
