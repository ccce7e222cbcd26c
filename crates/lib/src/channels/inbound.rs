//! Inbound event from a provider webhook, normalized for the media pipeline.

/// One media reference inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    /// Content type declared by the provider; may be absent or wrong.
    pub content_type: Option<String>,
    /// Position within the message. None when the provider has a single media slot per message.
    pub index: Option<usize>,
}

/// A message received over a channel. Request-scoped and never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Sender address without provider prefixes (e.g. "+33756941611").
    pub sender: String,
    /// Provider-assigned message id, unique per message.
    pub message_id: String,
    pub attachments: Vec<Attachment>,
    pub body: Option<String>,
}

impl InboundEvent {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
