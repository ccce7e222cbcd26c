//! Twilio WhatsApp webhook: form-encoded POST (`From`, `MessageSid`, `NumMedia`, `MediaUrl{i}`, ...).

use crate::channels::adapter::{ParseError, WebhookAdapter};
use crate::channels::inbound::{Attachment, InboundEvent};
use std::collections::HashMap;

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Twilio attaches at most 10 media items to one WhatsApp message.
const MAX_MEDIA: usize = 10;

/// Parses Twilio form posts. Each post is exactly one message with `NumMedia` indexed media slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwilioAdapter;

impl TwilioAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn required(fields: &HashMap<String, String>, key: &'static str) -> Result<String, ParseError> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or(ParseError::MissingField(key))
}

fn optional(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

impl WebhookAdapter for TwilioAdapter {
    fn id(&self) -> &str {
        "twilio"
    }

    fn parse(&self, body: &[u8]) -> Result<Vec<InboundEvent>, ParseError> {
        let fields: HashMap<String, String> =
            serde_urlencoded::from_bytes(body).map_err(|e| ParseError::Malformed(e.to_string()))?;

        let from = required(&fields, "From")?;
        let sender = from
            .strip_prefix(WHATSAPP_PREFIX)
            .unwrap_or(&from)
            .to_string();
        let message_id = required(&fields, "MessageSid")?;
        let num_media = match optional(&fields, "NumMedia") {
            None => 0,
            Some(n) => n
                .parse::<usize>()
                .ok()
                .filter(|&count| count <= MAX_MEDIA)
                .ok_or(ParseError::InvalidField {
                    field: "NumMedia",
                    value: n,
                })?,
        };

        let attachments = (0..num_media)
            .filter_map(|i| {
                let url = optional(&fields, &format!("MediaUrl{}", i))?;
                Some(Attachment {
                    url,
                    content_type: optional(&fields, &format!("MediaContentType{}", i)),
                    index: Some(i),
                })
            })
            .collect();

        Ok(vec![InboundEvent {
            sender,
            message_id,
            attachments,
            body: optional(&fields, "Body"),
        }])
    }
}
