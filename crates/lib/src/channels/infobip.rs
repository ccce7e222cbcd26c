//! Infobip WhatsApp webhook: JSON body with a `results` batch.

use crate::channels::adapter::{ParseError, WebhookAdapter};
use crate::channels::inbound::{Attachment, InboundEvent};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InfobipWebhook {
    #[serde(default)]
    results: Vec<InfobipResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfobipResult {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    message: Option<InfobipMessage>,
}

#[derive(Debug, Deserialize)]
struct InfobipMessage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<InfobipContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfobipContent {
    #[serde(default)]
    media_url: Option<String>,
}

impl InfobipMessage {
    /// Media URL from `message.url`, else `message.content.mediaUrl`.
    fn media_url(&self) -> Option<String> {
        non_empty(self.url.as_deref())
            .or_else(|| non_empty(self.content.as_ref().and_then(|c| c.media_url.as_deref())))
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(|v| v.trim()).filter(|v| !v.is_empty()).map(|v| v.to_string())
}

/// Parses Infobip JSON webhooks. Each result is one message with at most one media item.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfobipAdapter;

impl InfobipAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl WebhookAdapter for InfobipAdapter {
    fn id(&self) -> &str {
        "infobip"
    }

    fn parse(&self, body: &[u8]) -> Result<Vec<InboundEvent>, ParseError> {
        let webhook: InfobipWebhook =
            serde_json::from_slice(body).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let mut events = Vec::with_capacity(webhook.results.len());
        for (position, r) in webhook.results.into_iter().enumerate() {
            let (Some(message_id), Some(sender)) = (
                non_empty(r.message_id.as_deref()),
                non_empty(r.from.as_deref()),
            ) else {
                log::warn!(
                    "skipping infobip result {} without messageId or from",
                    position
                );
                continue;
            };
            let (attachments, text): (Vec<Attachment>, Option<String>) = match r.message {
                Some(m) => {
                    let attachments = m
                        .media_url()
                        .map(|url| Attachment {
                            url,
                            content_type: None,
                            index: None,
                        })
                        .into_iter()
                        .collect();
                    (attachments, non_empty(m.text.as_deref()))
                }
                None => (Vec::new(), None),
            };
            if attachments.is_empty() {
                log::debug!(
                    "infobip message {} from {} has no recognized media url",
                    message_id,
                    sender
                );
            }
            events.push(InboundEvent {
                sender,
                message_id,
                attachments,
                body: text,
            });
        }
        Ok(events)
    }
}
