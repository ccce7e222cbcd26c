//! Wire formats for webhook replies: TwiML for Twilio, a JSON status object for Infobip.

use serde::{Deserialize, Serialize};

/// `{ "status": "success" | "error", "message"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookStatus {
    pub status: WebhookStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatusKind {
    Success,
    Error,
}

impl WebhookStatus {
    pub fn success(message: Option<String>) -> Self {
        Self {
            status: WebhookStatusKind::Success,
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: WebhookStatusKind::Error,
            message: Some(message.into()),
        }
    }
}

/// TwiML messaging response carrying one reply message.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twiml_escapes_text() {
        assert_eq!(
            twiml_message("type 'send file' <now> & go"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>type &apos;send file&apos; &lt;now&gt; &amp; go</Message></Response>"
        );
    }

    #[test]
    fn status_json_shape() {
        let ok = serde_json::to_value(WebhookStatus::success(None)).unwrap();
        assert_eq!(ok, serde_json::json!({ "status": "success" }));
        let err = serde_json::to_value(WebhookStatus::error("bad body")).unwrap();
        assert_eq!(err, serde_json::json!({ "status": "error", "message": "bad body" }));
    }
}
