//! Provider adapter trait: raw webhook body -> normalized events.

use crate::channels::inbound::InboundEvent;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed webhook body: {0}")]
    Malformed(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses one provider's webhook payloads. Add a provider by adding an adapter.
pub trait WebhookAdapter: Send + Sync {
    /// Provider id (e.g. "twilio"); also names the provider's download subdirectory.
    fn id(&self) -> &str;

    /// Parse a raw request body into zero or more events (Infobip batches several messages per call).
    fn parse(&self, body: &[u8]) -> Result<Vec<InboundEvent>, ParseError>;
}
