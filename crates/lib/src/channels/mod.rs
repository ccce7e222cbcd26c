//! Messaging providers (Twilio, Infobip).
//!
//! Each provider delivers webhooks in its own shape. A [`WebhookAdapter`] turns the raw request
//! body into normalized [`InboundEvent`]s; nothing downstream knows which provider sent them.

mod adapter;
mod inbound;
mod infobip;
mod twilio;

pub use adapter::{ParseError, WebhookAdapter};
pub use inbound::{Attachment, InboundEvent};
pub use infobip::InfobipAdapter;
pub use twilio::TwilioAdapter;
