//! Gateway: HTTP webhook endpoints for messaging providers.
//!
//! Single port serves every provider route plus a health probe. Each provider pairs a
//! [`WebhookAdapter`](crate::channels::WebhookAdapter) with its own pipeline handler.

mod protocol;
mod server;

pub use protocol::{twiml_message, WebhookStatus, WebhookStatusKind};
pub use server::{build_state, router, run_gateway, GatewayState, ProviderPipeline};
