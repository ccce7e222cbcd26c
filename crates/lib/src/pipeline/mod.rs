//! Webhook pipeline: per inbound event, fetch -> store -> relay each attachment and build one reply.

mod handler;
mod reply;

pub use handler::WebhookHandler;
pub use reply::{
    is_upload_request, AttachmentOutcome, Reply, ReplyKind, NO_ATTACHMENT_REPLY, UPLOADED_REPLY,
    UPLOAD_PROMPT,
};
