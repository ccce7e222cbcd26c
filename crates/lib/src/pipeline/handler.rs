//! Per-event orchestration of the media pipeline.

use crate::channels::{Attachment, InboundEvent};
use crate::media::{
    extension_for, LocalStore, MediaAuth, MediaFetcher, RelayResult, RelayUploader,
    FALLBACK_EXTENSION,
};
use crate::pipeline::reply::{is_upload_request, AttachmentOutcome, Reply};

/// Runs fetch -> store -> relay for each attachment of an event and builds the reply.
/// Holds no per-request state; one instance serves concurrent requests for a provider.
#[derive(Clone)]
pub struct WebhookHandler {
    fetcher: MediaFetcher,
    auth: MediaAuth,
    store: LocalStore,
    relay: RelayUploader,
}

impl WebhookHandler {
    pub fn new(
        fetcher: MediaFetcher,
        auth: MediaAuth,
        store: LocalStore,
        relay: RelayUploader,
    ) -> Self {
        Self {
            fetcher,
            auth,
            store,
            relay,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Process one event. Never fails: every per-attachment error ends up in the reply.
    pub async fn handle(&self, event: &InboundEvent) -> Reply {
        log::info!(
            "received message {} from {} with {} attachment(s)",
            event.message_id,
            event.sender,
            event.attachments.len()
        );

        if is_upload_request(event.body.as_deref()) {
            log::debug!("message {} asks how to upload, sending prompt", event.message_id);
            return Reply::upload_prompt();
        }
        if !event.has_attachments() {
            if let Some(ref body) = event.body {
                log::debug!("message {} body: {}", event.message_id, body);
            }
            return Reply::no_attachment();
        }

        // Sequential on purpose: reply order follows attachment order.
        let mut outcomes = Vec::with_capacity(event.attachments.len());
        for attachment in &event.attachments {
            outcomes.push(self.process_attachment(event, attachment).await);
        }
        let reply = Reply::processed(outcomes);
        if reply.all_uploaded() {
            log::info!("message {}: all attachments uploaded", event.message_id);
        } else {
            log::warn!("message {}: {}", event.message_id, reply.text);
        }
        reply
    }

    async fn process_attachment(
        &self,
        event: &InboundEvent,
        attachment: &Attachment,
    ) -> AttachmentOutcome {
        let media = match self.fetcher.fetch(&attachment.url, &self.auth).await {
            Ok(media) => media,
            Err(e) => return AttachmentOutcome::FetchFailed(e),
        };

        // Declared type first; when it is absent or unknown the response header decides.
        let mut extension = extension_for(attachment.content_type.as_deref());
        if extension == FALLBACK_EXTENSION {
            extension = extension_for(media.content_type());
        }
        let stored = match self
            .store
            .save(
                &event.sender,
                &event.message_id,
                attachment.index,
                &extension,
                media.into_stream(),
            )
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!(
                    "storing attachment of message {} failed: {}",
                    event.message_id,
                    e
                );
                return AttachmentOutcome::StoreFailed(e);
            }
        };

        match self.relay.upload(&stored.path, &event.sender).await {
            RelayResult::Success { remote_reference } => AttachmentOutcome::Uploaded {
                path: stored.path,
                remote_reference,
            },
            RelayResult::Failure(error) => AttachmentOutcome::RelayFailed {
                path: stored.path,
                error,
            },
        }
    }
}
