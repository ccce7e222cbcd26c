//! Reply texts and per-attachment outcomes.

use crate::media::{FetchError, RelayError, StoreError};
use std::path::PathBuf;

pub const UPLOAD_PROMPT: &str = "I'm ready to receive your file! Please send me your CV/resume now.";
pub const NO_ATTACHMENT_REPLY: &str =
    "Message received! Send me a file or type 'send file' to upload your CV/resume.";
pub const UPLOADED_REPLY: &str = "File received and uploaded to database successfully!";

/// Relay response bodies can be whole HTML error pages; keep replies short.
const MAX_DETAIL_CHARS: usize = 200;

/// Message bodies (trimmed, lower-cased) that ask how to send a file.
const UPLOAD_PHRASES: &[&str] = &[
    "send file",
    "upload file",
    "send cv",
    "upload cv",
    "send resume",
    "upload resume",
    "send a file",
    "upload a file",
    "send my cv",
    "upload my cv",
    "send my resume",
    "upload my resume",
];

/// True when the message body is one of the upload phrases (case-insensitive, surrounding whitespace ignored).
pub fn is_upload_request(body: Option<&str>) -> bool {
    let Some(body) = body else {
        return false;
    };
    let normalized = body.trim().to_lowercase();
    UPLOAD_PHRASES.iter().any(|p| *p == normalized)
}

/// What happened to one attachment.
#[derive(Debug)]
pub enum AttachmentOutcome {
    Uploaded {
        path: PathBuf,
        remote_reference: serde_json::Value,
    },
    FetchFailed(FetchError),
    StoreFailed(StoreError),
    /// Stored locally but the relay did not accept it.
    RelayFailed { path: PathBuf, error: RelayError },
}

impl AttachmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttachmentOutcome::Uploaded { .. })
    }

    /// Sentence for the sender describing this attachment.
    pub fn reply_text(&self) -> String {
        match self {
            AttachmentOutcome::Uploaded { .. } => UPLOADED_REPLY.to_string(),
            AttachmentOutcome::FetchFailed(e) => format!(
                "Sorry, I couldn't download your file ({}). Please try sending it again.",
                e
            ),
            AttachmentOutcome::StoreFailed(_) => {
                "Sorry, I couldn't save your file. Please try sending it again.".to_string()
            }
            AttachmentOutcome::RelayFailed { error, .. } => match error.detail() {
                Some(detail) => format!(
                    "File received but upload failed: {}: {}",
                    error,
                    truncate(detail, MAX_DETAIL_CHARS)
                ),
                None => format!("File received but upload failed: {}", error),
            },
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Which branch of the pipeline produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Body asked how to upload; attachments were not inspected.
    UploadPrompt,
    NoAttachment,
    /// One or more attachments were processed; see `outcomes`.
    Processed,
}

/// The single reply for one inbound event.
#[derive(Debug)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    /// One entry per attachment, in arrival order.
    pub outcomes: Vec<AttachmentOutcome>,
}

impl Reply {
    pub fn upload_prompt() -> Self {
        Self {
            kind: ReplyKind::UploadPrompt,
            text: UPLOAD_PROMPT.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn no_attachment() -> Self {
        Self {
            kind: ReplyKind::NoAttachment,
            text: NO_ATTACHMENT_REPLY.to_string(),
            outcomes: Vec::new(),
        }
    }

    /// One attachment: its sentence. Several: a header and one numbered line per attachment.
    /// No outcomes at all is the no-attachment reply.
    pub fn processed(outcomes: Vec<AttachmentOutcome>) -> Self {
        let text = match outcomes.as_slice() {
            [] => return Self::no_attachment(),
            [only] => only.reply_text(),
            many => {
                let uploaded = many.iter().filter(|o| o.is_success()).count();
                let mut out = format!(
                    "Received {} files, {} uploaded successfully:",
                    many.len(),
                    uploaded
                );
                for (i, o) in many.iter().enumerate() {
                    out.push_str(&format!("\n{}. {}", i + 1, o.reply_text()));
                }
                out
            }
        };
        Self {
            kind: ReplyKind::Processed,
            text,
            outcomes,
        }
    }

    /// True when every processed attachment was uploaded (vacuously true for prompt / no-attachment replies).
    pub fn all_uploaded(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_success())
    }
}
