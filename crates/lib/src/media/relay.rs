//! Relay API client: forwards stored files as multipart uploads.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay returned status {status}")]
    Status { status: u16, body: String },
    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay response was not valid JSON: {0}")]
    InvalidResponse(String),
    #[error("reading {} for upload: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RelayError {
    /// Extra detail worth showing to the sender (the relay's response body), if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            RelayError::Status { body, .. } => {
                let b = body.trim();
                if b.is_empty() {
                    None
                } else {
                    Some(b)
                }
            }
            _ => None,
        }
    }
}

/// Outcome of one upload. Consumed right away by the webhook pipeline.
#[derive(Debug)]
pub enum RelayResult {
    Success { remote_reference: serde_json::Value },
    Failure(RelayError),
}

impl RelayResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RelayResult::Success { .. })
    }
}

/// Uploads files to a fixed relay endpoint. One attempt per call; no retries.
#[derive(Clone)]
pub struct RelayUploader {
    endpoint: String,
    client: reqwest::Client,
}

impl RelayUploader {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the file as multipart field `file`, streamed from disk. The content type is derived from the stored
    /// file's extension. 200 and 201 with a JSON body are success; everything else is a failure value.
    pub async fn upload(&self, path: &Path, sender: &str) -> RelayResult {
        match self.try_upload(path).await {
            Ok(remote_reference) => {
                log::info!(
                    "uploaded {} for {} to relay: {}",
                    path.display(),
                    sender,
                    remote_reference
                );
                RelayResult::Success { remote_reference }
            }
            Err(e) => {
                log::warn!("relay upload of {} for {} failed: {}", path.display(), sender, e);
                if let Some(detail) = e.detail() {
                    log::debug!("relay response body: {}", detail);
                }
                RelayResult::Failure(e)
            }
        }
    }

    async fn try_upload(&self, path: &Path) -> Result<serde_json::Value, RelayError> {
        let read_err = |source: std::io::Error| RelayError::ReadFile {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(read_err)?;
        let len = file.metadata().await.map_err(read_err)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        // Streamed from disk chunk by chunk; the length keeps Content-Length on the part.
        let part = reqwest::multipart::Part::stream_with_length(reqwest::Body::from(file), len)
            .file_name(file_name)
            .mime_str(content_type.as_ref())?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = res.status().as_u16();
        if status != 200 && status != 201 {
            let body = res.text().await.unwrap_or_default();
            return Err(RelayError::Status { status, body });
        }
        res.json::<serde_json::Value>()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))
    }
}
