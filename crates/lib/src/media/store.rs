//! Download directory: deterministic names, whole-file writes.

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("creating download directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("media stream interrupted: {0}")]
    Stream(String),
}

/// A file fully written under the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
}

/// Writes media under one directory. Names are unique per (sender, message, index), so a
/// redelivered message replaces its own file and never touches another message's.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the download directory if missing. Safe to call repeatedly.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    /// `{sender}_{message_id}_{index}{extension}`; the index is left out for providers with a single media slot.
    pub fn file_name(
        sender: &str,
        message_id: &str,
        index: Option<usize>,
        extension: &str,
    ) -> String {
        let sender = sanitize_component(sender);
        let message_id = sanitize_component(message_id);
        match index {
            Some(i) => format!("{}_{}_{}{}", sender, message_id, i, extension),
            None => format!("{}_{}{}", sender, message_id, extension),
        }
    }

    /// Write the stream to its deterministic path. The data goes to a private temporary file
    /// first and is renamed into place only once complete; on error the final path is left untouched.
    pub async fn save<S, E>(
        &self,
        sender: &str,
        message_id: &str,
        index: Option<usize>,
        extension: &str,
        stream: S,
    ) -> Result<StoredFile, StoreError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        self.ensure_dir().await?;
        let name = Self::file_name(sender, message_id, index, extension);
        let path = self.dir.join(&name);
        let tmp = self
            .dir
            .join(format!(".{}.{}.part", name, uuid::Uuid::new_v4()));

        let written = write_stream(&tmp, stream).await;
        let result = match written {
            Ok(bytes) => tokio::fs::rename(&tmp, &path)
                .await
                .map(|_| bytes)
                .map_err(|source| StoreError::Write {
                    path: path.clone(),
                    source,
                }),
            Err(e) => Err(e),
        };
        match result {
            Ok(bytes) => {
                log::info!("saved {} ({} bytes)", path.display(), bytes);
                Ok(StoredFile { path })
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&tmp).await {
                    log::debug!("removing partial file {}: {}", tmp.display(), rm);
                }
                Err(e)
            }
        }
    }
}

async fn write_stream<S, E>(tmp: &Path, stream: S) -> Result<u64, StoreError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let write_err = |source| StoreError::Write {
        path: tmp.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(tmp).await.map_err(write_err)?;
    let mut total = 0u64;
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| StoreError::Stream(e.to_string()))?;
        file.write_all(&chunk).await.map_err(write_err)?;
        total += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    Ok(total)
}

/// Keep names inside the download directory: path separators and control characters become `_`.
fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
