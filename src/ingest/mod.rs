//! Media ingestion pipeline
//!
//! Runs after the webhook response has been sent: resolves the media id,
//! uploads the bytes to object storage, then records a media row. Failures
//! never reach the original caller; the spawned task logs its outcome.

use crate::channels::WhatsAppChannel;
use crate::db::{Media, MediaRepo, NewMedia};
use crate::storage::ObjectStore;
use crate::Result;

/// Work item for one image attachment
#[derive(Debug, Clone)]
pub struct IngestJob {
    /// Sender phone number
    pub sender: Option<String>,
    /// Owning message log row id
    pub message_log_id: String,
    /// Provider message identifier
    pub whatsapp_message_id: Option<String>,
    /// Provider media identifier to resolve
    pub media_id: String,
    /// MIME type declared in the envelope (not the fetched one)
    pub mime_type: Option<String>,
}

/// Media ingestion pipeline
#[derive(Clone)]
pub struct MediaIngestor {
    channel: WhatsAppChannel,
    store: ObjectStore,
    media_repo: MediaRepo,
}

impl MediaIngestor {
    /// Create a new ingestor
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(channel: WhatsAppChannel, store: ObjectStore, media_repo: MediaRepo) -> Self {
        Self {
            channel,
            store,
            media_repo,
        }
    }

    /// Fetch, upload, and record one attachment
    ///
    /// A fetch failure aborts before any upload or row insert. If the row
    /// insert fails after a successful upload, the uploaded object is
    /// deleted best-effort so storage and metadata do not silently diverge.
    ///
    /// # Errors
    ///
    /// Returns error if any stage fails
    pub async fn ingest(&self, job: IngestJob) -> Result<Media> {
        let (data, content_type) = self.channel.fetch_media(&job.media_id).await?;

        let key = storage_key(
            job.sender.as_deref(),
            job.whatsapp_message_id.as_deref(),
            job.mime_type.as_deref(),
        );

        self.store
            .put_object(&key, data, Some(&content_type))
            .await?;

        let inserted = self.media_repo.insert(NewMedia {
            message_log_id: job.message_log_id,
            whatsapp_message_id: job.whatsapp_message_id,
            user_id: job.sender,
            media_id: job.media_id,
            media_type: "image".to_string(),
            // Record the MIME type observed on the download, not the declared one
            mime_type: Some(content_type),
            storage_key: key.clone(),
        });

        match inserted {
            Ok(media) => Ok(media),
            Err(e) => {
                if let Err(cleanup) = self.store.delete_object(&key).await {
                    tracing::warn!(key, error = %cleanup, "orphaned object cleanup failed");
                }
                Err(e)
            }
        }
    }

    /// Run `ingest` on a detached task, logging the outcome
    ///
    /// Fire-and-forget: the webhook response does not wait on this.
    pub fn spawn(&self, job: IngestJob) -> tokio::task::JoinHandle<()> {
        let ingestor = self.clone();
        tokio::spawn(async move {
            let media_id = job.media_id.clone();
            match ingestor.ingest(job).await {
                Ok(media) => {
                    tracing::info!(media_id, key = %media.storage_key, "media ingested");
                }
                Err(e) => {
                    tracing::error!(media_id, error = %e, "media ingestion failed");
                }
            }
        })
    }
}

/// Derive the object storage key for an attachment
///
/// The extension follows the MIME type declared in the envelope: `jpg` for
/// `image/jpeg`, a generic `bin` otherwise.
fn storage_key(
    sender: Option<&str>,
    whatsapp_message_id: Option<&str>,
    declared_mime: Option<&str>,
) -> String {
    let ext = if declared_mime == Some("image/jpeg") {
        "jpg"
    } else {
        "bin"
    };

    format!(
        "images/{}/{}.{ext}",
        sender.unwrap_or("unknown"),
        whatsapp_message_id.unwrap_or("unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_jpeg() {
        let key = storage_key(Some("15551234567"), Some("wamid.abc"), Some("image/jpeg"));
        assert_eq!(key, "images/15551234567/wamid.abc.jpg");
    }

    #[test]
    fn test_storage_key_other_mime() {
        let key = storage_key(Some("15551234567"), Some("wamid.abc"), Some("image/png"));
        assert_eq!(key, "images/15551234567/wamid.abc.bin");

        let key = storage_key(Some("15551234567"), Some("wamid.abc"), None);
        assert_eq!(key, "images/15551234567/wamid.abc.bin");
    }

    #[test]
    fn test_storage_key_missing_parts() {
        let key = storage_key(None, None, Some("image/jpeg"));
        assert_eq!(key, "images/unknown/unknown.jpg");
    }
}
