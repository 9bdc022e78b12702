//! media.rs
//!
//! Media reference tracking: decides which locally hosted files an event
//! stops referencing after an update or a delete, and asks the upload
//! handler to remove them. Removal is best effort; failures are logged and
//! never undo the event mutation that triggered them.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{Event, MediaRef, StoredFile};
use crate::services::uploads::UploadService;

/// Local files referenced by `previous` whose field changed in `updated`.
pub fn released_on_update(previous: &Event, updated: &Event) -> Vec<StoredFile> {
    [
        (&previous.image_url, &updated.image_url),
        (&previous.video_url, &updated.video_url),
    ]
    .into_iter()
    .filter(|(old, new)| url_of(old) != url_of(new))
    .filter_map(|(old, _)| old.as_ref().and_then(MediaRef::local_file).cloned())
    .collect()
}

/// Every local file referenced by a removed event.
pub fn released_on_delete(removed: &Event) -> Vec<StoredFile> {
    [&removed.image_url, &removed.video_url]
        .into_iter()
        .filter_map(|media| media.as_ref().and_then(MediaRef::local_file).cloned())
        .collect()
}

fn url_of(media: &Option<MediaRef>) -> Option<&str> {
    media.as_ref().map(MediaRef::url)
}

#[derive(Clone)]
pub struct MediaTracker {
    uploads: Arc<UploadService>,
}

impl MediaTracker {
    pub fn new(uploads: Arc<UploadService>) -> Self {
        Self { uploads }
    }

    pub async fn after_update(&self, previous: &Event, updated: &Event) {
        self.release(released_on_update(previous, updated), previous).await;
    }

    pub async fn after_delete(&self, removed: &Event) {
        self.release(released_on_delete(removed), removed).await;
    }

    async fn release(&self, files: Vec<StoredFile>, event: &Event) {
        for file in files {
            match self.uploads.delete(&file).await {
                Ok(true) => debug!(event_id = %event.id, filename = file.filename(), "Deleted media file"),
                Ok(false) => debug!(event_id = %event.id, filename = file.filename(), "Media file already gone"),
                Err(e) => warn!(
                    event_id = %event.id,
                    filename = file.filename(),
                    error = %e,
                    "Failed to delete media file"
                ),
            }
        }
    }
}
