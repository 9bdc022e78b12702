//! events.rs
//!
//! Event service: validation, timestamps and media classification around
//! the in-memory store, with media cleanup after successful mutations.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    CreateEventRequest, Event, EventsQuery, MediaPatch, MediaRef, QueryParams, UpdateEventRequest,
};
use crate::services::media::MediaTracker;
use crate::services::query;
use crate::services::uploads::UploadService;
use crate::store::EventStore;

const INTERVAL_ERROR: &str = "Start time must be before end time";

#[derive(Clone)]
pub struct EventService {
    store: EventStore,
    uploads: Arc<UploadService>,
    media: MediaTracker,
}

impl EventService {
    pub fn new(store: EventStore, uploads: Arc<UploadService>) -> Self {
        let media = MediaTracker::new(uploads.clone());
        Self {
            store,
            uploads,
            media,
        }
    }

    pub async fn create(&self, req: CreateEventRequest) -> Result<Event, AppError> {
        req.validate()?;
        if req.start_time >= req.end_time {
            return Err(AppError::Validation(INTERVAL_ERROR.to_string()));
        }

        let image = self.classify(req.image_url.as_deref()).await;
        let video = self.classify(req.video_url.as_deref()).await;
        let event = self.store.insert(Event::new(req, image, video, Utc::now())).await;

        info!(event_id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn list(&self, raw: EventsQuery) -> Result<Vec<Event>, AppError> {
        let params = QueryParams::try_from(raw)?;
        let events = self.store.list().await;
        Ok(query::query(&events, &params))
    }

    pub async fn find(&self, id: Uuid) -> Result<Event, AppError> {
        self.store.find_by_id(id).await
    }

    /// Merges the supplied fields over the stored record. Nothing is written
    /// when the merged interval is empty or inverted.
    pub async fn update(&self, id: Uuid, req: UpdateEventRequest) -> Result<Event, AppError> {
        req.validate()?;

        let image = self.patch_for(req.image_url.as_deref()).await;
        let video = self.patch_for(req.video_url.as_deref()).await;
        let now = Utc::now();

        let (previous, updated) = self
            .store
            .update_with(id, |current| merge(current, req, image, video, now))
            .await?;

        info!(event_id = %id, "Event updated");
        self.media.after_update(&previous, &updated).await;
        Ok(updated)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.store.remove(id).await?;
        info!(event_id = %id, "Event deleted");
        self.media.after_delete(&removed).await;
        Ok(())
    }

    async fn classify(&self, url: Option<&str>) -> Option<MediaRef> {
        match url {
            Some(url) if !url.is_empty() => Some(self.uploads.resolve(url).await),
            _ => None,
        }
    }

    async fn patch_for(&self, url: Option<&str>) -> MediaPatch {
        match url {
            None => MediaPatch::Keep,
            Some("") => MediaPatch::Clear,
            Some(url) => MediaPatch::Set(self.uploads.resolve(url).await),
        }
    }
}

fn merge(
    current: &Event,
    req: UpdateEventRequest,
    image: MediaPatch,
    video: MediaPatch,
    now: DateTime<Utc>,
) -> Result<Event, AppError> {
    let mut next = current.clone();

    if let Some(title) = req.title {
        next.title = title;
    }
    if let Some(description) = req.description {
        next.description = Some(description);
    }
    if let Some(start) = req.start_time {
        next.start_time = start;
    }
    if let Some(end) = req.end_time {
        next.end_time = end;
    }
    next.image_url = image.apply(next.image_url);
    next.video_url = video.apply(next.video_url);

    if !next.has_valid_interval() {
        return Err(AppError::Validation(INTERVAL_ERROR.to_string()));
    }

    // Keep updatedAt strictly increasing even under a coarse clock.
    next.updated_at = if now > current.updated_at {
        now
    } else {
        current.updated_at + chrono::Duration::microseconds(1)
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadsConfig;
    use crate::services::uploads::MediaKind;
    use chrono::Duration;

    struct Fixture {
        _tmp: tempfile::TempDir,
        uploads: Arc<UploadService>,
        service: EventService,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = Arc::new(UploadService::new(UploadsConfig::with_dir(tmp.path())));
        let service = EventService::new(EventStore::new(), uploads.clone());
        Fixture {
            _tmp: tmp,
            uploads,
            service,
        }
    }

    fn create_request(title: &str) -> CreateEventRequest {
        let start = Utc::now() + Duration::hours(1);
        CreateEventRequest {
            title: title.to_string(),
            description: Some("sync".into()),
            start_time: start,
            end_time: start + Duration::hours(1),
            image_url: None,
            video_url: None,
        }
    }

    #[tokio::test]
    async fn created_ids_are_unique() {
        let f = fixture();
        let mut ids = std::collections::HashSet::new();
        for i in 0..50 {
            let event = f.service.create(create_request(&format!("Event {i}"))).await.unwrap();
            assert_eq!(event.created_at, event.updated_at);
            assert!(ids.insert(event.id));
        }
    }

    #[tokio::test]
    async fn create_rejects_empty_interval() {
        let f = fixture();
        let mut req = create_request("Standup");
        req.end_time = req.start_time;

        let err = f.service.create(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(f.service.list(EventsQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let f = fixture();
        let created = f.service.create(create_request("Standup")).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                UpdateEventRequest {
                    title: Some("Daily Standup".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Daily Standup");
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.start_time, created.start_time);
        assert_eq!(updated.end_time, created.end_time);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(f.service.find(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_producing_inverted_interval_changes_nothing() {
        let f = fixture();
        let created = f.service.create(create_request("Standup")).await.unwrap();

        let err = f
            .service
            .update(
                created.id,
                UpdateEventRequest {
                    title: Some("Renamed".into()),
                    start_time: Some(created.end_time),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.service.find(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .update(Uuid::new_v4(), UpdateEventRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn replacing_local_image_deletes_old_file() {
        let f = fixture();
        let first = f
            .uploads
            .store(MediaKind::Image, Some("a.png"), Some("image/png"), b"a")
            .await
            .unwrap();
        let second = f
            .uploads
            .store(MediaKind::Image, Some("b.png"), Some("image/png"), b"b")
            .await
            .unwrap();

        let mut req = create_request("Standup");
        req.image_url = Some(first.url.clone());
        let created = f.service.create(req).await.unwrap();
        assert!(created.image_url.as_ref().unwrap().is_local());

        f.service
            .update(
                created.id,
                UpdateEventRequest {
                    image_url: Some(second.url.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!f.uploads.dir().join(&first.filename).exists());
        assert!(f.uploads.dir().join(&second.filename).exists());
    }

    #[tokio::test]
    async fn remove_deletes_local_media_but_not_external() {
        let f = fixture();
        let image = f
            .uploads
            .store(MediaKind::Image, Some("a.webp"), Some("image/webp"), b"a")
            .await
            .unwrap();

        let mut req = create_request("Launch");
        req.image_url = Some(image.url.clone());
        req.video_url = Some("https://www.youtube.com/watch?v=abc".into());
        let created = f.service.create(req).await.unwrap();

        f.service.remove(created.id).await.unwrap();

        assert!(!f.uploads.dir().join(&image.filename).exists());
        assert!(matches!(
            f.service.find(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_survives_already_deleted_file() {
        let f = fixture();
        let image = f
            .uploads
            .store(MediaKind::Image, Some("a.png"), Some("image/png"), b"a")
            .await
            .unwrap();
        let mut req = create_request("Launch");
        req.image_url = Some(image.url.clone());
        let created = f.service.create(req).await.unwrap();

        std::fs::remove_file(f.uploads.dir().join(&image.filename)).unwrap();
        f.service.remove(created.id).await.unwrap();
    }

    #[test]
    fn merge_bumps_updated_at_with_frozen_clock() {
        let now = Utc::now();
        let current = Event::new(create_request("Standup"), None, None, now);
        let next = merge(
            &current,
            UpdateEventRequest::default(),
            MediaPatch::Keep,
            MediaPatch::Keep,
            now,
        )
        .unwrap();
        assert!(next.updated_at > current.updated_at);
    }
}
