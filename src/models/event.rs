use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{timestamp, MediaRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<MediaRef>,
    #[serde(rename = "videoURL", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Stamps a fresh record from an already validated request.
    pub fn new(
        req: CreateEventRequest,
        image_url: Option<MediaRef>,
        video_url: Option<MediaRef>,
        now: DateTime<Utc>,
    ) -> Self {
        Event {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            image_url,
            video_url,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_valid_interval(&self) -> bool {
        self.start_time < self.end_time
    }
}

// POST /events
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEventRequest {
    #[validate(length(min = 3, message = "title must be longer than or equal to 3 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "timestamp::start_time")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::end_time")]
    pub end_time: DateTime<Utc>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "videoURL")]
    pub video_url: Option<String>,
}

// PATCH /events/{id}
//
// Every field is optional; only the ones present overwrite the stored record.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, message = "title must be longer than or equal to 3 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::optional_start_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::optional_end_time")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "videoURL")]
    pub video_url: Option<String>,
}

/// A media field as supplied by an update request, after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPatch {
    Keep,
    Clear,
    Set(MediaRef),
}

impl MediaPatch {
    pub fn apply(self, current: Option<MediaRef>) -> Option<MediaRef> {
        match self {
            MediaPatch::Keep => current,
            MediaPatch::Clear => None,
            MediaPatch::Set(media) => Some(media),
        }
    }
}
