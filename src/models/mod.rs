pub mod event;
pub mod media;
pub mod query;
pub mod timestamp;

pub use event::{CreateEventRequest, Event, MediaPatch, UpdateEventRequest};
pub use media::{MediaRef, StoredFile};
pub use query::{EventsQuery, QueryParams, SortBy, SortOrder};
