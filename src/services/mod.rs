pub mod events;
pub mod media;
pub mod query;
pub mod uploads;
