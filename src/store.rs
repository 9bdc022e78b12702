//! store.rs
//!
//! In-memory event store. The whole collection sits behind one async RwLock,
//! so each exposed operation is a single indivisible step for its caller and
//! a read-modify-write (`update_with`) can never lose a concurrent update.

use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Event;

#[derive(Clone, Default)]
pub struct EventStore {
    events: Arc<RwLock<Vec<Event>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, event: Event) -> Event {
        let mut events = self.events.write().await;
        events.push(event.clone());
        event
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Event, AppError> {
        let events = self.events.read().await;
        events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(AppError::NotFound(id))
    }

    /// Snapshot of every record, in insertion order.
    pub async fn list(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    pub async fn replace(&self, id: Uuid, merged: Event) -> Result<Event, AppError> {
        let mut events = self.events.write().await;
        let slot = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound(id))?;
        *slot = merged.clone();
        Ok(merged)
    }

    /// Applies `merge` to the current record while holding the write lock.
    ///
    /// `merge` works on a copy; the stored record is only overwritten when it
    /// returns `Ok`. Returns `(previous, updated)`.
    pub async fn update_with<F>(&self, id: Uuid, merge: F) -> Result<(Event, Event), AppError>
    where
        F: FnOnce(&Event) -> Result<Event, AppError>,
    {
        let mut events = self.events.write().await;
        let slot = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound(id))?;

        let updated = merge(&*slot)?;
        let previous = std::mem::replace(slot, updated.clone());
        Ok((previous, updated))
    }

    pub async fn remove(&self, id: Uuid) -> Result<Event, AppError> {
        let mut events = self.events.write().await;
        let index = events
            .iter()
            .position(|e| e.id == id)
            .ok_or(AppError::NotFound(id))?;
        Ok(events.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
