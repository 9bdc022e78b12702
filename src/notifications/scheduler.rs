//! scheduler.rs
//!
//! Per-event notification timers.
//!
//! Each armed event owns one tokio task that walks the state machine
//! `Armed -> Fired -> SnoozePending -> (Armed | Dismissed)`. The task's
//! `JoinHandle` is the cancellation handle: aborting it drops every pending
//! timer of that event at once.
//!
//! [`NotificationScheduler::rebuild`] is the only way to feed events in. It
//! tears everything down and re-arms from scratch, so an alert or snooze
//! prompt that is in flight for an event does not survive a refresh even
//! when the event is still in the new list.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::notifier::{Alert, AlertId, Notifier, SnoozePrompt};
use crate::models::Event;

/// Delay between an alert and the snooze prompt that replaces it.
pub const FOLLOW_UP_DELAY: Duration = Duration::from_secs(10);
/// How far an accepted snooze pushes the next alert.
pub const SNOOZE_DELAY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Idle,
    Armed,
    Fired,
    SnoozePending,
    Dismissed,
}

struct Slot {
    generation: u64,
    state: NotificationState,
    alert: Option<AlertId>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Slots {
    next_generation: u64,
    by_event: HashMap<Uuid, Slot>,
}

pub struct NotificationScheduler<N: Notifier> {
    notifier: Arc<N>,
    slots: Arc<Mutex<Slots>>,
}

impl<N: Notifier> NotificationScheduler<N> {
    pub fn new(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    /// Cancels everything and arms a timer for every event that has not started yet.
    /// Must be called from within a tokio runtime.
    pub fn rebuild(&self, events: &[Event]) {
        self.rebuild_at(events, Utc::now());
    }

    pub fn rebuild_at(&self, events: &[Event], now: DateTime<Utc>) {
        let mut slots = lock(&self.slots);
        for (_, slot) in slots.by_event.drain() {
            cancel_slot(self.notifier.as_ref(), slot);
        }

        for event in events {
            // Events already under way are never notified.
            let Ok(delay) = (event.start_time - now).to_std() else {
                continue;
            };
            if delay.is_zero() {
                continue;
            }

            slots.next_generation += 1;
            let generation = slots.next_generation;
            let task = tokio::spawn(drive(
                event.clone(),
                delay,
                generation,
                self.notifier.clone(),
                self.slots.clone(),
            ));

            slots.by_event.insert(
                event.id,
                Slot {
                    generation,
                    state: NotificationState::Armed,
                    alert: None,
                    task: Some(task),
                },
            );
        }

        info!(events = events.len(), armed = slots.by_event.len(), "Notification timers rebuilt");
    }

    /// The user dismissed the event's alert or prompt.
    pub fn dismiss(&self, event_id: Uuid) {
        let mut slots = lock(&self.slots);
        if let Some(slot) = slots.by_event.get_mut(&event_id) {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            if let Some(alert) = slot.alert.take() {
                self.notifier.close(alert);
            }
            slot.state = NotificationState::Dismissed;
            debug!(event_id = %event_id, "Notification dismissed");
        }
    }

    /// Cancels every timer and closes every open alert.
    pub fn shutdown(&self) {
        let mut slots = lock(&self.slots);
        for slot in slots.by_event.values_mut() {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            if let Some(alert) = slot.alert.take() {
                self.notifier.close(alert);
            }
            slot.state = NotificationState::Dismissed;
        }
        info!("Notification scheduler shut down");
    }

    pub fn state(&self, event_id: Uuid) -> NotificationState {
        lock(&self.slots)
            .by_event
            .get(&event_id)
            .map_or(NotificationState::Idle, |slot| slot.state)
    }

    pub fn armed_count(&self) -> usize {
        lock(&self.slots)
            .by_event
            .values()
            .filter(|slot| slot.task.is_some())
            .count()
    }
}

impl<N: Notifier> Drop for NotificationScheduler<N> {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        for (_, slot) in slots.by_event.drain() {
            cancel_slot(self.notifier.as_ref(), slot);
        }
    }
}

fn cancel_slot<N: Notifier>(notifier: &N, slot: Slot) {
    if let Some(task) = slot.task {
        task.abort();
    }
    if let Some(alert) = slot.alert {
        notifier.close(alert);
    }
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes a transition unless the slot was replaced by a newer arming pass.
fn transition(
    slots: &Mutex<Slots>,
    event_id: Uuid,
    generation: u64,
    state: NotificationState,
    alert: Option<AlertId>,
) -> bool {
    let mut slots = lock(slots);
    match slots.by_event.get_mut(&event_id) {
        Some(slot) if slot.generation == generation => {
            slot.state = state;
            slot.alert = alert;
            if state == NotificationState::Dismissed {
                slot.task = None;
            }
            true
        }
        _ => false,
    }
}

async fn drive<N: Notifier>(
    event: Event,
    first_delay: Duration,
    generation: u64,
    notifier: Arc<N>,
    slots: Arc<Mutex<Slots>>,
) {
    let mut delay = first_delay;

    loop {
        tokio::time::sleep(delay).await;

        let alert = notifier.show(Alert::for_event(&event));
        if !transition(&slots, event.id, generation, NotificationState::Fired, Some(alert)) {
            notifier.close(alert);
            return;
        }
        debug!(event_id = %event.id, "Event alert shown");

        tokio::time::sleep(FOLLOW_UP_DELAY).await;

        if !notifier.is_showing(alert) {
            transition(&slots, event.id, generation, NotificationState::Dismissed, None);
            return;
        }
        notifier.close(alert);
        transition(&slots, event.id, generation, NotificationState::SnoozePending, None);

        if !notifier.ask_snooze(SnoozePrompt::for_event(&event)).await {
            transition(&slots, event.id, generation, NotificationState::Dismissed, None);
            return;
        }

        debug!(event_id = %event.id, "Event snoozed");
        transition(&slots, event.id, generation, NotificationState::Armed, None);
        delay = SNOOZE_DELAY;
    }
}
