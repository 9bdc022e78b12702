//! Client-side event notifications.
//!
//! [`NotificationScheduler`] arms one timer per upcoming event and drives the
//! alert / follow-up / snooze cycle; the actual display is delegated to a
//! [`Notifier`] implementation.

pub mod notifier;
pub mod scheduler;

pub use notifier::{Alert, AlertId, Notifier, SnoozePrompt};
pub use scheduler::{NotificationScheduler, NotificationState, FOLLOW_UP_DELAY, SNOOZE_DELAY};
