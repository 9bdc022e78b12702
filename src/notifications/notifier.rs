use futures::future::BoxFuture;

use crate::models::Event;

pub const DEFAULT_ICON: &str = "/calendrix-icon.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlertId(pub u64);

/// User-facing alert raised when an event starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Alert {
    pub fn for_event(event: &Event) -> Self {
        Alert {
            title: format!("Event: {}", event.title),
            body: event
                .description
                .clone()
                .unwrap_or_else(|| "Your scheduled event is now.".to_string()),
            icon: event
                .image_url
                .as_ref()
                .map(|m| m.url().to_string())
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
        }
    }
}

/// Follow-up question shown when an alert has been left open.
#[derive(Debug, Clone, PartialEq)]
pub struct SnoozePrompt {
    pub title: String,
    pub body: String,
}

impl SnoozePrompt {
    pub fn for_event(event: &Event) -> Self {
        SnoozePrompt {
            title: "Snooze event?".to_string(),
            body: format!("Click to snooze \"{}\" for 5 minutes", event.title),
        }
    }
}

/// Display surface for alerts (desktop notifications, a terminal, a test double).
pub trait Notifier: Send + Sync + 'static {
    fn show(&self, alert: Alert) -> AlertId;

    /// Whether the user still has the alert open.
    fn is_showing(&self, id: AlertId) -> bool;

    fn close(&self, id: AlertId);

    /// Resolves to `true` once the user accepts the snooze. A prompt that is
    /// never answered never resolves.
    fn ask_snooze(&self, prompt: SnoozePrompt) -> BoxFuture<'static, bool>;
}
