//! calendrix-notifier
//!
//! Terminal front for the notification scheduler: polls the events API,
//! re-arms timers whenever the list changes, prints alerts and reads snooze
//! answers from stdin.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calendrix::{
    client::EventsClient,
    config::Config,
    models::{Event, EventsQuery},
    notifications::{Alert, AlertId, NotificationScheduler, Notifier, SnoozePrompt},
};

struct ConsoleNotifier {
    next_id: AtomicU64,
    open: Mutex<HashSet<AlertId>>,
    answers: Arc<tokio::sync::Mutex<Lines<BufReader<Stdin>>>>,
}

impl ConsoleNotifier {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashSet::new()),
            answers: Arc::new(tokio::sync::Mutex::new(
                BufReader::new(tokio::io::stdin()).lines(),
            )),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn show(&self, alert: Alert) -> AlertId {
        let id = AlertId(self.next_id.fetch_add(1, Ordering::Relaxed));
        println!("\n🔔 {}\n   {}\n   [{}]", alert.title, alert.body, alert.icon);
        if let Ok(mut open) = self.open.lock() {
            open.insert(id);
        }
        id
    }

    fn is_showing(&self, id: AlertId) -> bool {
        self.open.lock().map(|open| open.contains(&id)).unwrap_or(false)
    }

    fn close(&self, id: AlertId) {
        if let Ok(mut open) = self.open.lock() {
            open.remove(&id);
        }
    }

    fn ask_snooze(&self, prompt: SnoozePrompt) -> BoxFuture<'static, bool> {
        let answers = self.answers.clone();
        async move {
            let mut lines = answers.lock().await;
            println!("\n⏰ {}\n   {} [y/N]", prompt.title, prompt.body);
            match lines.next_line().await {
                Ok(Some(line)) => line.trim().eq_ignore_ascii_case("y"),
                // stdin closed: the prompt is simply never answered
                Ok(None) => futures::future::pending::<bool>().await,
                Err(e) => {
                    warn!("Failed to read snooze answer: {}", e);
                    false
                }
            }
        }
        .boxed()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = EventsClient::new(&config.notifier.api_url)?;
    let scheduler = NotificationScheduler::new(Arc::new(ConsoleNotifier::new()));
    let mut poll = tokio::time::interval(Duration::from_secs(config.notifier.poll_seconds.max(1)));
    let mut last: Option<Vec<Event>> = None;

    info!(api = %config.notifier.api_url, "Notifier started");

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match client.list_events(&EventsQuery::default()).await {
                    Ok(events) => {
                        // Only a different list counts as a refresh
                        if last.as_ref() != Some(&events) {
                            scheduler.rebuild(&events);
                            last = Some(events);
                        }
                    }
                    Err(e) => error!("Failed to fetch events: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                scheduler.shutdown();
                info!("Notifier stopped");
                return Ok(());
            }
        }
    }
}
