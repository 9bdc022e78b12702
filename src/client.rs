//! client.rs
//!
//! Minimal typed client for the events API, used by the notifier binary.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Event, EventsQuery};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not encode query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    #[error("HTTP error! status: {0}")]
    Status(StatusCode),
}

#[derive(Clone)]
pub struct EventsClient {
    http: reqwest::Client,
    base_url: String,
}

impl EventsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn events_url(&self, query: &EventsQuery) -> Result<String, ClientError> {
        let qs = serde_urlencoded::to_string(query)?;
        Ok(if qs.is_empty() {
            format!("{}/events", self.base_url)
        } else {
            format!("{}/events?{}", self.base_url, qs)
        })
    }

    // GET /events
    pub async fn list_events(&self, query: &EventsQuery) -> Result<Vec<Event>, ClientError> {
        let response = self.http.get(self.events_url(query)?).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
