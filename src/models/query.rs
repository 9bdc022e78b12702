use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::parse_date_bound;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Title,
    StartTime,
    EndTime,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// GET /events query string, exactly as the client sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Parsed filter and sort parameters for the query engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: Option<SortBy>,
    pub sort_order: SortOrder,
}

impl TryFrom<EventsQuery> for QueryParams {
    type Error = AppError;

    fn try_from(query: EventsQuery) -> Result<Self, Self::Error> {
        Ok(QueryParams {
            search: non_empty(query.search),
            start_date: non_empty(query.start_date)
                .map(|s| parse_date_bound("startDate", &s))
                .transpose()?,
            end_date: non_empty(query.end_date)
                .map(|s| parse_date_bound("endDate", &s))
                .transpose()?,
            sort_by: query.sort_by,
            sort_order: query.sort_order.unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
