//! query.rs
//!
//! Derived, ordered views over the event collection: search, start-date
//! window and sorting. Pure functions; the input slice is never touched.

use std::cmp::Ordering;

use crate::models::{Event, QueryParams, SortBy, SortOrder};

pub fn query(events: &[Event], params: &QueryParams) -> Vec<Event> {
    let needle = params.search.as_deref().map(str::to_lowercase);

    let mut matched: Vec<Event> = events
        .iter()
        .filter(|e| needle.as_deref().map_or(true, |n| matches_search(e, n)))
        .filter(|e| params.start_date.map_or(true, |from| e.start_time >= from))
        .filter(|e| params.end_date.map_or(true, |to| e.start_time <= to))
        .cloned()
        .collect();

    // Ties keep insertion order in both directions.
    if let Some(sort_by) = params.sort_by {
        matched.sort_by(|a, b| {
            let ord = compare_by(sort_by, a, b);
            match params.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    matched
}

/// Case-insensitive substring match on title or description.
fn matches_search(event: &Event, needle: &str) -> bool {
    event.title.to_lowercase().contains(needle)
        || event
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn compare_by(sort_by: SortBy, a: &Event, b: &Event) -> Ordering {
    match sort_by {
        SortBy::Title => a.title.cmp(&b.title),
        SortBy::StartTime => a.start_time.cmp(&b.start_time),
        SortBy::EndTime => a.end_time.cmp(&b.end_time),
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
