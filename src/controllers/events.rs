use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CreateEventRequest, Event, EventsQuery, UpdateEventRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
}

// POST /events
async fn create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let event = state.events.create(req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

// GET /events?search=&startDate=&endDate=&sortBy=&sortOrder=
async fn list_events(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.events.list(query).await?))
}

// GET /events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Event>, AppError> {
    let Path(id) = id?;
    Ok(Json(state.events.find(id).await?))
}

// PATCH /events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    Ok(Json(state.events.update(id, req).await?))
}

// DELETE /events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.events.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
