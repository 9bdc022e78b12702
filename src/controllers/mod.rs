pub mod events;
pub mod uploads;

use axum::Router;
use std::sync::Arc;

use crate::services::uploads::UploadService;

pub fn routes(uploads: &UploadService) -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(uploads::routes(uploads))
}
