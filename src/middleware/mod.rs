//! CORS policy: exactly one trusted frontend origin, credentials allowed.

use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::CorsConfig;

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin(&config.allowed_origin))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .allow_credentials(true)
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn allowed_origin(origin: &str) -> AllowOrigin {
    match origin.trim().parse::<HeaderValue>() {
        Ok(value) => {
            info!("CORS: allowing origin {}", origin.trim());
            AllowOrigin::exact(value)
        }
        Err(e) => {
            // Credentialed CORS cannot use a wildcard, so fall back to no cross-origin access.
            warn!("CORS: invalid origin '{}': {}; cross-origin requests disabled", origin, e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn router(origin: &str) -> Router {
        Router::new()
            .route("/events", get(|| async { "[]" }))
            .layer(cors_layer(&CorsConfig {
                allowed_origin: origin.to_string(),
            }))
    }

    #[tokio::test]
    async fn configured_origin_gets_credentialed_access() {
        let response = router("http://localhost:3001")
            .oneshot(
                Request::get("/events")
                    .header(header::ORIGIN, "http://localhost:3001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3001"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn other_origins_are_not_echoed() {
        let response = router("http://localhost:3001")
            .oneshot(
                Request::get("/events")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
