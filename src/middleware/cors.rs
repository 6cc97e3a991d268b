// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Builds the CorsLayer from the configured origin list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use http::{header::HeaderName, HeaderValue, Method};
use maas_core::constants::headers::{REQUEST_ID, WEBHOOK_SECRET};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// An empty list or a `*` entry allows any origin. Otherwise only the
/// listed origins are allowed; entries that are not valid header values
/// are skipped.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
/// ```
pub fn setup_cors(config: &CorsConfig) -> CorsLayer {
    let wildcard =
        config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");

    let allow_origin = if wildcard {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static(REQUEST_ID),
            HeaderName::from_static(WEBHOOK_SECRET),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers([HeaderName::from_static(REQUEST_ID)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig, origin: &str) -> Option<String> {
        let router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(setup_cors(config));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let any = CorsConfig {
            allowed_origins: vec!["*".to_owned()],
        };
        assert_eq!(
            preflight(&any, "https://elsewhere.example.com").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_listed_origins_only() {
        let listed = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_owned(), " ".to_owned()],
        };
        assert_eq!(
            preflight(&listed, "https://app.example.com").await.as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(preflight(&listed, "https://evil.example.com").await, None);
    }
}
