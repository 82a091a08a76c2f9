use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// Origins from `ALLOWED_ORIGINS` (comma separated), else the local web app.
pub fn cors_layer() -> CorsLayer {
    let allowed_env = std::env::var("ALLOWED_ORIGINS").unwrap_or_default();
    let from_env: Vec<HeaderValue> = allowed_env
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring malformed origin {:?}", origin);
                None
            }
        })
        .collect();

    let origins = if from_env.is_empty() {
        vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]
    } else {
        from_env
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
