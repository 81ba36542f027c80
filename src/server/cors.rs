//! Cross-origin policy for browser front ends.

use axum::http::{header::CONTENT_TYPE, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::Url;

/// Origins listed in configuration plus any local development origin.
pub fn cors_layer(configured: &[String]) -> CorsLayer {
    let allowed: Vec<String> = configured
        .iter()
        .map(|origin| normalize_origin(origin))
        .filter(|origin| !origin.is_empty())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            origin
                .to_str()
                .map(|origin| is_local_origin(origin) || allowed.iter().any(|allowed| allowed == origin))
                .unwrap_or(false)
        }))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Configured hosts may omit the scheme; those are served over https.
pub fn normalize_origin(origin: &str) -> String {
    let origin = origin.trim().trim_end_matches('/');
    if origin.is_empty() || origin.contains("://") {
        origin.to_string()
    } else {
        format!("https://{}", origin)
    }
}

/// `http://localhost:<port>` or `http://127.0.0.1:<port>`.
pub fn is_local_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };

    url.scheme() == "http"
        && matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"))
        && url.path() == "/"
        && has_explicit_port(origin)
}

fn has_explicit_port(origin: &str) -> bool {
    origin
        .rsplit_once(':')
        .map(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
