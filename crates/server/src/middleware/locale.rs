//! Locale prefix routing for page URLs.
//!
//! Page paths always start with a supported locale (`/hi/dashboard`). Requests
//! without one are redirected to the negotiated locale; API and asset paths
//! pass through untouched.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use services::services::locales;

/// Cookie the client sets when the user picks a language.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

const BYPASS_PREFIXES: &[&str] = &["/api", "/uploads", "/_next", "/static", "/assets"];
const BYPASS_FILES: &[&str] = &["/favicon.ico", "/robots.txt"];

/// Locale of the current page request, taken from the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale(pub &'static str);

impl Locale {
    pub fn code(&self) -> &'static str {
        self.0
    }

    pub fn is_rtl(&self) -> bool {
        locales::lookup(self.0).is_some_and(|l| l.rtl)
    }
}

fn bypasses(path: &str) -> bool {
    BYPASS_FILES.contains(&path)
        || BYPASS_PREFIXES
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
}

fn cookie_locale(headers: &HeaderMap) -> Option<&'static str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LOCALE_COOKIE)
        .and_then(|(_, value)| locales::find(value))
}

/// Cookie first, then `Accept-Language`, then the configured default.
pub fn negotiate(headers: &HeaderMap, default_locale: &'static str) -> &'static str {
    cookie_locale(headers)
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(locales::negotiate)
        })
        .unwrap_or(default_locale)
}

pub async fn locale_prefix(
    State(default_locale): State<&'static str>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if bypasses(path) {
        return next.run(request).await;
    }

    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
    if let Some(locale) = locales::lookup(first_segment) {
        request.extensions_mut().insert(Locale(locale.code));
        return next.run(request).await;
    }

    let locale = negotiate(request.headers(), default_locale);
    let target = match (path, request.uri().query()) {
        ("/", None) => format!("/{locale}"),
        ("/", Some(query)) => format!("/{locale}?{query}"),
        (path, None) => format!("/{locale}{path}"),
        (path, Some(query)) => format!("/{locale}{path}?{query}"),
    };
    tracing::debug!(from = %request.uri(), to = %target, "Redirecting to locale prefix");

    match HeaderValue::from_str(&target) {
        Ok(location) => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Router,
        body::{Body, to_bytes},
        http::Request as HttpRequest,
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/api/health", get(|| async { "api" }))
            .route(
                "/{locale}/dashboard",
                get(|Extension(locale): Extension<Locale>| async move { locale.code() }),
            )
            .layer(from_fn_with_state("en", locale_prefix))
    }

    async fn send(request: HttpRequest<Body>) -> Response {
        app().oneshot(request).await.unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn prefixed_paths_pass_with_locale_extension() {
        let response = send(HttpRequest::get("/ta/dashboard").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ta");
    }

    #[tokio::test]
    async fn api_paths_bypass() {
        let response = send(HttpRequest::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unprefixed_paths_redirect_keeping_the_query() {
        let response = send(
            HttpRequest::get("/dashboard?tab=crops")
                .header(header::ACCEPT_LANGUAGE, "hi-IN,hi;q=0.9,en;q=0.8")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/hi/dashboard?tab=crops");
    }

    #[tokio::test]
    async fn cookie_beats_accept_language_and_default_applies_last() {
        let response = send(
            HttpRequest::get("/")
                .header(header::COOKIE, "theme=dark; NEXT_LOCALE=bn")
                .header(header::ACCEPT_LANGUAGE, "hi")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(location(&response), "/bn");

        let response = send(
            HttpRequest::get("/farms")
                .header(header::COOKIE, "NEXT_LOCALE=zz")
                .header(header::ACCEPT_LANGUAGE, "de-DE")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(location(&response), "/en/farms");
    }

    #[test]
    fn bypass_rules() {
        assert!(bypasses("/api"));
        assert!(bypasses("/api/prices/crops"));
        assert!(bypasses("/favicon.ico"));
        assert!(bypasses("/_next/static/app.js"));
        assert!(!bypasses("/apiary"));
        assert!(!bypasses("/dashboard"));
    }
}
