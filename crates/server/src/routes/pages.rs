//! Locale-aware HTML shells for the web client's pages.

use axum::{
    Router,
    extract::Path,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use services::services::locales;

use crate::{DeploymentImpl, middleware::locale::Locale};

pub const KNOWN_PAGES: &[&str] = &[
    "crop-recommendation",
    "disease-detection",
    "personalized-advice",
    "personalized-space",
    "dashboard",
    "farms",
    "login",
    "register",
    "profile",
];

const APP_NAME: &str = "Krishi Mitra";

fn render(locale: Locale, page: &str) -> Html<String> {
    let dir = if locale.is_rtl() { "rtl" } else { "ltr" };
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="{code}" dir="{dir}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{APP_NAME}</title>
</head>
<body>
<div id="root" data-locale="{code}" data-page="{page}"></div>
<script type="module" src="/assets/app.js"></script>
</body>
</html>
"#,
        code = locale.code(),
    ))
}

fn page_response(locale: &str, page: &str) -> Response {
    match locales::find(locale) {
        Some(code) => render(Locale(code), page).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn home(Path(locale): Path<String>) -> Response {
    page_response(&locale, "home")
}

pub async fn page(Path((locale, page)): Path<(String, String)>) -> Response {
    if !KNOWN_PAGES.contains(&page.as_str()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    page_response(&locale, &page)
}

pub async fn add_farm(Path(locale): Path<String>) -> Response {
    page_response(&locale, "farms/add")
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/{locale}", get(home))
        .route("/{locale}/", get(home))
        .route("/{locale}/{page}", get(page))
        .route("/{locale}/farms/add", get(add_farm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_carries_language_and_direction() {
        let html = render(Locale("ur"), "dashboard").0;
        assert!(html.contains(r#"<html lang="ur" dir="rtl">"#));
        assert!(html.contains(r#"data-page="dashboard""#));

        let html = render(Locale("hi"), "home").0;
        assert!(html.contains(r#"dir="ltr""#));
    }

    #[test]
    fn unknown_locale_is_not_found() {
        assert_eq!(page_response("xx", "home").status(), StatusCode::NOT_FOUND);
    }
}
