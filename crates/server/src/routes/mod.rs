use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn_with_state};
use deployment::Deployment;
use services::services::storage::PUBLIC_PREFIX;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{DeploymentImpl, error::ApiError, middleware::locale::locale_prefix};

pub mod crops;
pub mod farms;
pub mod flows;
pub mod health;
pub mod locales;
pub mod pages;
pub mod plans;
pub mod prices;
pub mod sensor_readings;
pub mod soil_reports;
pub mod uploads;
pub mod users;
pub mod weather;

/// Room for a base64 upload of the largest accepted file plus the JSON wrapper.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

async fn not_found() -> ApiError {
    ApiError::NotFound("Route")
}

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(health::router(&deployment))
        .merge(locales::router(&deployment))
        .merge(prices::router(&deployment))
        .merge(weather::router(&deployment))
        .merge(flows::router(&deployment))
        .merge(users::router(&deployment))
        .merge(farms::router(&deployment))
        .merge(crops::router(&deployment))
        .merge(sensor_readings::router(&deployment))
        .merge(plans::router(&deployment))
        .merge(soil_reports::router(&deployment))
        .merge(uploads::router(&deployment));

    Router::new()
        .nest("/api", api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(deployment.storage().root()))
        .merge(pages::router(&deployment))
        .fallback(not_found)
        .layer(from_fn_with_state(
            deployment.config().default_locale,
            locale_prefix,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, Response, StatusCode, header},
    };
    use serde_json::{Value, json};
    use services::services::config::Config;
    use tower::ServiceExt;

    use super::*;

    async fn deployment(vars: &[(&str, &str)]) -> DeploymentImpl {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|name| {
            if name == "DATABASE_URL" {
                return Some("sqlite::memory:".to_string());
            }
            vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        })
        .unwrap();
        DeploymentImpl::new(config).await.unwrap()
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        };
        app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn farm_body() -> Value {
        json!({
            "farm_name": "North Field",
            "location": "Nashik",
            "district": "Nashik",
            "size_acres": 2.5,
            "soil_type": "Black",
            "topography": "Flat",
            "water_source": "Canal"
        })
    }

    #[tokio::test]
    async fn seed_prices_answer_500_with_message_when_upstream_fails() {
        let app = router(deployment(&[]).await);
        let response = send(&app, Method::GET, "/api/prices/seeds", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Failed to fetch seed prices" })
        );
    }

    #[tokio::test]
    async fn crop_prices_answer_500_with_message_when_database_fails() {
        let deployment = deployment(&[]).await;
        deployment.db().pool.close().await;
        let app = router(deployment);
        let response = send(&app, Method::GET, "/api/prices/crops", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Failed to fetch crop prices" })
        );
    }

    #[tokio::test]
    async fn crop_prices_start_empty() {
        let app = router(deployment(&[]).await);
        let response = send(&app, Method::GET, "/api/prices/crops", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn farm_lifecycle() {
        let app = router(deployment(&[]).await);

        let response = send(&app, Method::POST, "/api/users/u1/farms", Some(farm_body())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        assert_eq!(created["success"], json!(true));
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let response = send(
            &app,
            Method::PATCH,
            &format!("/api/farms/{id}"),
            Some(json!({ "size_acres": 4.0 })),
        )
        .await;
        assert_eq!(json_body(response).await["data"]["size_acres"], json!(4.0));

        let response = send(&app, Method::GET, "/api/users/u1/farms", None).await;
        assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 1);

        let response = send(&app, Method::DELETE, &format!("/api/farms/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, Method::DELETE, &format!("/api/farms/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_farm_is_rejected_with_field_message() {
        let app = router(deployment(&[]).await);
        let mut body = farm_body();
        body["size_acres"] = json!(0.0);
        let response = send(&app, Method::POST, "/api/users/u1/farms", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("size_acres"));
    }

    #[tokio::test]
    async fn malformed_requests_answer_400_in_the_envelope() {
        let app = router(deployment(&[]).await);

        let response = send(
            &app,
            Method::POST,
            "/api/users/u1/farms",
            Some(json!({ "location": "Nashik" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("farm_name"));

        let response = send(&app, Method::GET, "/api/farms/not-a-uuid", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], json!(false));

        let response = send(
            &app,
            Method::GET,
            "/api/farms/7f1c3f5e-2f0a-4a57-9f0e-5d1f3c0b6e21/sensor-readings?limit=many",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], json!(false));
    }

    #[tokio::test]
    async fn uploaded_soil_report_is_served_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let upload_dir = dir.path().to_string_lossy().to_string();
        let app = router(deployment(&[("UPLOAD_DIR", upload_dir.as_str())]).await);

        let response = send(
            &app,
            Method::POST,
            "/api/users/u1/uploads",
            Some(json!({
                "folder": "soil-reports",
                "data_uri": "data:application/pdf;base64,JVBERi0="
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let stored = json_body(response).await["data"].clone();
        let url = stored["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/users/u1/soil-reports/"));
        assert_eq!(stored["mime_type"], json!("application/pdf"));

        let response = send(&app, Method::GET, &url, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-");

        let response = send(
            &app,
            Method::POST,
            "/api/users/u1/soil-reports",
            Some(json!({ "year": 2024, "report_type": "pdf", "file_url": url })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["file_url"], json!(url));
    }

    #[tokio::test]
    async fn uploads_reject_unsupported_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let upload_dir = dir.path().to_string_lossy().to_string();
        let app = router(deployment(&[("UPLOAD_DIR", upload_dir.as_str())]).await);

        let response = send(
            &app,
            Method::POST,
            "/api/users/u1/uploads",
            Some(json!({
                "folder": "plant-images",
                "data_uri": "data:application/pdf;base64,JVBERi0="
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("application/pdf"));
    }

    #[tokio::test]
    async fn missing_records_answer_404() {
        let app = router(deployment(&[]).await);
        let response = send(&app, Method::GET, "/api/users/nobody", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(
            &app,
            Method::GET,
            "/api/plans/7f1c3f5e-2f0a-4a57-9f0e-5d1f3c0b6e21/progress",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, Method::GET, "/api/does-not-exist", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plan_progress_is_computed_for_a_given_day() {
        let app = router(deployment(&[]).await);
        let week = json!({
            "stage": "Growth",
            "tasks": "Irrigate every third day.",
            "icon_name": "Droplets",
            "daily_tasks": []
        });
        let response = send(
            &app,
            Method::POST,
            "/api/users/u1/plans",
            Some(json!({
                "farm_id": null,
                "crop_type": "Wheat",
                "district": "Ludhiana",
                "sowing_date": "2024-11-01",
                "plan": [week.clone(), week.clone(), week]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = json_body(response).await["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::GET,
            &format!("/api/plans/{id}/progress?today=2024-11-09"),
            None,
        )
        .await;
        let progress = json_body(response).await["data"].clone();
        assert_eq!(progress["current_week"], json!(2));
        assert_eq!(progress["total_weeks"], json!(3));

        let response = send(
            &app,
            Method::GET,
            &format!("/api/plans/{id}/progress?today=yesterday"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn client_config_requires_every_firebase_value() {
        let app = router(deployment(&[("FIREBASE_API_KEY", "k")]).await);
        let response = send(&app, Method::GET, "/api/client-config", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_migrated_database() {
        let app = router(deployment(&[]).await);
        let response = send(&app, Method::GET, "/api/health", None).await;
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], json!("ok"));
        assert_eq!(body["data"]["llm_configured"], json!(false));
    }

    #[tokio::test]
    async fn pages_are_locale_prefixed() {
        let app = router(deployment(&[("DEFAULT_LOCALE", "hi")]).await);

        let response = send(&app, Method::GET, "/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/hi/dashboard");

        let response = send(&app, Method::GET, "/", None).await;
        assert_eq!(response.headers()[header::LOCATION], "/hi");

        let response = send(&app, Method::GET, "/ur/farms/add", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains(r#"dir="rtl""#));

        let response = send(&app, Method::GET, "/en/unknown-page", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn flows_without_api_key_fail_after_validation() {
        let app = router(deployment(&[]).await);
        let response = send(
            &app,
            Method::POST,
            "/api/flows/chat",
            Some(json!({ "query": "", "language": "en" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::POST,
            "/api/flows/chat",
            Some(json!({ "query": "When should I sow wheat?", "language": "en" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
