//! Mandi prices and crop production statistics from the data.gov.in resource API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use thiserror::Error;
use ts_rs::TS;

use super::config::MarketDataConfig;

/// Records requested per call.
pub const RECORD_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("API key for data.gov.in is not configured.")]
    MissingApiKey,
    #[error("Network error: Could not connect to the market data service.")]
    Network(#[source] reqwest::Error),
    #[error("Failed to fetch market data. Status: {status}")]
    Http { status: u16, body: String },
    #[error("unexpected market data payload: {0}")]
    Serde(String),
}

/// One day's prices for a commodity at one market, INR per quintal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct MandiRecord {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub market: String,
    pub commodity: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub arrival_date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub modal_price: f64,
}

impl MandiRecord {
    pub fn is_seed(&self) -> bool {
        self.commodity.to_lowercase().contains("seed")
    }
}

/// Seed price row served by `/api/prices/seeds`.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct SeedMarketPrice {
    pub commodity: String,
    pub variety: String,
    pub modal_price: f64,
    pub market: String,
}

impl From<MandiRecord> for SeedMarketPrice {
    fn from(r: MandiRecord) -> Self {
        Self {
            commodity: r.commodity,
            variety: r.variety,
            modal_price: r.modal_price,
            market: r.market,
        }
    }
}

/// District production figures as published; area and production stay textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProductionRecord {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub crop_year: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub crop: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub production: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
    Null,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s.trim().parse().unwrap_or(0.0),
        NumberOrText::Null => 0.0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s,
        NumberOrText::Null => String::new(),
    })
}

#[derive(Deserialize)]
struct ResourcePage<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct MarketDataService {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    price_resource: String,
    production_resource: String,
}

impl MarketDataService {
    pub fn new(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(MarketDataError::Network)?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            price_resource: config.price_resource.clone(),
            production_resource: config.production_resource.clone(),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, MarketDataError> {
        let api_key = self.api_key.as_deref().ok_or(MarketDataError::MissingApiKey)?;
        let limit = RECORD_LIMIT.to_string();
        let mut params: Vec<(String, &str)> = vec![
            ("api-key".to_string(), api_key),
            ("format".to_string(), "json"),
            ("limit".to_string(), &limit),
        ];
        params.extend(
            filters
                .iter()
                .map(|(field, value)| (format!("filters[{field}]"), *value)),
        );

        let res = self
            .http
            .get(format!("{}/{}", self.base_url, resource))
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, resource, "Error fetching from data.gov.in API");
                MarketDataError::Network(e)
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "data.gov.in API error response");
            return Err(MarketDataError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = res.text().await.map_err(MarketDataError::Network)?;
        let page: ResourcePage<T> =
            serde_json::from_str(&body).map_err(|e| MarketDataError::Serde(e.to_string()))?;
        if page.records.is_empty() {
            tracing::warn!(resource, ?filters, "No records found for the given query");
        }
        Ok(page.records)
    }

    /// Latest mandi prices, excluding seed commodities.
    pub async fn latest_crop_prices(&self) -> Result<Vec<MandiRecord>, MarketDataError> {
        let records: Vec<MandiRecord> = self.fetch(&self.price_resource, &[]).await?;
        Ok(records.into_iter().filter(|r| !r.is_seed()).collect())
    }

    /// Latest mandi prices for seed commodities only.
    pub async fn seed_prices(&self) -> Result<Vec<SeedMarketPrice>, MarketDataError> {
        let records: Vec<MandiRecord> = self.fetch(&self.price_resource, &[]).await?;
        Ok(records
            .into_iter()
            .filter(MandiRecord::is_seed)
            .map(SeedMarketPrice::from)
            .collect())
    }

    pub async fn production_data(
        &self,
        district: &str,
        season: &str,
    ) -> Result<Vec<ProductionRecord>, MarketDataError> {
        self.fetch(
            &self.production_resource,
            &[("district", district), ("season", season)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;

    async fn fake_resource(
        Path(resource): Path<String>,
        Query(q): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if q.get("api-key").map(String::as_str) != Some("k") || q.get("format").is_none() {
            return (StatusCode::FORBIDDEN, Json(json!({"error": "key"})));
        }
        match resource.as_str() {
            "prices" => (
                StatusCode::OK,
                Json(json!({"records": [
                    {"state": "Maharashtra", "district": "Pune", "market": "Pune", "commodity": "Onion",
                     "variety": "Red", "arrival_date": "01/07/2025", "min_price": "1200", "max_price": "1800", "modal_price": "1500"},
                    {"state": "Punjab", "district": "Ludhiana", "market": "Khanna", "commodity": "Wheat Seed",
                     "variety": "HD-2967", "arrival_date": "01/07/2025", "min_price": 3000, "max_price": 3400, "modal_price": 3200}
                ]})),
            ),
            "production" => {
                let district = q.get("filters[district]").cloned().unwrap_or_default();
                let season = q.get("filters[season]").cloned().unwrap_or_default();
                if district == "Nashik" && season == "Kharif" {
                    (
                        StatusCode::OK,
                        Json(json!({"records": [
                            {"state": "Maharashtra", "district": "Nashik", "crop_year": 2019, "season": "Kharif",
                             "crop": "Bajra", "area": "1200", "production": null}
                        ]})),
                    )
                } else {
                    (StatusCode::OK, Json(json!({"records": []})))
                }
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        }
    }

    async fn service(api_key: Option<&str>) -> MarketDataService {
        let app = Router::new().route("/{resource}", get(fake_resource));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        MarketDataService::new(&MarketDataConfig {
            api_key: api_key.map(str::to_string),
            base_url: format!("http://{addr}"),
            price_resource: "prices".to_string(),
            production_resource: "production".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn splits_crop_and_seed_records() {
        let service = service(Some("k")).await;

        let crops = service.latest_crop_prices().await.unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].commodity, "Onion");
        assert_eq!(crops[0].modal_price, 1500.0);

        let seeds = service.seed_prices().await.unwrap();
        assert_eq!(
            seeds,
            vec![SeedMarketPrice {
                commodity: "Wheat Seed".to_string(),
                variety: "HD-2967".to_string(),
                modal_price: 3200.0,
                market: "Khanna".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn production_filters_and_empty_results() {
        let service = service(Some("k")).await;
        let rows = service.production_data("Nashik", "Kharif").await.unwrap();
        assert_eq!(rows[0].crop_year, "2019");
        assert_eq!(rows[0].production, "");
        assert!(service.production_data("Pune", "Rabi").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_errors_surface() {
        let rejected = service(Some("wrong")).await;
        assert!(matches!(
            rejected.latest_crop_prices().await,
            Err(MarketDataError::Http { status: 403, .. })
        ));

        let unconfigured = service(None).await;
        let err = unconfigured.seed_prices().await.unwrap_err();
        assert_eq!(err.to_string(), "API key for data.gov.in is not configured.");
    }
}
