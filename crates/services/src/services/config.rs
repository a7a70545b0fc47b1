//! Runtime configuration read from the process environment.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use super::locales::{self, DEFAULT_LOCALE};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://krishi.db?mode=rwc";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_MARKET_BASE_URL: &str = "https://api.data.gov.in/resource";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// Daily mandi prices for all commodities.
pub const MANDI_PRICE_RESOURCE: &str = "9ef84268-d588-465a-a308-a864a43d0070";
/// District-wise crop production statistics.
pub const PRODUCTION_RESOURCE: &str = "579b464db66ec23bdd00000192d56af9a91644c2797b0ee5719aa1a3";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub price_resource: String,
    pub production_resource: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for user uploads, served under `/uploads`.
    pub upload_dir: PathBuf,
}

/// Public web client configuration for the identity/storage provider. Safe to hand to browsers.
#[derive(Debug, Clone, Serialize, TS)]
pub struct FirebaseClientConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub default_locale: &'static str,
    pub llm: LlmConfig,
    pub weather: WeatherConfig,
    pub market: MarketDataConfig,
    pub storage: StorageConfig,
    /// `None` unless every client field is set.
    pub firebase: Option<FirebaseClientConfig>,
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv_if_present();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let default_locale = match var("DEFAULT_LOCALE") {
            Some(code) => locales::find(&code).ok_or(ConfigError::Invalid {
                name: "DEFAULT_LOCALE",
                value: code,
            })?,
            None => DEFAULT_LOCALE,
        };

        let firebase = match (
            var("FIREBASE_API_KEY"),
            var("FIREBASE_AUTH_DOMAIN"),
            var("FIREBASE_PROJECT_ID"),
            var("FIREBASE_STORAGE_BUCKET"),
            var("FIREBASE_MESSAGING_SENDER_ID"),
            var("FIREBASE_APP_ID"),
        ) {
            (
                Some(api_key),
                Some(auth_domain),
                Some(project_id),
                Some(storage_bucket),
                Some(messaging_sender_id),
                Some(app_id),
            ) => Some(FirebaseClientConfig {
                api_key,
                auth_domain,
                project_id,
                storage_bucket,
                messaging_sender_id,
                app_id,
            }),
            _ => None,
        };

        Ok(Self {
            host: or("HOST", "127.0.0.1"),
            port,
            database_url: or("DATABASE_URL", DEFAULT_DATABASE_URL),
            default_locale,
            llm: LlmConfig {
                api_key: var("ANTHROPIC_API_KEY"),
                model: or("LLM_MODEL", DEFAULT_LLM_MODEL),
                base_url: or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            },
            weather: WeatherConfig {
                api_key: var("WEATHER_API_KEY"),
                base_url: or("WEATHER_BASE_URL", DEFAULT_WEATHER_BASE_URL),
            },
            market: MarketDataConfig {
                api_key: var("DATA_GOV_IN_API_KEY"),
                base_url: or("MARKET_DATA_BASE_URL", DEFAULT_MARKET_BASE_URL),
                price_resource: or("MANDI_PRICE_RESOURCE", MANDI_PRICE_RESOURCE),
                production_resource: or("PRODUCTION_RESOURCE", PRODUCTION_RESOURCE),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from(or("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
            },
            firebase,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn dotenv_if_present() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env"),
    }
}
