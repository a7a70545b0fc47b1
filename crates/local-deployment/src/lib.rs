use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    config::Config, flows::FlowRunner, llm_api::LlmApiClient, market_data::MarketDataService,
    storage::StorageService, weather::WeatherService,
};

/// Single-process deployment: local SQLite plus direct HTTP clients.
#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    flows: FlowRunner,
    weather: WeatherService,
    market_data: MarketDataService,
    storage: StorageService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        let llm = Arc::new(LlmApiClient::new(&config.llm)?);
        let weather = WeatherService::new(&config.weather)?;
        let market_data = MarketDataService::new(&config.market)?;
        let storage = StorageService::new(&config.storage);

        if !llm.is_configured() {
            tracing::warn!("ANTHROPIC_API_KEY is not set; AI flows will fail until it is");
        }
        if config.weather.api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY is not set; weather lookups will fail");
        }
        if config.market.api_key.is_none() {
            tracing::warn!("DATA_GOV_IN_API_KEY is not set; live market prices will fail");
        }

        Ok(Self {
            config: Arc::new(config),
            db,
            flows: FlowRunner::new(llm),
            weather,
            market_data,
            storage,
        })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn flows(&self) -> &FlowRunner {
        &self.flows
    }

    fn weather(&self) -> &WeatherService {
        &self.weather
    }

    fn market_data(&self) -> &MarketDataService {
        &self.market_data
    }

    fn storage(&self) -> &StorageService {
        &self.storage
    }
}
