use async_trait::async_trait;
use db::DBService;
use services::services::{
    config::Config,
    flows::FlowRunner,
    llm_api::LlmApiError,
    market_data::{MarketDataError, MarketDataService},
    storage::StorageService,
    weather::{WeatherError, WeatherService},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Llm(#[from] LlmApiError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}

/// Everything a request handler needs. Implementations are cheap to clone.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: Config) -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn flows(&self) -> &FlowRunner;

    fn weather(&self) -> &WeatherService;

    fn market_data(&self) -> &MarketDataService;

    fn storage(&self) -> &StorageService;
}
