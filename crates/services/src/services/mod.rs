pub mod config;
pub mod database_validator;
pub mod flows;
pub mod knowledge;
pub mod llm_api;
pub mod locales;
pub mod market_data;
pub mod plan_progress;
pub mod storage;
pub mod validation;
pub mod weather;
