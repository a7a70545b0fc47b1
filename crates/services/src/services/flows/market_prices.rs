//! Model-driven refresh of the stored crop and seed price tables.
//!
//! The model looks prices up and writes them through two tools; each tool call
//! replaces the whole table it owns.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use db::models::market_price::{CropPrice, SeedPrice};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use ts_rs::TS;

use super::{Flow, FlowError, FlowRunner, json_schema_for};
use crate::services::{
    llm_api::{ContentBlock, ToolDefinition, ToolHandler},
    validation::{Validate, ValidationError, min_chars},
};

pub const UPDATE_CROP_PRICES: &str = "update_crop_prices";
pub const UPDATE_SEED_PRICES: &str = "update_seed_prices";

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct MarketSyncInput {
    /// State or region the prices should reflect.
    pub location: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub seeds: Vec<String>,
}

impl Validate for MarketSyncInput {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("location", &self.location, 2)?;
        if self.crops.is_empty() && self.seeds.is_empty() {
            return Err(ValidationError::new(
                "crops",
                "name at least one crop or seed",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MarketSyncAnswer {
    /// A status message indicating the result of the operation.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct MarketSyncReport {
    pub status: String,
    pub crop_prices_updated: u64,
    pub seed_prices_updated: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CropPriceBatch {
    /// Current price for every requested crop.
    prices: Vec<CropPrice>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SeedPriceBatch {
    /// A common variety and its price for every requested seed.
    prices: Vec<SeedPrice>,
}

struct UpdateCropPrices {
    pool: SqlitePool,
    written: Arc<AtomicU64>,
}

#[async_trait]
impl ToolHandler for UpdateCropPrices {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: UPDATE_CROP_PRICES.to_string(),
            description: "Replaces the stored crop prices with the given list.".to_string(),
            input_schema: json_schema_for::<CropPriceBatch>(),
        }
    }

    async fn call(&self, input: Value) -> Result<Value, String> {
        let batch: CropPriceBatch =
            serde_json::from_value(input).map_err(|e| format!("invalid input: {e}"))?;
        let written = CropPrice::replace_all(&self.pool, &batch.prices)
            .await
            .map_err(|e| format!("database error: {e}"))?;
        self.written.store(written, Ordering::Relaxed);
        tracing::info!(written, "Crop prices replaced");
        Ok(json!("Crop prices updated successfully in the database."))
    }
}

struct UpdateSeedPrices {
    pool: SqlitePool,
    written: Arc<AtomicU64>,
}

#[async_trait]
impl ToolHandler for UpdateSeedPrices {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: UPDATE_SEED_PRICES.to_string(),
            description: "Replaces the stored seed variety prices with the given list."
                .to_string(),
            input_schema: json_schema_for::<SeedPriceBatch>(),
        }
    }

    async fn call(&self, input: Value) -> Result<Value, String> {
        let batch: SeedPriceBatch =
            serde_json::from_value(input).map_err(|e| format!("invalid input: {e}"))?;
        let written = SeedPrice::replace_all(&self.pool, &batch.prices)
            .await
            .map_err(|e| format!("database error: {e}"))?;
        self.written.store(written, Ordering::Relaxed);
        tracing::info!(written, "Seed prices replaced");
        Ok(json!("Seed prices updated successfully in the database."))
    }
}

pub struct MarketPriceSyncFlow {
    pool: SqlitePool,
    crops_written: Arc<AtomicU64>,
    seeds_written: Arc<AtomicU64>,
}

impl MarketPriceSyncFlow {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            crops_written: Arc::default(),
            seeds_written: Arc::default(),
        }
    }

    pub async fn sync(
        &self,
        runner: &FlowRunner,
        input: &MarketSyncInput,
    ) -> Result<MarketSyncReport, FlowError> {
        let answer = runner.run(self, input).await?;
        Ok(MarketSyncReport {
            status: answer.status,
            crop_prices_updated: self.crops_written.load(Ordering::Relaxed),
            seed_prices_updated: self.seeds_written.load(Ordering::Relaxed),
        })
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Flow for MarketPriceSyncFlow {
    const NAME: &'static str = "market_price_sync";
    type Input = MarketSyncInput;
    type Output = MarketSyncAnswer;

    fn system(&self) -> String {
        format!(
            "You are an expert agricultural market analyst. Find the current market prices for \
             the crops and seeds the user lists, then store them with the tools.\n\
             1. For each crop find its price per quintal in Indian Rupees and the percentage change \
             over the last 24 hours, then call {UPDATE_CROP_PRICES} once with all of them.\n\
             2. For each seed pick a popular variety and find its price per quintal in Indian \
             Rupees, then call {UPDATE_SEED_PRICES} once with all of them.\n\
             3. After the tools have run, reply with a final status message."
        )
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        Ok(vec![ContentBlock::text(format!(
            "Location: {}\nCrops:\n{}\nSeeds:\n{}",
            input.location.trim(),
            bullet_list(&input.crops),
            bullet_list(&input.seeds)
        ))])
    }

    fn tools(&self) -> Vec<Arc<dyn ToolHandler>> {
        vec![
            Arc::new(UpdateCropPrices {
                pool: self.pool.clone(),
                written: self.crops_written.clone(),
            }),
            Arc::new(UpdateSeedPrices {
                pool: self.pool.clone(),
                written: self.seeds_written.clone(),
            }),
        ]
    }

    fn max_tokens(&self) -> u32 {
        4096
    }
}
