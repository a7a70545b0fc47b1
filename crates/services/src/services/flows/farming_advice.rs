use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Flow, FlowError, weather_tool::WeatherTool};
use crate::services::{
    llm_api::{ContentBlock, ToolHandler},
    validation::{Validate, ValidationError, min_chars},
    weather::WeatherService,
};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct FarmingAdviceInput {
    pub location: String,
    pub soil_analysis: String,
    pub crop: String,
}

impl Validate for FarmingAdviceInput {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("location", &self.location, 2)?;
        min_chars("soil_analysis", &self.soil_analysis, 10)?;
        min_chars("crop", &self.crop, 2)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, TS)]
pub struct FarmingAdviceOutput {
    /// Personalized farming advice based on the weather forecast.
    pub advice: String,
}

pub struct FarmingAdviceFlow {
    weather: WeatherService,
}

impl FarmingAdviceFlow {
    pub fn new(weather: WeatherService) -> Self {
        Self { weather }
    }
}

impl Flow for FarmingAdviceFlow {
    const NAME: &'static str = "farming_advice";
    type Input = FarmingAdviceInput;
    type Output = FarmingAdviceOutput;

    fn system(&self) -> String {
        format!(
            "You are an expert agricultural advisor. Give a farmer personalized advice for their \
             crop. Use the {} tool to get the current weather for their location and tailor the \
             advice to it, focusing on practices that improve yields.",
            super::weather_tool::TOOL_NAME
        )
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        Ok(vec![ContentBlock::text(format!(
            "Location: {}\nSoil Analysis: {}\nCrop: {}",
            input.location.trim(),
            input.soil_analysis.trim(),
            input.crop.trim()
        ))])
    }

    fn tools(&self) -> Vec<Arc<dyn ToolHandler>> {
        vec![Arc::new(WeatherTool::new(self.weather.clone()))]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::{
        config::WeatherConfig,
        flows::{
            FlowRunner,
            test_support::{scripted_llm, text},
        },
    };

    fn flow() -> FarmingAdviceFlow {
        FarmingAdviceFlow::new(
            WeatherService::new(&WeatherConfig {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn crop_needs_two_characters() {
        let input = FarmingAdviceInput {
            location: "Indore".to_string(),
            soil_analysis: "Black cotton soil, pH 7.8".to_string(),
            crop: "S".to_string(),
        };
        assert_eq!(input.validate().unwrap_err().field, "crop");
    }

    #[tokio::test]
    async fn weather_failure_does_not_fail_the_flow() {
        let (llm, seen) = scripted_llm(vec![
            json!([{"type": "tool_use", "id": "w1", "name": "get_weather", "input": {"location": "Indore"}}]),
            text(json!({"advice": "Delay irrigation until the soil dries."})),
        ])
        .await;

        let output = FlowRunner::new(llm)
            .run(
                &flow(),
                &FarmingAdviceInput {
                    location: "Indore".to_string(),
                    soil_analysis: "Black cotton soil, pH 7.8".to_string(),
                    crop: "Soybean".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(output.advice, "Delay irrigation until the soil dries.");

        let seen = seen.lock().unwrap();
        let tool_result = &seen[1]["messages"][2]["content"][0];
        assert_eq!(tool_result["tool_use_id"], "w1");
        assert!(tool_result["content"].as_str().unwrap().contains("error"));
    }
}
