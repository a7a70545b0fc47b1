use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::json_schema_for;
use crate::services::{
    llm_api::{ToolDefinition, ToolHandler},
    weather::WeatherService,
};

pub const TOOL_NAME: &str = "get_weather";

#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherQuery {
    /// The city or district to get the weather for.
    location: String,
}

/// Lets the model look up current weather.
///
/// Lookup failures are returned to the model as `{"error": ...}` so the flow can still answer.
pub struct WeatherTool {
    weather: WeatherService,
}

impl WeatherTool {
    pub fn new(weather: WeatherService) -> Self {
        Self { weather }
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: "Get the current weather and a brief forecast for a specific location."
                .to_string(),
            input_schema: json_schema_for::<WeatherQuery>(),
        }
    }

    async fn call(&self, input: Value) -> Result<Value, String> {
        let query: WeatherQuery =
            serde_json::from_value(input).map_err(|e| format!("invalid input: {e}"))?;
        match self.weather.current(&query.location).await {
            Ok(data) => serde_json::to_value(data).map_err(|e| e.to_string()),
            Err(e) => {
                tracing::error!(location = %query.location, error = %e, "Weather tool failed");
                Ok(json!({ "error": "Could not retrieve weather data." }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::WeatherConfig;

    #[tokio::test]
    async fn failures_become_error_payloads() {
        let tool = WeatherTool::new(
            WeatherService::new(&WeatherConfig {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
            })
            .unwrap(),
        );
        assert_eq!(tool.definition().input_schema["required"][0], "location");

        let result = tool.call(json!({"location": "Ludhiana"})).await.unwrap();
        assert_eq!(result, json!({"error": "Could not retrieve weather data."}));
        assert!(tool.call(json!({"city": "Ludhiana"})).await.is_err());
    }
}
