//! Typed wrappers around single LLM calls.
//!
//! A flow validates its input, renders a prompt, advertises its output schema to
//! the model and parses the JSON answer back into a typed value.

use std::sync::Arc;

use schemars::{JsonSchema, generate::SchemaSettings};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use utils::data_uri::DataUriError;

use super::{
    llm_api::{ContentBlock, LlmApiClient, LlmApiError, Message, ToolHandler},
    validation::{Validate, ValidationError},
};

pub mod chatbot;
pub mod crop_recommendation;
pub mod cultivation_plan;
pub mod disease_detection;
pub mod farming_advice;
pub mod market_prices;
pub mod plan_document;
pub mod weather_tool;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Llm(#[from] LlmApiError),
    #[error("invalid attachment: {0}")]
    Attachment(#[from] DataUriError),
    #[error("{0}")]
    EmptyAnswer(&'static str),
}

impl FlowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Attachment(_))
    }
}

pub trait Flow: Send + Sync {
    /// Used in logs.
    const NAME: &'static str;

    type Input: Validate + Send + Sync;
    type Output: DeserializeOwned + JsonSchema + Send;

    fn system(&self) -> String;

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError>;

    fn tools(&self) -> Vec<Arc<dyn ToolHandler>> {
        Vec::new()
    }

    fn max_tokens(&self) -> u32 {
        2048
    }
}

/// JSON schema for `T` with every subschema inlined and no metadata keys.
pub fn json_schema_for<T: JsonSchema>() -> Value {
    let mut settings = SchemaSettings::draft07();
    settings.inline_subschemas = true;
    let schema = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    value
}

#[derive(Clone)]
pub struct FlowRunner {
    llm: Arc<LlmApiClient>,
}

impl FlowRunner {
    pub fn new(llm: Arc<LlmApiClient>) -> Self {
        Self { llm }
    }

    pub fn llm(&self) -> &LlmApiClient {
        &self.llm
    }

    pub async fn run<F: Flow>(&self, flow: &F, input: &F::Input) -> Result<F::Output, FlowError> {
        input.validate()?;
        let content = flow.prompt(input)?;

        let schema = serde_json::to_string_pretty(&json_schema_for::<F::Output>())
            .unwrap_or_default();
        let system = format!(
            "{}\n\nRespond ONLY with a single JSON object that conforms to this JSON schema:\n{schema}",
            flow.system()
        );

        tracing::debug!(flow = F::NAME, "Running flow");
        let output = self
            .llm
            .ask_json(
                vec![Message::user_blocks(content)],
                Some(&system),
                &flow.tools(),
                flow.max_tokens(),
            )
            .await
            .inspect_err(|e| tracing::error!(flow = F::NAME, error = %e, "Flow failed"))?;
        Ok(output)
    }
}


#[cfg(test)]
mod tests {
    use schemars::JsonSchema;
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Outer {
        /// Inner items.
        items: Vec<Inner>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Inner {
        name: String,
    }

    #[test]
    fn schema_is_inlined_and_untitled() {
        let schema = json_schema_for::<Outer>();
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["properties"]["items"]["description"], "Inner items.");
        assert_eq!(
            schema["properties"]["items"]["items"]["properties"]["name"]["type"],
            "string"
        );
    }
}
