use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Flow, FlowError};
use crate::services::{
    knowledge::FARMING_KNOWLEDGE,
    llm_api::ContentBlock,
    locales,
    validation::{Validate, ValidationError, locale, required},
};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct ChatInput {
    /// The farmer's question, in their own language.
    pub query: String,
    /// Locale code of the query, e.g. "hi".
    pub language: String,
}

impl Validate for ChatInput {
    fn validate(&self) -> Result<(), ValidationError> {
        required("query", &self.query)?;
        locale("language", &self.language)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, TS)]
pub struct ChatOutput {
    /// The answer to the question in the same language as the query.
    pub answer: String,
}

pub struct ChatbotFlow;

impl Flow for ChatbotFlow {
    const NAME: &'static str = "chatbot";
    type Input = ChatInput;
    type Output = ChatOutput;

    fn system(&self) -> String {
        format!(
            "You are a helpful assistant for Indian farmers. The farmer asks a question in their \
             local language and you answer in that same language, in simple words. Ground your \
             answer in the reference data below when it is relevant; otherwise rely on general \
             agronomy knowledge.\n\nReference data:\n{}",
            FARMING_KNOWLEDGE.to_prompt_json()
        )
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        let code = locales::find(&input.language).unwrap_or(locales::DEFAULT_LOCALE);
        let mut prompt = format!(
            "Language: {} ({code})\nQuestion: {}",
            locales::display_name(code),
            input.query.trim()
        );
        let highlights = FARMING_KNOWLEDGE.highlights(&input.query);
        if !highlights.is_empty() {
            prompt.push_str(&format!(
                "\nRelevant reference entries: {}",
                highlights.join(", ")
            ));
        }
        Ok(vec![ContentBlock::text(prompt)])
    }

    fn max_tokens(&self) -> u32 {
        1024
    }
}
