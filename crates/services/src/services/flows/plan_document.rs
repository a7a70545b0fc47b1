//! Translated, downloadable version of a cultivation plan.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use db::models::cultivation_plan::WeeklyTask;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Flow, FlowError, FlowRunner};
use crate::services::{
    llm_api::ContentBlock,
    locales,
    validation::{Validate, ValidationError, locale},
};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct PlanDocumentInput {
    /// Target locale code, e.g. "hi".
    pub language: String,
    pub cultivation_plan: Vec<WeeklyTask>,
}

impl Validate for PlanDocumentInput {
    fn validate(&self) -> Result<(), ValidationError> {
        locale("language", &self.language)?;
        if self.cultivation_plan.is_empty() {
            return Err(ValidationError::new(
                "cultivation_plan",
                "must contain at least one week",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MarkdownDocument {
    /// The complete translated plan as a single Markdown string.
    pub markdown_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct PlanDocument {
    pub language: String,
    pub markdown: String,
    /// Base64 of the UTF-8 Markdown document.
    pub document_base64: String,
}

pub struct PlanDocumentFlow;

impl Flow for PlanDocumentFlow {
    const NAME: &'static str = "plan_document";
    type Input = PlanDocumentInput;
    type Output = MarkdownDocument;

    fn system(&self) -> String {
        "You are a document generation expert. Convert the cultivation plan data into a clean, \
         well-structured Markdown document with clear headings and lists. Translate all of the \
         content into the target language. Start with the title \"Cultivation Plan\", then one \
         section per week headed like \"Week 1: Land Preparation\" with the tasks as a bulleted \
         list."
            .to_string()
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        let code = locales::find(&input.language).unwrap_or(locales::DEFAULT_LOCALE);
        let plan = serde_json::to_string(&input.cultivation_plan).unwrap_or_default();
        Ok(vec![ContentBlock::text(format!(
            "Target language: {} ({code})\n\nCultivation plan data:\n```json\n{plan}\n```",
            locales::display_name(code)
        ))])
    }

    fn max_tokens(&self) -> u32 {
        16_000
    }
}

impl PlanDocumentFlow {
    pub async fn generate(
        &self,
        runner: &FlowRunner,
        input: &PlanDocumentInput,
    ) -> Result<PlanDocument, FlowError> {
        let answer = runner.run(self, input).await?;
        let markdown = answer.markdown_content.trim();
        if markdown.is_empty() {
            return Err(FlowError::EmptyAnswer(
                "Failed to generate Markdown content for the document.",
            ));
        }
        Ok(PlanDocument {
            language: input.language.trim().to_ascii_lowercase(),
            markdown: markdown.to_string(),
            document_base64: STANDARD.encode(markdown.as_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::flows::test_support::{scripted_llm, text};

    fn week() -> WeeklyTask {
        WeeklyTask {
            stage: "Land Prep".to_string(),
            tasks: "Plough the field.".to_string(),
            icon_name: "Tractor".to_string(),
            daily_tasks: Vec::new(),
        }
    }

    #[test]
    fn rejects_empty_plans_and_unknown_languages() {
        let empty = PlanDocumentInput {
            language: "hi".to_string(),
            cultivation_plan: Vec::new(),
        };
        assert_eq!(empty.validate().unwrap_err().field, "cultivation_plan");

        let unknown = PlanDocumentInput {
            language: "xx".to_string(),
            cultivation_plan: vec![week()],
        };
        assert_eq!(unknown.validate().unwrap_err().field, "language");
    }

    #[tokio::test]
    async fn encodes_markdown_as_base64() {
        let (llm, seen) = scripted_llm(vec![text(json!({
            "markdown_content": "# Cultivation Plan\n\n## Week 1: Land Prep\n- Plough"
        }))])
        .await;

        let doc = PlanDocumentFlow
            .generate(
                &FlowRunner::new(llm),
                &PlanDocumentInput {
                    language: "HI".to_string(),
                    cultivation_plan: vec![week()],
                },
            )
            .await
            .unwrap();
        assert_eq!(doc.language, "hi");
        assert_eq!(
            STANDARD.decode(&doc.document_base64).unwrap(),
            doc.markdown.as_bytes()
        );

        let prompt = seen.lock().unwrap()[0]["messages"][0]["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(prompt.starts_with("Target language: Hindi (hi)"));
        assert!(prompt.contains("\"stage\":\"Land Prep\""));
    }

    #[tokio::test]
    async fn blank_markdown_is_an_error() {
        let (llm, _) = scripted_llm(vec![text(json!({"markdown_content": "  "}))]).await;
        let err = PlanDocumentFlow
            .generate(
                &FlowRunner::new(llm),
                &PlanDocumentInput {
                    language: "en".to_string(),
                    cultivation_plan: vec![week()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::EmptyAnswer(_)));
    }
}
