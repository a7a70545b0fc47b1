use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::data_uri::DataUri;

use super::{Flow, FlowError, FlowRunner};
use crate::services::{
    llm_api::ContentBlock,
    validation::{Validate, ValidationError},
};

pub const HEALTHY: &str = "Healthy";

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct DiseaseDetectionInput {
    /// `data:<mimetype>;base64,<encoded_data>` photo of a plant leaf.
    pub photo_data_uri: String,
}

impl Validate for DiseaseDetectionInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let uri = DataUri::parse(&self.photo_data_uri)
            .map_err(|e| ValidationError::new("photo_data_uri", e.to_string()))?;
        if !uri.is_image() {
            return Err(ValidationError::new("photo_data_uri", "must be an image"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, TS)]
pub struct DiseaseDetectionOutput {
    /// The name of the detected disease. If the plant is healthy, return "Healthy".
    pub disease: String,
    /// The confidence score of the detection, from 0 to 100.
    #[schemars(range(min = 0, max = 100))]
    pub confidence: f64,
    /// A concise, actionable treatment. If the plant is healthy, a general care tip.
    pub treatment: String,
}

impl DiseaseDetectionOutput {
    pub fn is_healthy(&self) -> bool {
        self.disease.trim().eq_ignore_ascii_case(HEALTHY)
    }

    /// Confidence as a percentage. Fractions below 1 are scaled up, the rest is clamped to 0-100.
    fn normalize_confidence(mut self) -> Self {
        if self.confidence > 0.0 && self.confidence < 1.0 {
            self.confidence *= 100.0;
        }
        self.confidence = self.confidence.clamp(0.0, 100.0);
        self
    }
}

pub struct DiseaseDetectionFlow;

impl DiseaseDetectionFlow {
    pub async fn diagnose(
        &self,
        runner: &FlowRunner,
        input: &DiseaseDetectionInput,
    ) -> Result<DiseaseDetectionOutput, FlowError> {
        let output = runner.run(self, input).await?;
        if output.disease.trim().is_empty() {
            return Err(FlowError::EmptyAnswer("Failed to identify the plant's condition."));
        }
        Ok(output.normalize_confidence())
    }
}

impl Flow for DiseaseDetectionFlow {
    const NAME: &'static str = "disease_detection";
    type Input = DiseaseDetectionInput;
    type Output = DiseaseDetectionOutput;

    fn system(&self) -> String {
        "You are an expert plant pathologist. Analyze the provided image of a plant leaf. \
         Identify any disease present; if the plant appears healthy, say so. Give a confidence \
         score for your diagnosis and a concise, actionable treatment plan, or a simple care tip \
         for a healthy plant."
            .to_string()
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        let photo = DataUri::parse(&input.photo_data_uri)?;
        Ok(vec![
            ContentBlock::image(photo.mime_type, photo.data),
            ContentBlock::text("Diagnose this plant."),
        ])
    }

    fn max_tokens(&self) -> u32 {
        1024
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::flows::test_support::{scripted_llm, text};

    const LEAF: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn leaf() -> DiseaseDetectionInput {
        DiseaseDetectionInput {
            photo_data_uri: LEAF.to_string(),
        }
    }

    async fn diagnose_reply(reply: serde_json::Value) -> Result<DiseaseDetectionOutput, FlowError> {
        let (llm, _) = scripted_llm(vec![text(reply)]).await;
        DiseaseDetectionFlow
            .diagnose(&FlowRunner::new(llm), &leaf())
            .await
    }

    #[test]
    fn requires_an_image_data_uri() {
        let ok = DiseaseDetectionInput {
            photo_data_uri: LEAF.to_string(),
        };
        assert!(ok.validate().is_ok());

        for bad in [
            "https://example.com/leaf.png",
            "data:application/pdf;base64,JVBERi0=",
            "data:image/png,raw",
        ] {
            let input = DiseaseDetectionInput {
                photo_data_uri: bad.to_string(),
            };
            assert_eq!(input.validate().unwrap_err().field, "photo_data_uri", "{bad}");
        }
    }

    #[tokio::test]
    async fn sends_photo_as_image_block() {
        let (llm, seen) = scripted_llm(vec![text(json!({
            "disease": "Healthy",
            "confidence": 92,
            "treatment": "Keep watering at the base."
        }))])
        .await;

        let output = DiseaseDetectionFlow
            .diagnose(&FlowRunner::new(llm), &leaf())
            .await
            .unwrap();
        assert!(output.is_healthy());
        assert_eq!(output.confidence, 92.0);

        let block = &seen.lock().unwrap()[0]["messages"][0]["content"][0];
        assert_eq!(block["type"], "image");
        assert_eq!(block["source"]["media_type"], "image/png");
        assert_eq!(block["source"]["data"], "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn confidence_is_kept_within_percent_range() {
        let reply = |confidence: f64| {
            json!({"disease": "Leaf Blight", "confidence": confidence, "treatment": "Spray copper oxychloride."})
        };
        let scaled = diagnose_reply(reply(0.92)).await.unwrap().confidence;
        assert!((scaled - 92.0).abs() < 1e-9, "{scaled}");
        assert_eq!(diagnose_reply(reply(150.0)).await.unwrap().confidence, 100.0);
        assert_eq!(diagnose_reply(reply(-3.0)).await.unwrap().confidence, 0.0);
        assert_eq!(diagnose_reply(reply(75.0)).await.unwrap().confidence, 75.0);
    }

    #[tokio::test]
    async fn blank_diagnosis_is_an_error() {
        let err = diagnose_reply(json!({"disease": " ", "confidence": 50, "treatment": ""}))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::EmptyAnswer(_)));
    }

    #[test]
    fn schema_bounds_confidence() {
        let schema = crate::services::flows::json_schema_for::<DiseaseDetectionOutput>();
        assert_eq!(schema["properties"]["confidence"]["minimum"].as_f64(), Some(0.0));
        assert_eq!(schema["properties"]["confidence"]["maximum"].as_f64(), Some(100.0));
    }
}
