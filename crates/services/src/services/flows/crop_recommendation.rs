use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Flow, FlowError};
use crate::services::{
    llm_api::ContentBlock,
    validation::{Validate, ValidationError, min_chars, required},
};

pub const MAX_CROP_HISTORY: usize = 3;

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct CropRecommendationInput {
    /// pH, nitrogen, phosphorus and potassium levels, free text.
    pub soil_analysis: String,
    pub weather_data: String,
    pub district: String,
    /// e.g. Kharif, Rabi, Zaid.
    pub season: String,
    pub topography: String,
    /// Crops grown in recent seasons, most recent first.
    #[serde(default)]
    pub crop_history: Vec<String>,
}

impl Validate for CropRecommendationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("soil_analysis", &self.soil_analysis, 10)?;
        min_chars("weather_data", &self.weather_data, 10)?;
        required("district", &self.district)?;
        required("season", &self.season)?;
        required("topography", &self.topography)?;
        if self.crop_history.len() > MAX_CROP_HISTORY {
            return Err(ValidationError::new(
                "crop_history",
                format!("at most {MAX_CROP_HISTORY} previous crops"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, TS)]
pub struct CropRecommendationOutput {
    /// A list of recommended crops, along with the reasons for the recommendations.
    pub recommended_crops: String,
    /// Detailed planting instructions for the recommended crops, including timing, spacing, and fertilization.
    pub planting_instructions: String,
    /// Risks of planting the recommended crops, including pests, diseases and weather-related challenges.
    pub risk_assessment: String,
}

pub struct CropRecommendationFlow;

impl Flow for CropRecommendationFlow {
    const NAME: &'static str = "crop_recommendation";
    type Input = CropRecommendationInput;
    type Output = CropRecommendationOutput;

    fn system(&self) -> String {
        "You are an expert agricultural advisor for Indian farmers. Recommend the best crops \
         for the farm described by the user. Weigh soil type and nutrient levels, climate and \
         growing season, topography, crop rotation, market demand and profitability, and risk \
         factors such as pests, diseases and weather."
            .to_string()
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        let history = if input.crop_history.is_empty() {
            "Not provided".to_string()
        } else {
            input.crop_history.join(", ")
        };
        Ok(vec![ContentBlock::text(format!(
            "Soil Analysis: {}\nWeather Data: {}\nDistrict: {}\nSeason: {}\nTopography: {}\n\
             Previous crops: {history}\n\n\
             Provide detailed planting instructions for the recommended crops, including timing, \
             spacing and fertilization, and an assessment of the risks involved.",
            input.soil_analysis.trim(),
            input.weather_data.trim(),
            input.district.trim(),
            input.season.trim(),
            input.topography.trim(),
        ))])
    }
}
