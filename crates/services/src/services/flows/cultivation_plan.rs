use std::sync::Arc;

use db::models::cultivation_plan::WeeklyTask;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::data_uri::DataUri;

use super::{Flow, FlowError, weather_tool::WeatherTool};
use crate::services::{
    llm_api::{ContentBlock, ToolHandler},
    plan_progress::{IDLE_DAY_ICON, KNOWN_ICONS},
    validation::{Validate, ValidationError, iso_date, min_chars, required},
    weather::WeatherService,
};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct CultivationPlanInput {
    /// e.g. "Tomato", "Wheat".
    pub crop: String,
    pub district: String,
    /// YYYY-MM-DD.
    pub sowing_date: String,
    /// Soil analysis as text, or a data URI of an image or PDF report.
    #[serde(default)]
    pub soil_report: Option<String>,
    /// Short summary of the farmer: location, experience, resources.
    #[serde(default)]
    pub user_profile: String,
}

impl CultivationPlanInput {
    fn soil_attachment(&self) -> Option<&str> {
        self.soil_report
            .as_deref()
            .filter(|report| DataUri::looks_like(report))
    }
}

impl Validate for CultivationPlanInput {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("crop", &self.crop, 2)?;
        required("district", &self.district)?;
        iso_date("sowing_date", &self.sowing_date)?;
        if let Some(report) = self.soil_attachment() {
            let uri = DataUri::parse(report)
                .map_err(|e| ValidationError::new("soil_report", e.to_string()))?;
            if !uri.is_image() && !uri.is_pdf() {
                return Err(ValidationError::new(
                    "soil_report",
                    "must be an image or a PDF",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, TS)]
pub struct CultivationPlanOutput {
    /// A week-by-week plan for the entire crop cycle, from pre-sowing to post-harvest.
    pub cultivation_plan: Vec<WeeklyTask>,
}

pub struct CultivationPlanFlow {
    weather: WeatherService,
}

impl CultivationPlanFlow {
    pub fn new(weather: WeatherService) -> Self {
        Self { weather }
    }
}

impl Flow for CultivationPlanFlow {
    const NAME: &'static str = "cultivation_plan";
    type Input = CultivationPlanInput;
    type Output = CultivationPlanOutput;

    fn system(&self) -> String {
        format!(
            "You are a master agronomist with decades of experience in Indian agriculture. Create \
             a personalized, actionable, week-by-week cultivation plan for the farmer.\n\
             1. Use the {} tool for the farmer's district and factor the conditions into \
             irrigation and pest or disease advice.\n\
             2. Estimate the crop duration in weeks, from pre-sowing to final harvest, and produce \
             one entry per week.\n\
             3. For each week give a short stage name, detailed tasks covering land and seed, \
             nutrient management with fertilizer types and kg/acre quantities, water management, \
             pest and disease control and other field work, and an icon name.\n\
             4. Break every week into seven days starting with Monday. Days without work get an \
             empty task and the \"{}\" icon.\n\
             5. Every icon_name must be exactly one of these Lucide icons: {}.",
            super::weather_tool::TOOL_NAME,
            IDLE_DAY_ICON,
            KNOWN_ICONS.join(", ")
        )
    }

    fn prompt(&self, input: &Self::Input) -> Result<Vec<ContentBlock>, FlowError> {
        let mut blocks = Vec::new();
        let mut text = format!(
            "Crop: {}\nLocation (district): {}\nPlanned sowing date: {}\nUser profile: {}\n",
            input.crop.trim(),
            input.district.trim(),
            input.sowing_date.trim(),
            input.user_profile.trim(),
        );

        match (input.soil_attachment(), input.soil_report.as_deref()) {
            (Some(report), _) => {
                let uri = DataUri::parse(report)?;
                blocks.push(if uri.is_pdf() {
                    ContentBlock::pdf(uri.data)
                } else {
                    ContentBlock::image(uri.mime_type, uri.data)
                });
                text.push_str(
                    "Soil report: attached as a file. Extract pH, N, P, K levels and soil type from it.",
                );
            }
            (None, Some(report)) if !report.trim().is_empty() => {
                text.push_str(&format!("Soil report: \"{}\"", report.trim()));
            }
            _ => text.push_str(
                "Soil report: not provided. Assume typical soil conditions for the crop and district.",
            ),
        }

        blocks.push(ContentBlock::text(text));
        Ok(blocks)
    }

    fn tools(&self) -> Vec<Arc<dyn ToolHandler>> {
        vec![Arc::new(WeatherTool::new(self.weather.clone()))]
    }

    fn max_tokens(&self) -> u32 {
        16_000
    }
}
