use std::{
    env, fs,
    path::{Path, PathBuf},
};

use ts_rs::TS;

fn declarations() -> Vec<String> {
    vec![
        utils::response::ApiResponse::<()>::decl(),
        db::models::user_profile::UserProfile::decl(),
        db::models::user_profile::CreateUserProfile::decl(),
        db::models::user_profile::UpdateUserProfile::decl(),
        db::models::farm::Farm::decl(),
        db::models::farm::CreateFarm::decl(),
        db::models::farm::UpdateFarm::decl(),
        db::models::crop::CropStatus::decl(),
        db::models::crop::Crop::decl(),
        db::models::crop::CreateCrop::decl(),
        db::models::crop::UpdateCrop::decl(),
        db::models::sensor_reading::SensorKind::decl(),
        db::models::sensor_reading::SensorReading::decl(),
        db::models::sensor_reading::CreateSensorReading::decl(),
        db::models::cultivation_plan::PlanStatus::decl(),
        db::models::cultivation_plan::DailyTask::decl(),
        db::models::cultivation_plan::WeeklyTask::decl(),
        db::models::cultivation_plan::CultivationPlan::decl(),
        db::models::cultivation_plan::CreateCultivationPlan::decl(),
        db::models::cultivation_plan::UpdateCultivationPlan::decl(),
        db::models::soil_report::ReportType::decl(),
        db::models::soil_report::SoilData::decl(),
        db::models::soil_report::SoilReport::decl(),
        db::models::soil_report::CreateSoilReport::decl(),
        db::models::soil_report::UpdateSoilReport::decl(),
        db::models::market_price::CropPrice::decl(),
        db::models::market_price::SeedPrice::decl(),
        services::services::config::FirebaseClientConfig::decl(),
        services::services::database_validator::DatabaseHealth::decl(),
        services::services::plan_progress::WeekState::decl(),
        services::services::plan_progress::DayView::decl(),
        services::services::plan_progress::WeekView::decl(),
        services::services::plan_progress::PlanProgress::decl(),
        services::services::storage::UploadFolder::decl(),
        services::services::storage::StoredFile::decl(),
        services::services::weather::WeatherData::decl(),
        services::services::market_data::MandiRecord::decl(),
        services::services::market_data::SeedMarketPrice::decl(),
        services::services::market_data::ProductionRecord::decl(),
        services::services::flows::crop_recommendation::CropRecommendationInput::decl(),
        services::services::flows::crop_recommendation::CropRecommendationOutput::decl(),
        services::services::flows::disease_detection::DiseaseDetectionInput::decl(),
        services::services::flows::disease_detection::DiseaseDetectionOutput::decl(),
        services::services::flows::chatbot::ChatInput::decl(),
        services::services::flows::chatbot::ChatOutput::decl(),
        services::services::flows::farming_advice::FarmingAdviceInput::decl(),
        services::services::flows::farming_advice::FarmingAdviceOutput::decl(),
        services::services::flows::cultivation_plan::CultivationPlanInput::decl(),
        services::services::flows::cultivation_plan::CultivationPlanOutput::decl(),
        services::services::flows::plan_document::PlanDocumentInput::decl(),
        services::services::flows::plan_document::PlanDocument::decl(),
        services::services::flows::market_prices::MarketSyncInput::decl(),
        services::services::flows::market_prices::MarketSyncReport::decl(),
        server::routes::health::HealthStatus::decl(),
        server::routes::uploads::UploadRequest::decl(),
    ]
}

fn write_declarations(output: &Path) -> std::io::Result<()> {
    let mut contents = String::from(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n",
    );
    for decl in declarations() {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, contents)
}

fn main() -> std::io::Result<()> {
    let output = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));

    write_declarations(&output)?;
    println!("Wrote {}", output.display());
    Ok(())
}
