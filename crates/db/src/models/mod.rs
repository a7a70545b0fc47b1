pub mod crop;
pub mod cultivation_plan;
pub mod farm;
pub mod market_price;
pub mod sensor_reading;
pub mod soil_report;
pub mod user_profile;
