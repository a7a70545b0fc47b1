//! Form-level input validation shared by flows and CRUD routes.

use chrono::NaiveDate;
use db::models::{
    crop::{CreateCrop, UpdateCrop},
    cultivation_plan::CreateCultivationPlan,
    farm::{CreateFarm, UpdateFarm},
    sensor_reading::CreateSensorReading,
    soil_report::{CreateSoilReport, SoilData, UpdateSoilReport},
    user_profile::{CreateUserProfile, UpdateUserProfile},
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::locales;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// First failing field of a form.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn min_chars(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(())
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !EMAIL.is_match(value.trim()) {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }
    Ok(())
}

pub fn locale(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if locales::find(value).is_none() {
        return Err(ValidationError::new(
            field,
            format!("unsupported language '{value}'"),
        ));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn iso_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, "must be a date in YYYY-MM-DD format"))
}

fn at_least(field: &'static str, value: f64, min: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min {
        return Err(ValidationError::new(field, format!("must be at least {min}")));
    }
    Ok(())
}

fn harvest_after_planting(planting: NaiveDate, harvest: NaiveDate) -> Result<(), ValidationError> {
    if harvest < planting {
        return Err(ValidationError::new(
            "expected_harvest_date",
            "must not be before the planting date",
        ));
    }
    Ok(())
}

impl Validate for CreateUserProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("display_name", &self.display_name, 2)?;
        email("email", &self.email)?;
        if let Some(size) = self.land_size_acres {
            at_least("land_size_acres", size, 0.0)?;
        }
        Ok(())
    }
}

impl Validate for UpdateUserProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.display_name {
            min_chars("display_name", name, 2)?;
        }
        if let Some(address) = &self.email {
            email("email", address)?;
        }
        if let Some(size) = self.land_size_acres {
            at_least("land_size_acres", size, 0.0)?;
        }
        Ok(())
    }
}

impl Validate for CreateFarm {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("farm_name", &self.farm_name, 2)?;
        min_chars("location", &self.location, 2)?;
        required("district", &self.district)?;
        at_least("size_acres", self.size_acres, 0.1)?;
        required("soil_type", &self.soil_type)?;
        required("topography", &self.topography)?;
        required("water_source", &self.water_source)
    }
}

impl Validate for UpdateFarm {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.farm_name {
            min_chars("farm_name", name, 2)?;
        }
        if let Some(location) = &self.location {
            min_chars("location", location, 2)?;
        }
        if let Some(size) = self.size_acres {
            at_least("size_acres", size, 0.1)?;
        }
        Ok(())
    }
}

impl Validate for CreateCrop {
    fn validate(&self) -> Result<(), ValidationError> {
        required("owner_id", &self.owner_id)?;
        min_chars("crop_type", &self.crop_type, 2)?;
        harvest_after_planting(self.planting_date, self.expected_harvest_date)?;
        if let Some(yield_) = self.expected_yield {
            at_least("expected_yield", yield_, 0.0)?;
        }
        Ok(())
    }
}

impl Validate for UpdateCrop {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(crop_type) = &self.crop_type {
            min_chars("crop_type", crop_type, 2)?;
        }
        if let (Some(planting), Some(harvest)) = (self.planting_date, self.expected_harvest_date) {
            harvest_after_planting(planting, harvest)?;
        }
        Ok(())
    }
}

impl Validate for CreateSensorReading {
    fn validate(&self) -> Result<(), ValidationError> {
        required("sensor_id", &self.sensor_id)?;
        required("unit", &self.unit)?;
        if !self.value.is_finite() {
            return Err(ValidationError::new("value", "must be a number"));
        }
        Ok(())
    }
}

impl Validate for CreateCultivationPlan {
    fn validate(&self) -> Result<(), ValidationError> {
        min_chars("crop_type", &self.crop_type, 2)?;
        required("district", &self.district)?;
        if self.plan.is_empty() {
            return Err(ValidationError::new("plan", "must contain at least one week"));
        }
        Ok(())
    }
}

impl Validate for SoilData {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ph.is_some_and(|ph| !(0.0..=14.0).contains(&ph)) {
            return Err(ValidationError::new("ph", "must be between 0 and 14"));
        }
        for (field, value) in [
            ("nitrogen", self.nitrogen),
            ("phosphorus", self.phosphorus),
            ("potassium", self.potassium),
            ("organic_matter", self.organic_matter),
        ] {
            if let Some(value) = value {
                at_least(field, value, 0.0)?;
            }
        }
        Ok(())
    }
}

fn report_year(year: i32) -> Result<(), ValidationError> {
    if !(1900..=2100).contains(&year) {
        return Err(ValidationError::new("year", "must be between 1900 and 2100"));
    }
    Ok(())
}

impl Validate for CreateSoilReport {
    fn validate(&self) -> Result<(), ValidationError> {
        report_year(self.year)?;
        self.data.validate()
    }
}

impl Validate for UpdateSoilReport {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(year) = self.year {
            report_year(year)?;
        }
        match &self.data {
            Some(data) => data.validate(),
            None => Ok(()),
        }
    }
}
