use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    protocol::PredictRequest,
};

/// Selector for the individual form fields, used by the session reducer's
/// `SetField` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Nitrogen,
    Potassium,
    Phosphorous,
    SoilType,
    Location,
}

/// The editable form snapshot. Nutrient fields are kept as raw text so an
/// empty input stays a distinct "unset" state rather than collapsing to
/// zero, and so non-numeric input is visible to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub nitrogen: String,
    pub potassium: String,
    pub phosphorous: String,
    pub soil_type: String,
    pub location: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            nitrogen: String::new(),
            potassium: String::new(),
            phosphorous: String::new(),
            soil_type: String::new(),
            location: "Bengaluru".to_string(),
        }
    }
}

impl FormInput {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Nitrogen => self.nitrogen = value,
            FormField::Potassium => self.potassium = value,
            FormField::Phosphorous => self.phosphorous = value,
            FormField::SoilType => self.soil_type = value,
            FormField::Location => self.location = value,
        }
    }

    /// Validates the snapshot and serializes it into the wire payload.
    /// Every field must be set; nutrient fields must additionally be
    /// finite, nonnegative numbers.
    pub fn validate(&self) -> Result<PredictRequest, ValidationError> {
        let nitrogen = parse_nutrient(&self.nitrogen)?;
        let potassium = parse_nutrient(&self.potassium)?;
        let phosphorous = parse_nutrient(&self.phosphorous)?;

        let soil_type = self.soil_type.trim();
        let location = self.location.trim();
        if soil_type.is_empty() || location.is_empty() {
            return Err(ValidationError::MissingField);
        }

        Ok(PredictRequest {
            nitrogen,
            potassium,
            phosphorous,
            soil_type: soil_type.to_string(),
            location: location.to_string(),
        })
    }
}

fn parse_nutrient(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidNumber)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidNumber);
    }
    Ok(value)
}

/// The ordered soil-type labels served by the backend. Fetched once per
/// session and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoilTypeCatalog {
    labels: Vec<String>,
}

impl SoilTypeCatalog {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The selector default: the first label, in backend order.
    pub fn default_selection(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
