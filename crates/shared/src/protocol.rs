use serde::{Deserialize, Serialize};

/// Payload POSTed to `{base}/predict`. Nutrient values travel as JSON
/// numbers, never strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub nitrogen: f64,
    pub potassium: f64,
    pub phosphorous: f64,
    pub soil_type: String,
    pub location: String,
}

/// Successful response body of `{base}/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub moisture_estimate: f64,
    pub predicted_crop_type: String,
    pub predicted_fertilizer_name: String,
}

/// Error body the backend attaches to non-2xx responses. `detail` is
/// optional; absence falls back to a generic status-coded message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
