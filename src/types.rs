use serde::{Deserialize, Serialize};

/// Column order the scoring model was trained against. Both the names and
/// the order are part of the model's input contract; [`PredictionRecord::to_features`]
/// must flatten in exactly this order.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "Crop",
    "Crop_Year",
    "Season",
    "State",
    "Area",
    "Production",
    "Annual_Rainfall",
    "Fertilizer",
    "Pesticide",
];

/// Bounds enforced on `Crop_Year`, matching the form's own input control.
pub const CROP_YEAR_MIN: i32 = 1990;
pub const CROP_YEAR_MAX: i32 = 2100;

/// Raw submission values, exactly as they arrive from the form or an API
/// caller. Categorical fields are still strings here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    pub crop: String,
    pub crop_year: i32,
    pub season: String,
    pub state: String,
    /// Cultivated area in hectares
    pub area: f64,
    /// Production in tons
    pub production: f64,
    /// Annual rainfall in mm
    pub annual_rainfall: f64,
    /// Fertilizer used in kg/ha
    pub fertilizer: f64,
    /// Pesticide used in kg/ha
    pub pesticide: f64,
}

/// A fully encoded record in the model's input schema. Categorical fields
/// have been mapped to their integer codes.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub crop: i64,
    pub crop_year: i32,
    pub season: i64,
    pub state: i64,
    pub area: f64,
    pub production: f64,
    pub annual_rainfall: f64,
    pub fertilizer: f64,
    pub pesticide: f64,
}

impl PredictionRecord {
    /// Flatten into the feature vector the scoring model consumes, in
    /// [`FEATURE_COLUMNS`] order.
    pub fn to_features(&self) -> [f64; 9] {
        [
            self.crop as f64,
            self.crop_year as f64,
            self.season as f64,
            self.state as f64,
            self.area,
            self.production,
            self.annual_rainfall,
            self.fertilizer,
            self.pesticide,
        ]
    }
}
