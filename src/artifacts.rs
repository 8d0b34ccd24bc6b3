use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{EncoderLayout, ServiceConfig};
use crate::encoder::CategoryEncoder;
use crate::error::{ArtifactError, PredictError};
use crate::model::{ModelSpec, ScoringModel};
use crate::types::{
    PredictionInput, PredictionRecord, CROP_YEAR_MAX, CROP_YEAR_MIN, FEATURE_COLUMNS,
};

/// Everything the prediction path needs, loaded once at startup and shared
/// read-only for the life of the process.
#[derive(Debug)]
pub struct Artifacts {
    model: ScoringModel,
    crop: CategoryEncoder,
    season: CategoryEncoder,
    state: CategoryEncoder,
}

/// One prediction: the full-precision value plus the two-decimal string the
/// form displays.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub value: f64,
    pub display: String,
}

impl Artifacts {
    /// Load and validate all artifacts named by the configuration.
    ///
    /// Existence is checked for every required file before anything is
    /// parsed, so a missing file is always reported as [`ArtifactError::Missing`]
    /// with its exact path rather than as a parse failure downstream.
    pub fn load(cfg: &ServiceConfig) -> Result<Self, ArtifactError> {
        for path in cfg.required_paths() {
            if !path.exists() {
                return Err(ArtifactError::Missing {
                    path: path.to_path_buf(),
                });
            }
        }

        let spec: ModelSpec = read_json(&cfg.model_path)?;
        let model = ScoringModel::new(spec).map_err(|reason| ArtifactError::Invalid {
            path: cfg.model_path.clone(),
            reason,
        })?;

        if model.n_features() != FEATURE_COLUMNS.len() {
            return Err(ArtifactError::Invalid {
                path: cfg.model_path.clone(),
                reason: format!(
                    "model expects {} features, schema has {}",
                    model.n_features(),
                    FEATURE_COLUMNS.len()
                ),
            });
        }
        if let Some(names) = model.feature_names() {
            if names.iter().map(String::as_str).ne(FEATURE_COLUMNS.iter().copied()) {
                return Err(ArtifactError::Invalid {
                    path: cfg.model_path.clone(),
                    reason: format!("model feature_names {names:?} do not match the record schema"),
                });
            }
        }

        let (crop, season, state) = match &cfg.encoders {
            EncoderLayout::Bundle(path) => {
                let mut bundle: HashMap<String, Vec<String>> = read_json(path)?;
                let mut take = |field: &'static str| {
                    let classes =
                        bundle
                            .remove(field)
                            .ok_or_else(|| ArtifactError::Invalid {
                                path: path.clone(),
                                reason: format!("bundle has no {field:?} entry"),
                            })?;
                    CategoryEncoder::from_classes(field, classes).map_err(|reason| {
                        ArtifactError::Invalid {
                            path: path.clone(),
                            reason,
                        }
                    })
                };
                (take("Crop")?, take("Season")?, take("State")?)
            }
            EncoderLayout::Split {
                crop,
                season,
                state,
            } => (
                load_split_encoder("Crop", crop)?,
                load_split_encoder("Season", season)?,
                load_split_encoder("State", state)?,
            ),
        };

        Ok(Self::from_parts(model, crop, season, state))
    }

    /// Assemble from already-validated parts. Used by the loader and by
    /// tests that build artifacts in memory.
    pub fn from_parts(
        model: ScoringModel,
        crop: CategoryEncoder,
        season: CategoryEncoder,
        state: CategoryEncoder,
    ) -> Self {
        Self {
            model,
            crop,
            season,
            state,
        }
    }

    /// Run the full submission path for one input.
    ///
    /// Pure and synchronous: encode the categorical fields, range-check the
    /// rest, flatten in schema order, score, and format for display. Every
    /// failure maps to a [`PredictError`] variant; nothing here can affect a
    /// later submission.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction, PredictError> {
        let record = self.encode(input)?;
        let value = self.model.predict(&record.to_features())?;
        Ok(Prediction {
            value,
            display: format!("{value:.2}"),
        })
    }

    /// Map a raw input to the encoded record, enforcing the form's own
    /// bounds for callers that bypass the form.
    pub fn encode(&self, input: &PredictionInput) -> Result<PredictionRecord, PredictError> {
        let crop = self.crop.encode(&input.crop)?;
        let season = self.season.encode(&input.season)?;
        let state = self.state.encode(&input.state)?;

        if !(CROP_YEAR_MIN..=CROP_YEAR_MAX).contains(&input.crop_year) {
            return Err(PredictError::OutOfRange {
                field: "Crop_Year",
                reason: format!(
                    "{} is outside [{CROP_YEAR_MIN}, {CROP_YEAR_MAX}]",
                    input.crop_year
                ),
            });
        }
        for (field, value) in [
            ("Area", input.area),
            ("Production", input.production),
            ("Annual_Rainfall", input.annual_rainfall),
            ("Fertilizer", input.fertilizer),
            ("Pesticide", input.pesticide),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PredictError::OutOfRange {
                    field,
                    reason: format!("{value} is not a non-negative finite number"),
                });
            }
        }

        Ok(PredictionRecord {
            crop,
            crop_year: input.crop_year,
            season,
            state,
            area: input.area,
            production: input.production,
            annual_rainfall: input.annual_rainfall,
            fertilizer: input.fertilizer,
            pesticide: input.pesticide,
        })
    }

    /// One fixed scoring pass through the whole pipeline, run at startup to
    /// catch artifact mismatches before the first real submission.
    pub fn warmup(&self) -> Result<Prediction, PredictError> {
        let input = PredictionInput {
            crop: self.crop.classes()[0].clone(),
            crop_year: 2022,
            season: self.season.classes()[0].clone(),
            state: self.state.classes()[0].clone(),
            area: 1.0,
            production: 1.0,
            annual_rainfall: 800.0,
            fertilizer: 50.0,
            pesticide: 5.0,
        };
        self.predict(&input)
    }

    pub fn crop(&self) -> &CategoryEncoder {
        &self.crop
    }

    pub fn season(&self) -> &CategoryEncoder {
        &self.season
    }

    pub fn state(&self) -> &CategoryEncoder {
        &self.state
    }
}

fn load_split_encoder(
    field: &'static str,
    path: &Path,
) -> Result<CategoryEncoder, ArtifactError> {
    let classes: Vec<String> = read_json(path)?;
    CategoryEncoder::from_classes(field, classes).map_err(|reason| ArtifactError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn encoder(field: &'static str, classes: &[&str]) -> CategoryEncoder {
        CategoryEncoder::from_classes(field, classes.iter().map(|s| s.to_string()).collect())
            .expect("Should build encoder")
    }

    /// Linear model over the 9-column schema with easily traceable weights:
    /// prediction = 0.01 * Area + 2.0 (other coefficients zero).
    fn test_artifacts() -> Artifacts {
        let spec = ModelSpec::Linear {
            n_features: 9,
            feature_names: Some(FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()),
            coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.01, 0.0, 0.0, 0.0, 0.0],
            intercept: 2.0,
        };
        let model = ScoringModel::new(spec).expect("Should validate");
        Artifacts::from_parts(
            model,
            encoder("Crop", &["Maize", "Rice", "Wheat"]),
            encoder("Season", &["Kharif", "Rabi"]),
            encoder("State", &["Assam", "Punjab"]),
        )
    }

    fn valid_input() -> PredictionInput {
        PredictionInput {
            crop: "Rice".to_string(),
            crop_year: 2022,
            season: "Kharif".to_string(),
            state: "Punjab".to_string(),
            area: 100.0,
            production: 250.0,
            annual_rainfall: 800.0,
            fertilizer: 50.0,
            pesticide: 5.0,
        }
    }

    #[test]
    fn test_predict_happy_path() {
        let artifacts = test_artifacts();
        let prediction = artifacts.predict(&valid_input()).expect("Should predict");
        assert_abs_diff_eq!(prediction.value, 3.0);
        assert_eq!(prediction.display, "3.00");
    }

    #[test]
    fn test_predict_is_deterministic() {
        let artifacts = test_artifacts();
        let first = artifacts.predict(&valid_input()).unwrap();
        let second = artifacts.predict(&valid_input()).unwrap();
        assert_eq!(
            first.value.to_bits(),
            second.value.to_bits(),
            "Same input must score bit-identically"
        );
    }

    #[test]
    fn test_unknown_crop_rejected() {
        let artifacts = test_artifacts();
        let mut input = valid_input();
        input.crop = "Coconut".to_string();
        match artifacts.predict(&input).unwrap_err() {
            PredictError::UnknownCategory { field, value } => {
                assert_eq!(field, "Crop");
                assert_eq!(value, "Coconut");
            }
            other => panic!("Expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_crop_year_bounds() {
        let artifacts = test_artifacts();

        for year in [CROP_YEAR_MIN, CROP_YEAR_MAX] {
            let mut input = valid_input();
            input.crop_year = year;
            assert!(artifacts.predict(&input).is_ok(), "Year {year} should be accepted");
        }

        for year in [CROP_YEAR_MIN - 1, CROP_YEAR_MAX + 1] {
            let mut input = valid_input();
            input.crop_year = year;
            match artifacts.predict(&input).unwrap_err() {
                PredictError::OutOfRange { field, .. } => assert_eq!(field, "Crop_Year"),
                other => panic!("Expected OutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_numeric_rejected() {
        let artifacts = test_artifacts();
        let mut input = valid_input();
        input.annual_rainfall = -1.0;
        match artifacts.predict(&input).unwrap_err() {
            PredictError::OutOfRange { field, .. } => assert_eq!(field, "Annual_Rainfall"),
            other => panic!("Expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_numeric_rejected() {
        let artifacts = test_artifacts();
        let mut input = valid_input();
        input.area = f64::NAN;
        assert!(matches!(
            artifacts.predict(&input).unwrap_err(),
            PredictError::OutOfRange { field: "Area", .. }
        ));
    }

    #[test]
    fn test_all_zero_numerics_stay_finite() {
        let artifacts = test_artifacts();
        let mut input = valid_input();
        input.area = 0.0;
        input.production = 0.0;
        input.annual_rainfall = 0.0;
        input.fertilizer = 0.0;
        input.pesticide = 0.0;
        let prediction = artifacts.predict(&input).expect("Should predict");
        assert!(prediction.value.is_finite());
        assert_abs_diff_eq!(prediction.value, 2.0);
    }

    #[test]
    fn test_encoded_record_uses_schema_codes() {
        let artifacts = test_artifacts();
        let record = artifacts.encode(&valid_input()).unwrap();
        assert_eq!(record.crop, 1); // Rice
        assert_eq!(record.season, 0); // Kharif
        assert_eq!(record.state, 1); // Punjab
    }

    #[test]
    fn test_warmup_runs_the_pipeline() {
        let artifacts = test_artifacts();
        let prediction = artifacts.warmup().expect("Warmup should score");
        assert!(prediction.value.is_finite());
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        let artifacts = test_artifacts();
        let mut input = valid_input();
        input.area = 123.456; // 0.01 * 123.456 + 2.0 = 3.23456
        let prediction = artifacts.predict(&input).unwrap();
        assert_eq!(prediction.display, "3.23");
        assert_abs_diff_eq!(prediction.value, 3.23456, epsilon = 1e-9);
    }
}
