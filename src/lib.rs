//! Crop yield prediction service.
//!
//! Loads a pre-trained regression model and a set of categorical encoders
//! from disk at startup, serves a single-page form for nine input fields,
//! and returns one numeric yield prediction per submission. The artifacts
//! are produced elsewhere and consumed read-only; no training or data
//! pipeline lives here.

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod form;
pub mod model;
pub mod types;

pub use artifacts::{Artifacts, Prediction};
pub use config::{EncoderLayout, ServiceConfig};
pub use encoder::CategoryEncoder;
pub use error::{ArtifactError, PredictError};
pub use model::{ModelSpec, ScoringModel, TreeSpec};
pub use types::{PredictionInput, PredictionRecord, FEATURE_COLUMNS};
