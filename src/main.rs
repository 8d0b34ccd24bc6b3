use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json,
};
use serde_json::json;

use yield_predictor::{
    form, ArtifactError, Artifacts, PredictError, PredictionInput, ServiceConfig,
};

// ---------- Response types ----------

#[derive(serde::Serialize)]
struct PredictOut {
    prediction: f64,
    display: String,
    unit: &'static str,
}

// ---------- Server state ----------

enum Service {
    Ready(Artifacts),
    /// Startup artifact failure: the message is served in place of the form
    /// and predictions answer 503 until the operator restarts with the
    /// files in place.
    Degraded(String),
}

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
}

fn ready(state: &AppState) -> Result<&Artifacts, (StatusCode, Json<serde_json::Value>)> {
    match state.service.as_ref() {
        Service::Ready(artifacts) => Ok(artifacts),
        Service::Degraded(message) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": message })),
        )),
    }
}

// ---------- Handlers ----------

async fn index(State(state): State<AppState>) -> Html<String> {
    match state.service.as_ref() {
        Service::Ready(artifacts) => Html(form::form_page(artifacts)),
        Service::Degraded(message) => Html(form::degraded_page(message)),
    }
}

async fn categories(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let artifacts = ready(&state)?;
    Ok(Json(json!({
        "crop": artifacts.crop().sorted_classes(),
        "season": artifacts.season().sorted_classes(),
        "state": artifacts.state().sorted_classes(),
    })))
}

async fn predict(
    State(state): State<AppState>,
    Json(input): Json<PredictionInput>,
) -> Result<Json<PredictOut>, (StatusCode, Json<serde_json::Value>)> {
    let artifacts = ready(&state)?;

    // Debug signal so submissions can be traced without logging every request
    if std::env::var("LOG_PRED").ok().as_deref() == Some("1") {
        tracing::info!(
            "recv crop={} year={} season={} state={} area={} production={} rainfall={} fertilizer={} pesticide={}",
            input.crop, input.crop_year, input.season, input.state,
            input.area, input.production, input.annual_rainfall,
            input.fertilizer, input.pesticide
        );
    }

    let prediction = artifacts.predict(&input).map_err(|e| {
        let status = match &e {
            PredictError::UnknownCategory { .. } | PredictError::OutOfRange { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": e.to_string() })))
    })?;

    Ok(Json(PredictOut {
        prediction: prediction.value,
        display: prediction.display,
        unit: "tons/hectare",
    }))
}

// ---------- Startup ----------

fn load_service(cfg: &ServiceConfig) -> Service {
    let artifacts = match Artifacts::load(cfg) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            match &e {
                ArtifactError::Missing { .. } => {
                    tracing::error!("{e}; serving degraded until the file is provided")
                }
                _ => tracing::error!("artifact rejected: {e}"),
            }
            return Service::Degraded(e.to_string());
        }
    };

    // One scoring pass through the whole pipeline before taking traffic
    match artifacts.warmup() {
        Ok(prediction) => tracing::info!("warmup forward ok ({})", prediction.display),
        Err(e) => {
            tracing::error!("warmup failed: {e}");
            return Service::Degraded(format!("warmup failed: {e}"));
        }
    }

    tracing::info!(
        "loaded model and encoders; crops={} seasons={} states={}",
        artifacts.crop().len(),
        artifacts.season().len(),
        artifacts.state().len()
    );
    Service::Ready(artifacts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = ServiceConfig::from_env();
    tracing::info!(
        "model: {}; encoders: {:?}",
        cfg.model_path.display(),
        cfg.encoders
    );

    let state = AppState {
        service: Arc::new(load_service(&cfg)),
    };

    let app = axum::Router::new()
        .route("/", get(index))
        .route("/categories", get(categories))
        .route("/predict", post(predict))
        .with_state(state);

    tracing::info!("listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
