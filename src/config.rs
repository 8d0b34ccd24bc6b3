use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Conventional artifact locations, relative to the working directory the
/// service is launched from.
pub const DEFAULT_MODEL_PATH: &str = "crop_yield_model.json";
pub const DEFAULT_BUNDLE_PATH: &str = "label_encoders.json";
pub const DEFAULT_CROP_PATH: &str = "le_crop.json";
pub const DEFAULT_SEASON_PATH: &str = "le_season.json";
pub const DEFAULT_STATE_PATH: &str = "le_state.json";

/// How the categorical encoders are stored on disk. The training side has
/// shipped both layouts, so the contract stays configurable instead of
/// hard-coding one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderLayout {
    /// One file mapping column name → class list
    Bundle(PathBuf),
    /// Three per-field files
    Split {
        crop: PathBuf,
        season: PathBuf,
        state: PathBuf,
    },
}

impl EncoderLayout {
    /// Every file this layout requires on disk.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            EncoderLayout::Bundle(path) => vec![path],
            EncoderLayout::Split {
                crop,
                season,
                state,
            } => vec![crop, season, state],
        }
    }
}

/// Resolved service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub encoders: EncoderLayout,
    pub bind_addr: SocketAddr,
}

impl ServiceConfig {
    /// Read configuration from the environment.
    ///
    /// `MODEL_PATH` locates the model; `ENCODERS_PATH` pins the bundle
    /// layout and `LE_CROP_PATH`/`LE_SEASON_PATH`/`LE_STATE_PATH` pin the
    /// split layout. With no encoder variables set, the bundle file is
    /// preferred when it exists and the split files are assumed otherwise.
    /// `BIND_ADDR` or `PORT` control the listener.
    pub fn from_env() -> Self {
        let model_path = env_path("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.into());

        let encoders = choose_layout(
            env_path("ENCODERS_PATH"),
            env_path("LE_CROP_PATH"),
            env_path("LE_SEASON_PATH"),
            env_path("LE_STATE_PATH"),
            Path::new(DEFAULT_BUNDLE_PATH).exists(),
        );

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], port)));

        Self {
            model_path,
            encoders,
            bind_addr,
        }
    }

    /// Every artifact file that must exist before loading starts.
    pub fn required_paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.model_path.as_path()];
        paths.extend(self.encoders.paths());
        paths
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Pick the encoder layout from whatever combination of variables the
/// operator set. Explicit bundle wins; any explicit split path selects the
/// split layout with defaults for the rest; otherwise fall back on whether
/// the default bundle file is present.
fn choose_layout(
    bundle: Option<PathBuf>,
    crop: Option<PathBuf>,
    season: Option<PathBuf>,
    state: Option<PathBuf>,
    default_bundle_exists: bool,
) -> EncoderLayout {
    if let Some(path) = bundle {
        return EncoderLayout::Bundle(path);
    }
    if crop.is_some() || season.is_some() || state.is_some() {
        return EncoderLayout::Split {
            crop: crop.unwrap_or_else(|| DEFAULT_CROP_PATH.into()),
            season: season.unwrap_or_else(|| DEFAULT_SEASON_PATH.into()),
            state: state.unwrap_or_else(|| DEFAULT_STATE_PATH.into()),
        };
    }
    if default_bundle_exists {
        EncoderLayout::Bundle(DEFAULT_BUNDLE_PATH.into())
    } else {
        EncoderLayout::Split {
            crop: DEFAULT_CROP_PATH.into(),
            season: DEFAULT_SEASON_PATH.into(),
            state: DEFAULT_STATE_PATH.into(),
        }
    }
}
