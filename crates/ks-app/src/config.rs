use std::env;
use std::path::PathBuf;
use std::time::Duration;
use ks_core::VideoModel;
use ks_genai::gemini::DEFAULT_BASE_URL;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: VideoModel,
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub catalog_path: Option<PathBuf>,
    pub artifact_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_BASE_URL.to_string(),
            model: VideoModel::default(),
            poll_interval: Duration::from_secs(5),
            tick_interval: Duration::from_millis(2000),
            catalog_path: None,
            artifact_dir: env::temp_dir().join("kinoscope"),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env is fine; everything has a default.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let model = match var("KS_MODEL") {
            Some(id) => VideoModel::from_id(&id).ok_or(AppError::Config {
                key: "KS_MODEL",
                value: id,
            })?,
            None => defaults.model,
        };

        Ok(Self {
            api_key: var("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: var("KS_API_BASE").unwrap_or(defaults.api_base),
            model,
            poll_interval: parse_duration(&var, "KS_POLL_INTERVAL_SECS", Duration::from_secs)?
                .unwrap_or(defaults.poll_interval),
            tick_interval: parse_duration(&var, "KS_TICK_INTERVAL_MS", Duration::from_millis)?
                .unwrap_or(defaults.tick_interval),
            catalog_path: var("KS_CATALOG").map(PathBuf::from),
            artifact_dir: var("KS_ARTIFACT_DIR").map(PathBuf::from).unwrap_or(defaults.artifact_dir),
        })
    }
}

fn parse_duration(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>, AppError> {
    let Some(value) = var(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(unit(n))),
        _ => Err(AppError::Config { key, value }),
    }
}
