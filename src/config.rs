use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AssetScanError, AssetScanResult};

const CONFIG_FILE: &str = "assetscan.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds of video between two sampled frames.
    #[serde(default = "default_interval")]
    pub interval_seconds: f64,
    /// Directory receiving `frame_<offset>.jpg` files. Created if absent.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            output_dir: default_output_dir(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Full chat-completions endpoint URL.
    #[serde(default = "default_vision_api_base")]
    pub api_base: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Use SSE streaming for the single extraction call.
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_vision_timeout")]
    pub timeout_secs: u64,
    /// "low", "high" or "auto". Omitted from the request when unset.
    #[serde(default)]
    pub image_detail: Option<String>,
    /// Falls back to env var ASSETSCAN_VISION_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_base: default_vision_api_base(),
            model: default_vision_model(),
            temperature: default_temperature(),
            stream: false,
            timeout_secs: default_vision_timeout(),
            image_detail: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_api_base")]
    pub api_base: String,
    /// Result engine selector passed as `engine`.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_hl")]
    pub hl: String,
    /// Maximum number of price lookups in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
    /// Falls back to env var ASSETSCAN_SEARCH_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_search_api_base(),
            engine: default_engine(),
            location: default_location(),
            hl: default_hl(),
            concurrency: default_concurrency(),
            timeout_secs: default_search_timeout(),
            api_key: None,
        }
    }
}

fn default_interval() -> f64 {
    2.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./videoFrames")
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_vision_api_base() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_vision_timeout() -> u64 {
    120
}

fn default_search_api_base() -> String {
    "https://serpapi.com/search".to_string()
}

fn default_engine() -> String {
    "amazon".to_string()
}

fn default_location() -> String {
    "United States".to_string()
}

fn default_hl() -> String {
    "en".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_search_timeout() -> u64 {
    30
}

impl AppConfig {
    pub fn validate(&self) -> AssetScanResult<()> {
        let interval = self.sampling.interval_seconds;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(AssetScanError::Config(format!(
                "sampling.interval_seconds must be a positive number, got {interval}"
            )));
        }
        if self.search.concurrency == 0 {
            return Err(AssetScanError::Config(
                "search.concurrency must be at least 1".into(),
            ));
        }
        if self.sampling.jpeg_quality == 0 || self.sampling.jpeg_quality > 100 {
            return Err(AssetScanError::Config(
                "sampling.jpeg_quality must be within 1..=100".into(),
            ));
        }
        Ok(())
    }

    /// Vision API key: environment first, then the config file.
    pub fn vision_api_key(&self) -> String {
        std::env::var("ASSETSCAN_VISION_API_KEY")
            .ok()
            .or_else(|| self.vision.api_key.clone())
            .unwrap_or_default()
    }

    /// Search API key: environment first, then the config file.
    pub fn search_api_key(&self) -> String {
        std::env::var("ASSETSCAN_SEARCH_API_KEY")
            .ok()
            .or_else(|| self.search.api_key.clone())
            .unwrap_or_default()
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("assetscan").join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Some(candidate);
        }
    }

    None
}

pub fn load_config_from(path: &Path) -> AssetScanResult<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AssetScanError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!(path = %path.display(), model = %config.vision.model, "config loaded");
    Ok(config)
}

/// Loads the config from `explicit` if given, otherwise from the first standard
/// location that exists. Falls back to defaults when no file is found.
pub fn load_config(explicit: Option<&Path>) -> AssetScanResult<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    match resolve_config_path() {
        Some(path) => load_config_from(&path),
        None => {
            tracing::info!("no {CONFIG_FILE} found; using built-in defaults");
            Ok(AppConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [sampling]
            interval_seconds = 5.0

            [search]
            engine = "google_shopping"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sampling.interval_seconds, 5.0);
        assert_eq!(cfg.sampling.output_dir, PathBuf::from("./videoFrames"));
        assert_eq!(cfg.search.engine, "google_shopping");
        assert_eq!(cfg.search.location, "United States");
        assert_eq!(cfg.search.hl, "en");
        assert_eq!(cfg.vision.model, "gpt-4o-mini");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_interval() {
        let mut cfg = AppConfig::default();
        cfg.sampling.interval_seconds = 0.0;
        assert!(matches!(cfg.validate(), Err(AssetScanError::Config(_))));
        cfg.sampling.interval_seconds = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut cfg = AppConfig::default();
        cfg.search.concurrency = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[vision]\nmodel = \"gpt-4o\"\n").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.vision.model, "gpt-4o");
    }

    #[test]
    fn missing_explicit_path_is_a_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/assetscan.toml"))).unwrap_err();
        assert!(matches!(err, AssetScanError::Config(_)));
    }
}
