use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetScanError {
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Video source reports no usable frame rate")]
    UnknownFrameRate,

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("Vision capability returned no content: {0}")]
    EmptyCapabilityResponse(String),

    #[error("Malformed vision response: {0}")]
    MalformedResponse(String),

    #[error("Search backend unavailable: {0}")]
    SearchBackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("SSE parsing error: {0}")]
    SseParsing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Run cancelled")]
    Cancelled,
}

impl AssetScanError {
    /// Whether the error aborts the whole run rather than a single asset lookup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AssetScanError::SearchBackendUnavailable(_))
    }
}

impl serde::Serialize for AssetScanError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type AssetScanResult<T> = Result<T, AssetScanError>;
