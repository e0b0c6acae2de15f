//! Asset extraction: one vision call over all sampled frames, then parsing and
//! consolidation of the returned asset list.
pub mod consolidate;
pub mod parse;
pub mod prompt;
pub mod recognizer;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::sampler::Frame;

pub use recognizer::{AssetRecognizer, ScriptedRecognizer, VisionRecognizer};
pub use types::{Asset, AssetCategory};

pub struct AssetExtractor {
    recognizer: Arc<dyn AssetRecognizer>,
    timeout: Duration,
}

impl AssetExtractor {
    pub fn new(recognizer: Arc<dyn AssetRecognizer>, timeout: Duration) -> Self {
        Self {
            recognizer,
            timeout,
        }
    }

    /// Consumes the sampled frames and returns the deduplicated asset list.
    ///
    /// A timed-out or empty recognizer response is `EmptyCapabilityResponse`;
    /// an unparseable one is `MalformedResponse`. An empty JSON array is a
    /// valid "nothing found" result.
    pub async fn extract(&self, frames: Vec<Frame>) -> AssetScanResult<Vec<Asset>> {
        if frames.is_empty() {
            return Err(AssetScanError::Config(
                "asset extraction needs at least one frame".into(),
            ));
        }

        tracing::info!(
            recognizer = self.recognizer.name(),
            frames = frames.len(),
            timeout_secs = self.timeout.as_secs(),
            "sending frames for asset recognition"
        );

        let raw = match tokio::time::timeout(self.timeout, self.recognizer.recognize(&frames)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AssetScanError::EmptyCapabilityResponse(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )))
            }
        };
        drop(frames);

        let parsed = parse::parse_assets(&raw)?;
        let parsed_count = parsed.len();
        let mut assets = consolidate::consolidate(parsed);
        for asset in &mut assets {
            asset.ensure_description();
        }
        if assets.len() < parsed_count {
            tracing::info!(
                before = parsed_count,
                after = assets.len(),
                "merged duplicate asset sightings"
            );
        }
        tracing::info!(assets = assets.len(), "assets identified");
        Ok(assets)
    }
}
