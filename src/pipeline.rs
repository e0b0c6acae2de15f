//! Runs sampler, extractor and enricher strictly in that order and reports
//! the outcome of the run.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::enricher::{LookupStatus, PriceEnricher, PricedAsset, ProductSearch};
use crate::errors::{AssetScanError, AssetScanResult};
use crate::extractor::{AssetExtractor, AssetRecognizer};
use crate::sampler::ffmpeg_source::FfmpegSource;
use crate::sampler::traits::VideoSource;
use crate::sampler::FrameSampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// The video decoded no frames; nothing was sent for extraction.
    NoFrames,
    /// Price lookups were interrupted; `priced_assets` holds the completed prefix.
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub video: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub frames_sampled: usize,
    pub assets_identified: usize,
    pub priced: usize,
    pub no_price: usize,
    pub lookup_failed: usize,
    pub priced_assets: Vec<PricedAsset>,
}

impl RunReport {
    fn new(video: String, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            video,
            started_at,
            finished_at: started_at,
            status: RunStatus::Completed,
            frames_sampled: 0,
            assets_identified: 0,
            priced: 0,
            no_price: 0,
            lookup_failed: 0,
            priced_assets: Vec::new(),
        }
    }

    fn finish(mut self, status: RunStatus, priced_assets: Vec<PricedAsset>) -> Self {
        let count = |status: LookupStatus| priced_assets.iter().filter(|p| p.lookup == status).count();
        self.priced = count(LookupStatus::Priced);
        self.no_price = count(LookupStatus::NoPrice);
        self.lookup_failed = count(LookupStatus::Failed);
        self.priced_assets = priced_assets;
        self.status = status;
        self.finished_at = Utc::now();
        self
    }

    /// Logs the per-run and per-asset outcome.
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            status = ?self.status,
            frames = self.frames_sampled,
            assets = self.assets_identified,
            priced = self.priced,
            no_price = self.no_price,
            failed = self.lookup_failed,
            "run finished"
        );
        for (i, item) in self.priced_assets.iter().enumerate() {
            let asset = &item.asset;
            match item.lookup {
                LookupStatus::Priced => tracing::info!(
                    index = i,
                    asset = %asset.asset_type,
                    price = item.estimated_price.as_deref().unwrap_or_default(),
                    currency = item.currency.as_deref().unwrap_or_default(),
                    "price found"
                ),
                LookupStatus::NoPrice => {
                    tracing::info!(index = i, asset = %asset.asset_type, "no price found")
                }
                LookupStatus::Failed => tracing::warn!(
                    index = i,
                    asset = %asset.asset_type,
                    error = item.error.as_deref().unwrap_or_default(),
                    "price lookup failed"
                ),
            }
        }
    }

    pub fn write_json(&self, path: &Path) -> AssetScanResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "run report written");
        Ok(())
    }
}

pub struct Pipeline {
    sampler: Arc<FrameSampler>,
    extractor: AssetExtractor,
    enricher: PriceEnricher,
}

impl Pipeline {
    pub fn new(sampler: FrameSampler, extractor: AssetExtractor, enricher: PriceEnricher) -> Self {
        Self {
            sampler: Arc::new(sampler),
            extractor,
            enricher,
        }
    }

    /// Wires the stages from configuration around the given capabilities.
    pub fn from_config(
        cfg: &AppConfig,
        recognizer: Arc<dyn AssetRecognizer>,
        search: Arc<dyn ProductSearch>,
    ) -> Self {
        let sampler = FrameSampler::new(cfg.sampling.interval_seconds, cfg.sampling.output_dir.clone())
            .with_jpeg_quality(cfg.sampling.jpeg_quality);
        let extractor =
            AssetExtractor::new(recognizer, Duration::from_secs(cfg.vision.timeout_secs));
        let enricher = PriceEnricher::new(search)
            .with_concurrency(cfg.search.concurrency)
            .with_query_timeout(Duration::from_secs(cfg.search.timeout_secs));
        Self::new(sampler, extractor, enricher)
    }

    /// Runs the pipeline on a video file decoded with FFmpeg.
    pub async fn run(&self, video: &Path, cancel: watch::Receiver<bool>) -> AssetScanResult<RunReport> {
        let path: PathBuf = video.to_path_buf();
        self.run_with_source(
            video.display().to_string(),
            move || Ok(Box::new(FfmpegSource::open(&path)?) as Box<dyn VideoSource>),
            cancel,
        )
        .await
    }

    /// Runs the pipeline on the source produced by `open`. The source is
    /// opened and decoded on a blocking thread.
    pub async fn run_with_source<F>(
        &self,
        label: String,
        open: F,
        mut cancel: watch::Receiver<bool>,
    ) -> AssetScanResult<RunReport>
    where
        F: FnOnce() -> AssetScanResult<Box<dyn VideoSource>> + Send + 'static,
    {
        let mut report = RunReport::new(label, Utc::now());
        tracing::info!(run_id = %report.run_id, video = %report.video, "starting run");

        let sampler = self.sampler.clone();
        let sampled = tokio::task::spawn_blocking(move || {
            let mut source = open()?;
            sampler.sample(source.as_mut())
        })
        .await
        .map_err(|e| AssetScanError::Decode(format!("sampling task failed: {e}")))??;

        report.frames_sampled = sampled.count();
        if sampled.is_empty() {
            tracing::warn!("no frames sampled; stopping before extraction");
            return Ok(report.finish(RunStatus::NoFrames, Vec::new()));
        }
        if *cancel.borrow() {
            return Err(AssetScanError::Cancelled);
        }

        let assets = tokio::select! {
            assets = self.extractor.extract(sampled.frames) => assets?,
            _ = wait_cancelled(&mut cancel) => return Err(AssetScanError::Cancelled),
        };
        report.assets_identified = assets.len();

        let enrichment = self.enricher.enrich_until(assets, cancel).await;
        let status = if enrichment.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        Ok(report.finish(status, enrichment.priced))
    }
}

/// Resolves once `cancel` reads `true`. Pends forever if the sender is gone.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enricher::{Confidence, ScriptedSearch, SearchResponse, SearchResult};
    use crate::extractor::ScriptedRecognizer;
    use crate::sampler::synthetic::SyntheticSource;

    fn pipeline(dir: &tempfile::TempDir, vision: &str, search: ScriptedSearch) -> Pipeline {
        let mut cfg = AppConfig::default();
        cfg.sampling.output_dir = dir.path().join("frames");
        Pipeline::from_config(&cfg, Arc::new(ScriptedRecognizer::new(vision)), Arc::new(search))
    }

    fn synthetic(fps: Option<f64>, frames: u64) -> impl FnOnce() -> AssetScanResult<Box<dyn VideoSource>> {
        move || Ok(Box::new(SyntheticSource::new(fps, frames, 16, 16)) as Box<dyn VideoSource>)
    }

    #[tokio::test]
    async fn empty_video_stops_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        // Would be malformed if it were ever parsed.
        let p = pipeline(&dir, "not json", ScriptedSearch::new());
        let (_tx, rx) = watch::channel(false);
        let report = p.run_with_source("empty".into(), synthetic(Some(30.0), 0), rx).await.unwrap();
        assert_eq!(report.status, RunStatus::NoFrames);
        assert_eq!(report.frames_sampled, 0);
        assert!(report.priced_assets.is_empty());
    }

    #[tokio::test]
    async fn unknown_frame_rate_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, "[]", ScriptedSearch::new());
        let (_tx, rx) = watch::channel(false);
        let err = p.run_with_source("nofps".into(), synthetic(None, 100), rx).await.unwrap_err();
        assert!(matches!(err, AssetScanError::UnknownFrameRate));
    }

    #[tokio::test]
    async fn malformed_vision_response_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, "{\"oops\": true}", ScriptedSearch::new());
        let (_tx, rx) = watch::channel(false);
        let err = p.run_with_source("v".into(), synthetic(Some(30.0), 90), rx).await.unwrap_err();
        assert!(matches!(err, AssetScanError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_video_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, "[]", ScriptedSearch::new());
        let (_tx, rx) = watch::channel(false);
        let err = p.run(Path::new("/nonexistent/house.mov"), rx).await.unwrap_err();
        assert!(matches!(err, AssetScanError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn report_counts_each_lookup_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let vision = r#"[
            {"assetType":"Lamp","category":"Electronics","subCategory":"Other","color":"Black"},
            {"assetType":"Sofa","category":"Furniture","subCategory":"Other","color":"Brown"},
            {"assetType":"Globe","category":"Valuables","subCategory":"Other","color":"Green"}
        ]"#;
        let search = ScriptedSearch::new()
            .respond(
                "Black Lamp",
                SearchResponse::with_results(vec![SearchResult::priced("$45.00", Some("USD"))]),
            )
            .fail("Brown Sofa", "503 Service Unavailable");
        let p = pipeline(&dir, vision, search);
        let (_tx, rx) = watch::channel(false);
        let report = p.run_with_source("v".into(), synthetic(Some(30.0), 300), rx).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.frames_sampled, 5);
        assert_eq!(report.assets_identified, 3);
        assert_eq!((report.priced, report.no_price, report.lookup_failed), (1, 1, 1));
        assert_eq!(report.priced_assets[0].confidence, Confidence::High);
        assert_eq!(report.priced_assets[1].lookup, LookupStatus::Failed);
        assert_eq!(report.priced_assets[2].lookup, LookupStatus::NoPrice);

        let path = dir.path().join("out").join("report.json");
        report.write_json(&path).unwrap();
        let back: RunReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.priced_assets, report.priced_assets);
    }
}
