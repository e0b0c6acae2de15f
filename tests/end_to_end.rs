use std::sync::Arc;

use assetscan_lib::config::AppConfig;
use assetscan_lib::enricher::{
    Confidence, LookupStatus, ScriptedSearch, SearchResponse, SearchResult,
};
use assetscan_lib::errors::AssetScanResult;
use assetscan_lib::extractor::ScriptedRecognizer;
use assetscan_lib::pipeline::{Pipeline, RunStatus};
use assetscan_lib::sampler::synthetic::SyntheticSource;
use assetscan_lib::sampler::traits::VideoSource;
use assetscan_lib::sampler::FrameSampler;
use tokio::sync::watch;

const LAMP: &str =
    r#"[{"assetType":"Lamp","category":"Electronics","subCategory":"Other","color":"Black"}]"#;

fn thirty_second_clip() -> AssetScanResult<Box<dyn VideoSource>> {
    Ok(Box::new(SyntheticSource::with_duration(30.0, 30.0)))
}

fn config(dir: &tempfile::TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.sampling.interval_seconds = 2.0;
    cfg.sampling.output_dir = dir.path().join("videoFrames");
    cfg
}

#[test]
fn sampler_yields_fifteen_frames_sixty_apart() {
    let dir = tempfile::tempdir().unwrap();
    let sampler = FrameSampler::new(2.0, dir.path().join("videoFrames"));
    let out = sampler
        .sample(&mut SyntheticSource::with_duration(30.0, 30.0))
        .unwrap();
    let expected: Vec<u64> = (0..15).map(|k| k * 60).collect();
    assert_eq!(out.offsets(), expected);
    assert!(dir.path().join("videoFrames").join("frame_840.jpg").exists());
}

#[tokio::test]
async fn lamp_walkthrough_is_priced_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let search = ScriptedSearch::new().respond(
        "Black Lamp",
        SearchResponse::with_results(vec![SearchResult::priced("$45.00", Some("USD"))]),
    );
    let pipeline = Pipeline::from_config(
        &config(&dir),
        Arc::new(ScriptedRecognizer::new(LAMP)),
        Arc::new(search),
    );

    let (_tx, rx) = watch::channel(false);
    let report = pipeline
        .run_with_source("lamp.mov".into(), thirty_second_clip, rx)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.frames_sampled, 15);
    assert_eq!(report.assets_identified, 1);
    assert_eq!(report.priced_assets.len(), 1);

    let lamp = &report.priced_assets[0];
    assert_eq!(lamp.asset.asset_type, "Lamp");
    assert_eq!(lamp.estimated_price.as_deref(), Some("$45.00"));
    assert_eq!(lamp.currency.as_deref(), Some("USD"));
    assert_eq!(lamp.confidence, Confidence::High);

    let json = serde_json::to_value(&report.priced_assets).unwrap();
    assert_eq!(json[0]["estimatedPrice"], "$45.00");
    assert_eq!(json[0]["confidence"], "High");
}

#[tokio::test]
async fn failed_middle_lookup_keeps_order_and_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let vision = r#"[
        {"assetType":"Lamp","category":"Electronics","subCategory":"Other","color":"Black"},
        {"assetType":"Washing Machine","category":"Appliances","subCategory":"Laundry","color":"White"},
        {"assetType":"Bookshelf","category":"Furniture","subCategory":"Storage","color":"Walnut",
         "description":"Walnut five-tier bookshelf"}
    ]"#;
    let search = ScriptedSearch::new()
        .respond(
            "Black Lamp",
            SearchResponse::with_results(vec![SearchResult::priced("$45.00", Some("USD"))]),
        )
        .fail("White Laundry Washing Machine", "connection reset")
        .respond(
            "Walnut five-tier bookshelf",
            SearchResponse::with_results(vec![SearchResult::priced("$129.99", None)]),
        );
    let pipeline = Pipeline::from_config(
        &config(&dir),
        Arc::new(ScriptedRecognizer::new(vision)),
        Arc::new(search),
    );

    let (_tx, rx) = watch::channel(false);
    let report = pipeline
        .run_with_source("house.mov".into(), thirty_second_clip, rx)
        .await
        .unwrap();

    let types: Vec<&str> = report
        .priced_assets
        .iter()
        .map(|p| p.asset.asset_type.as_str())
        .collect();
    assert_eq!(types, vec!["Lamp", "Washing Machine", "Bookshelf"]);

    let middle = &report.priced_assets[1];
    assert_eq!(middle.estimated_price, None);
    assert_eq!(middle.confidence, Confidence::Low);
    assert_eq!(middle.lookup, LookupStatus::Failed);

    assert_eq!(report.priced_assets[2].estimated_price.as_deref(), Some("$129.99"));
    assert_eq!(report.priced_assets[2].currency.as_deref(), Some("USD"));
    assert_eq!(report.lookup_failed, 1);
    assert_eq!(report.priced, 2);
}
