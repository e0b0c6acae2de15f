use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "assetscan")]
#[command(about = "Turn a walkthrough video into a priced asset inventory", long_about = None)]
pub struct Cli {
    /// Walkthrough video to analyze
    pub video: PathBuf,

    /// Config file (defaults to assetscan.toml in the usual locations)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between sampled frames
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Directory for sampled frame images
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write the full run report as JSON to this path
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Replay a saved vision response instead of calling the model
    #[arg(long)]
    pub vision_response: Option<PathBuf>,
}

impl Cli {
    /// Command-line values take precedence over the config file.
    pub fn apply_overrides(&self, cfg: &mut AppConfig) {
        if let Some(interval) = self.interval {
            cfg.sampling.interval_seconds = interval;
        }
        if let Some(dir) = &self.output_dir {
            cfg.sampling.output_dir = dir.clone();
        }
    }
}
