#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod utils;

// The scheduler engine
pub mod engine;

// Re-export commonly used types
pub use analysis::{AsyncScoringAdapter, ConfluenceScorer, ScoreOutcome, ScoringAdapter};
pub use config::{SchedulerConfig, SchedulerSettings};
pub use data::{InstrumentCatalog, RemoteCatalog, StaticCatalog, load_catalog};
pub use domain::{TrackedInstrument, WindowDescriptor, WindowId, WindowWidth};
pub use engine::{Command, Scheduler, SchedulerEvent, SchedulerHandle, spawn_scheduler};
pub use models::{SchedulerSnapshot, SignalRecord};
pub use utils::app_time;

use std::path::PathBuf;

use anyhow::Result;
// CLI argument parsing
use clap::Parser;

use config::{CATALOG, SCHEDULER};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Window width: 1m, 2m, 3m or 5m
    #[arg(long)]
    pub width: Option<String>,

    /// Minimum confidence (50-95) for a signal to be kept
    #[arg(long)]
    pub min_confidence: Option<i64>,

    /// Instruments to track, comma separated. Skips the catalog lookup.
    #[arg(long, value_delimiter = ',')]
    pub pairs: Vec<String>,

    /// JSON scheduler config; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the instrument catalog service
    #[arg(long, default_value_t = CATALOG.endpoints.base_url.to_string())]
    pub catalog_url: String,

    /// Never contact the catalog service; use the built-in list
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Instruments taken from the catalog when none are given
    #[arg(long, default_value_t = CATALOG.max_pairs)]
    pub max_pairs: usize,

    /// Start with analysis paused
    #[arg(long, default_value_t = false)]
    pub paused: bool,

    /// Seed for the demo scorer (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Config file (if any) with command-line overrides applied on top.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        let mut config = match &self.config {
            Some(path) => SchedulerConfig::load_from_path(path)?,
            None => SchedulerConfig::default(),
        };

        if let Some(width) = &self.width {
            config.window_width = width.clone();
        }
        if let Some(min_confidence) = self.min_confidence {
            config.min_confidence = min_confidence;
        }
        if !self.pairs.is_empty() {
            config.tracked_instruments = self
                .pairs
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(TrackedInstrument::new)
                .collect();
        }
        if self.paused {
            config.running = false;
        }
        Ok(config)
    }

    /// The catalog is only consulted when neither the file nor the flags name instruments.
    pub fn needs_catalog(config: &SchedulerConfig) -> bool {
        config.tracked_instruments.is_empty()
    }
}

/// One-line summary of the effective settings, logged at startup.
pub fn describe_settings(settings: &SchedulerSettings) -> String {
    format!(
        "{} windows | close ≤{}s | min confidence {}% | rotation {}s (tick {}ms)",
        settings.width,
        settings.close_policy.threshold_secs(),
        settings.min_confidence,
        settings.rotation_period.as_secs(),
        SCHEDULER.cadence.clock_tick_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "candle-pulse",
            "--width",
            "3m",
            "--min-confidence",
            "80",
            "--pairs",
            "EUR/USD OTC, GBP/JPY OTC",
            "--paused",
        ]);
        let config = cli.scheduler_config().unwrap();
        assert_eq!(config.window_width, "3m");
        assert_eq!(config.min_confidence, 80);
        assert!(!config.running);
        let names: Vec<&str> = config.tracked_instruments.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["EUR/USD OTC", "GBP/JPY OTC"]);
        assert!(!Cli::needs_catalog(&config));
    }

    #[test]
    fn bare_invocation_needs_catalog() {
        let cli = Cli::parse_from(["candle-pulse"]);
        assert_eq!(cli.catalog_url, "http://localhost:8000");
        assert_eq!(cli.max_pairs, 5);
        let config = cli.scheduler_config().unwrap();
        assert!(Cli::needs_catalog(&config));
        assert!(config.running);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["candle-pulse", "--config", "/nonexistent/scheduler.json"]);
        assert!(cli.scheduler_config().is_err());
    }
}
