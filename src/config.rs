//! Layered settings: built-in defaults, an optional TOML file, then
//! `QUEUEWATCH_*` environment variables.
//!
//! ```toml
//! [sampling]
//! max_samples = 720
//! min_interval_ms = 10000
//!
//! [window]
//! default = "1h"
//! max_points = 60
//!
//! [poll]
//! min_interval_secs = 5
//! max_interval_secs = 90
//!
//! [thresholds]
//! failed_warning = 1
//! failed_critical = 10
//! ```
//!
//! Environment variables use `__` between sections, e.g.
//! `QUEUEWATCH_WINDOW__DEFAULT=6h`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::{Thresholds, WindowRange, DEFAULT_MAX_POINTS, MAX_SAMPLES, MIN_SAMPLE_INTERVAL_MS};
use crate::source::Cadence;

/// All recognised settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sampling: SamplingSettings,
    pub window: WindowSettings,
    pub poll: PollSettings,
    pub thresholds: Thresholds,
}

/// Sample buffer limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub max_samples: usize,
    pub min_interval_ms: u64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            max_samples: MAX_SAMPLES,
            min_interval_ms: MIN_SAMPLE_INTERVAL_MS,
        }
    }
}

/// Initial window and sparkline resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Initial window range ("15m", "1h", "6h", "24h", "7d" or any duration).
    pub default: String,
    /// Points per sparkline.
    pub max_points: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            default: WindowRange::default().label(),
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

/// Bounds for the adaptive poll interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        let cadence = Cadence::default();
        Self {
            min_interval_secs: cadence.min().as_secs(),
            max_interval_secs: cadence.max().as_secs(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("QUEUEWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to load settings")?;

        config.try_deserialize().context("invalid settings")
    }

    /// The configured initial window range.
    pub fn window_range(&self) -> Result<WindowRange> {
        self.window
            .default
            .parse()
            .with_context(|| format!("invalid window.default `{}`", self.window.default))
    }

    /// The configured poll cadence.
    pub fn cadence(&self) -> Cadence {
        Cadence::new(
            Duration::from_secs(self.poll.min_interval_secs),
            Duration::from_secs(self.poll.max_interval_secs),
        )
    }
}
