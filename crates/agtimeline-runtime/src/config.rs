use crate::{Error, Result};
use agtimeline_engine::{CompressionConfig, DEFAULT_OVERSCAN, VIRTUALIZATION_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolve the config file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. AGTIMELINE_PATH environment variable (directory, with tilde expansion)
/// 3. XDG config directory
/// 4. ~/.agtimeline (fallback for systems without XDG)
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("AGTIMELINE_PATH") {
        return Ok(expand_tilde(&env_path).join("config.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("agtimeline").join("config.toml"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".agtimeline").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no HOME directory or XDG config directory found"
            .to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    pub window_ms: i64,
    pub initial_loaded: usize,
    pub load_step: usize,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            window_ms: agtimeline_engine::DEFAULT_SEGMENT_WINDOW_MS,
            initial_loaded: 3,
            load_step: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub enabled: bool,
    pub run_burst_threshold: usize,
    pub dense_threshold: usize,
    pub dense_window_ms: i64,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        let thresholds = CompressionConfig::default();
        Self {
            enabled: true,
            run_burst_threshold: thresholds.run_burst_threshold,
            dense_threshold: thresholds.dense_threshold,
            dense_window_ms: thresholds.dense_window_ms,
        }
    }
}

impl CompressionSettings {
    pub fn thresholds(&self) -> CompressionConfig {
        CompressionConfig {
            run_burst_threshold: self.run_burst_threshold,
            dense_threshold: self.dense_threshold,
            dense_window_ms: self.dense_window_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    pub tick_ms: u64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self { tick_ms: 800 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualizationSettings {
    pub item_height: f64,
    pub overscan: usize,
    /// Lanes with more items than this are virtualized
    pub threshold: usize,
}

impl Default for VirtualizationSettings {
    fn default() -> Self {
        Self {
            item_height: 72.0,
            overscan: DEFAULT_OVERSCAN,
            threshold: VIRTUALIZATION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_interval_ms: 30_000,
            timeout_ms: 1_500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub segments: SegmentSettings,
    pub compression: CompressionSettings,
    pub replay: ReplaySettings,
    pub virtualization: VirtualizationSettings,
    pub poller: PollerSettings,
}

impl TimelineConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TimelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        resolve_config_path(None)
    }

    /// Reject values no component can work with; soft limits are clamped by the engine.
    pub fn validate(&self) -> Result<()> {
        if self.segments.window_ms <= 0 {
            return Err(Error::Config(format!(
                "segments.window_ms must be positive, got {}",
                self.segments.window_ms
            )));
        }
        if self.replay.tick_ms == 0 {
            return Err(Error::Config("replay.tick_ms must be positive".to_string()));
        }
        if self.poller.interval_ms == 0 {
            return Err(Error::Config("poller.interval_ms must be positive".to_string()));
        }
        if self.poller.max_interval_ms < self.poller.interval_ms {
            return Err(Error::Config(format!(
                "poller.max_interval_ms ({}) is below poller.interval_ms ({})",
                self.poller.max_interval_ms, self.poller.interval_ms
            )));
        }
        Ok(())
    }
}
