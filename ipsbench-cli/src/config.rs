//! Configuration loading from ips.toml
//!
//! Benchmark binaries read an `ips.toml` from the project root. The file is
//! discovered by walking up from the current directory; command line flags
//! override whatever it sets.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name looked up by [`IpsConfigFile::discover`]
pub const CONFIG_FILE_NAME: &str = "ips.toml";

/// ipsbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IpsConfigFile {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Environment cleanup run before every warmup and measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CleanEnv {
    /// Leave the process alone (default)
    #[default]
    None,
    /// Return freed heap pages to the OS
    Trim,
}

impl std::str::FromStr for CleanEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(CleanEnv::None),
            "trim" => Ok(CleanEnv::Trim),
            other => Err(format!("unknown cleanup mode '{}' (expected none or trim)", other)),
        }
    }
}

/// Runner configuration for measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Measurement duration per item (e.g., "5s")
    #[serde(default = "default_time")]
    pub time: String,
    /// Warmup duration per item (e.g., "2s")
    #[serde(default = "default_warmup")]
    pub warmup: String,
    /// Suppress per-item progress lines
    #[serde(default)]
    pub quiet: bool,
    /// Print warmup and batch size diagnostics
    #[serde(default)]
    pub verbose: bool,
    /// Cleanup between phases: "none" or "trim"
    #[serde(default)]
    pub clean_env: CleanEnv,
    /// Pin the measuring thread to this CPU
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time: default_time(),
            warmup: default_warmup(),
            quiet: false,
            verbose: false,
            clean_env: CleanEnv::default(),
            pin_cpu: None,
        }
    }
}

fn default_time() -> String {
    "5s".to_string()
}
fn default_warmup() -> String {
    "2s".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Summary format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Write the summary to this file instead of stdout
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            file: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl IpsConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `dir` looking for [`CONFIG_FILE_NAME`]
    pub fn discover_from(dir: &Path) -> Option<Self> {
        let mut dir = dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("ignoring {}: {:#}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# ipsbench Configuration

[runner]
# Measurement duration per item
time = "5s"
# Warmup duration per item
warmup = "2s"
# Suppress per-item progress lines
quiet = false
# Print warmup and batch size diagnostics
verbose = false
# Cleanup before each timed phase: "none" or "trim"
clean_env = "none"
# Pin the measuring thread to a CPU (uncomment to enable)
# pin_cpu = 0

[output]
# Summary format: human or json
format = "human"
# Write the summary to a file (uncomment to enable)
# file = "target/ipsbench/report.json"
"#
        .to_string()
    }

    /// Measurement duration
    pub fn time(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.runner.time).context("runner.time")
    }

    /// Warmup duration
    pub fn warmup(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.runner.warmup).context("runner.warmup")
    }

    /// Parse duration string (e.g., "2s", "500ms", "1m"); a bare number is seconds
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be non-negative: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}
