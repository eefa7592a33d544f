use anyhow::{Context, Result};
use reel_core::MotionConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Configuration for a single reel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Motion parameters applied to every spin
    #[serde(default)]
    pub motion: MotionConfig,

    /// Symbols printed on the reel
    #[serde(default)]
    pub reel: ReelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelConfig {
    /// Items in display order
    #[serde(default = "default_items")]
    pub items: Vec<String>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            items: default_items(),
        }
    }
}

fn default_items() -> Vec<String> {
    ["cherry", "lemon", "orange", "plum", "bell", "bar", "seven"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from a file, auto-detecting TOML or JSON format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content).or_else(|_| Self::from_json(&content)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config as TOML")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse config as JSON")
    }

    pub fn validate(&self) -> Result<()> {
        if self.reel.items.is_empty() {
            anyhow::bail!("reel.items cannot be empty");
        }
        if let Some(idx) = self.reel.items.iter().position(|item| item.trim().is_empty()) {
            anyhow::bail!("reel.items[{idx}] cannot be blank");
        }
        self.motion.validate().context("invalid [motion] section")?;
        Ok(())
    }
}
