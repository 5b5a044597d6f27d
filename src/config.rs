use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Collection interval in minutes
    #[serde(default = "default_collect_interval")]
    pub collect_interval: u64,
    pub regions: Vec<RegionConfig>,
}

fn default_collect_interval() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionConfig {
    pub name: String,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn total_sources(&self) -> usize {
        self.regions.iter().map(|r| r.sources.len()).sum()
    }

    pub fn region_by_slug(&self, slug: &str) -> Option<&RegionConfig> {
        let slug = slug.to_lowercase();
        self.regions.iter().find(|r| r.slug() == slug)
    }
}

impl RegionConfig {
    /// URL identifier derived from the display name: lowercased, spaces
    /// become dashes, apostrophes are dropped.
    pub fn slug(&self) -> String {
        self.name.to_lowercase().replace(' ', "-").replace('\'', "")
    }
}
