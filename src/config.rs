use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::corpus::LoadOptions;
use crate::corpus::constants::DEFAULT_RECORD_EXTENSION;
use crate::search::FuzzySearchOptions;
use crate::search::config::{DEFAULT_FUZZY_DISTANCE, DEFAULT_TITLE_BOOST, MAX_FUZZY_DISTANCE};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Abort startup on the first bad record instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            extension: default_extension(),
            strict: false,
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_extension() -> String {
    DEFAULT_RECORD_EXTENSION.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8090".to_string()
}
fn default_request_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_fuzzy_distance")]
    pub fuzzy_distance: u8,
    #[serde(default = "default_title_boost")]
    pub title_boost: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_distance: default_fuzzy_distance(),
            title_boost: default_title_boost(),
        }
    }
}

fn default_fuzzy_distance() -> u8 {
    DEFAULT_FUZZY_DISTANCE
}
fn default_title_boost() -> f32 {
    DEFAULT_TITLE_BOOST
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.corpus.extension.is_empty() {
            bail!("corpus.extension must not be empty");
        }
        if self.corpus.extension.starts_with('.') {
            bail!(
                "corpus.extension must not start with a dot (use '{}')",
                self.corpus.extension.trim_start_matches('.')
            );
        }
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be > 0");
        }
        if self.search.fuzzy_distance > MAX_FUZZY_DISTANCE {
            bail!("search.fuzzy_distance must be between 0 and {}", MAX_FUZZY_DISTANCE);
        }
        if !(self.search.title_boost > 0.0 && self.search.title_boost.is_finite()) {
            bail!("search.title_boost must be a positive number");
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            extension: self.corpus.extension.clone(),
            strict: self.corpus.strict,
        }
    }

    pub fn search_options(&self) -> FuzzySearchOptions {
        FuzzySearchOptions {
            fuzzy_distance: self.search.fuzzy_distance,
            title_boost: self.search.title_boost,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
