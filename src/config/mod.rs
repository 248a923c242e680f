use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use crate::merge::{AllowListConfig, MergeConfig, NameOverrides, ProgrammeDefaults};
use crate::models::SourceConfig;
use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    #[serde(default)]
    pub programmes: ProgrammeConfig,
    #[serde(default)]
    pub overrides: OverridesConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub generator_info_name: Option<String>,
    pub generator_info_url: Option<String>,
    /// Where the JSON run report is written, if anywhere
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeConfig {
    pub default_title: String,
    pub default_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverridesConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            generator_info_name: Some(DEFAULT_GENERATOR_NAME.to_string()),
            generator_info_url: None,
            report_path: None,
        }
    }
}

impl Default for ProgrammeConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_PROGRAMME_TITLE.to_string(),
            default_description: DEFAULT_PROGRAMME_DESCRIPTION.to_string(),
        }
    }
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_OVERRIDES_PATH)),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            retries: DEFAULT_FETCH_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            programmes: ProgrammeConfig::default(),
            overrides: OverridesConfig::default(),
            fetch: FetchConfig::default(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration, writing a default file when none exists
    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();

        if config_file.exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            if let Some(parent) = config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(config_file, contents)?;
            info!("Wrote default configuration to {}", config_file.display());
            Ok(default_config)
        }
    }

    /// Per-source allow-lists keyed by source identity
    ///
    /// Sources without an `allow_channels` entry stay unrestricted.
    pub fn allow_lists(&self) -> AllowListConfig {
        let mut allow_lists = AllowListConfig::new();
        for source in &self.sources {
            if !source.allow_channels.is_empty() {
                allow_lists.insert(source.identity(), source.allow_channels.iter().cloned());
            }
        }
        allow_lists
    }

    pub fn programme_defaults(&self) -> ProgrammeDefaults {
        ProgrammeDefaults {
            title: self.programmes.default_title.clone(),
            description: self.programmes.default_description.clone(),
        }
    }

    /// Build the engine configuration for one run
    pub fn merge_config(&self, overrides: NameOverrides) -> MergeConfig {
        MergeConfig {
            allow_lists: self.allow_lists(),
            overrides,
            defaults: self.programme_defaults(),
        }
    }
}
