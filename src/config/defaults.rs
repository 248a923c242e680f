//! Default values shared by the configuration file and the merge engine

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_OUTPUT_PATH: &str = "./data/epg.xml";
pub const DEFAULT_OVERRIDES_PATH: &str = "./data/mappings.json";
pub const DEFAULT_GENERATOR_NAME: &str = "epg-merger";

/// Title given to programmes whose source omits one
pub const DEFAULT_PROGRAMME_TITLE: &str = "Untitled";
/// Description given to programmes whose source omits one; empty means the
/// element is left out of the output
pub const DEFAULT_PROGRAMME_DESCRIPTION: &str = "";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FETCH_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_USER_AGENT: &str = concat!("epg-merger/", env!("CARGO_PKG_VERSION"));
