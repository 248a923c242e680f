//! EPG source configuration model with fetch window expansion

use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder substituted with the window's unix timestamp
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Wire format a source is delivered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    #[default]
    Xmltv,
    GridJson,
    TubiJson,
}

/// Repeated, time-shifted fetches of one feed
///
/// A feed that only serves a few hours per request is fetched `count` times
/// with the base timestamp advanced by `interval_secs` each time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchWindows {
    pub count: u32,
    pub interval_secs: u64,
}

/// One configured EPG source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Source identity; defaults to `location`
    pub name: Option<String>,
    /// http(s) URL or local file path
    pub location: String,
    #[serde(default)]
    pub format: SourceFormat,
    /// Permitted channel ids; absent or empty means unrestricted
    #[serde(default)]
    pub allow_channels: Vec<String>,
    pub windows: Option<FetchWindows>,
}

impl SourceConfig {
    pub fn new<S: Into<String>>(location: S, format: SourceFormat) -> Self {
        Self {
            name: None,
            location: location.into(),
            format,
            allow_channels: Vec::new(),
            windows: None,
        }
    }

    /// Identity used for allow-list lookup and reporting
    pub fn identity(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.location)
    }

    /// Whether the location is fetched over HTTP rather than read from disk
    pub fn is_remote(&self) -> bool {
        Url::parse(&self.location)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Expand the location into one concrete location per fetch
    ///
    /// Without `windows` (or with a zero count) this is the location itself.
    pub fn fetch_locations(&self, base_timestamp: i64) -> Vec<String> {
        match &self.windows {
            Some(windows) if windows.count > 0 => (0..windows.count)
                .map(|i| {
                    let ts = base_timestamp + i as i64 * windows.interval_secs as i64;
                    self.location
                        .replace(TIMESTAMP_PLACEHOLDER, &ts.to_string())
                })
                .collect(),
            _ => vec![self
                .location
                .replace(TIMESTAMP_PLACEHOLDER, &base_timestamp.to_string())],
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Xmltv => write!(f, "xmltv"),
            SourceFormat::GridJson => write!(f, "grid_json"),
            SourceFormat::TubiJson => write!(f, "tubi_json"),
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "xmltv" => Ok(SourceFormat::Xmltv),
            "grid_json" | "grid" => Ok(SourceFormat::GridJson),
            "tubi_json" | "tubi" => Ok(SourceFormat::TubiJson),
            _ => Err(anyhow::anyhow!("Invalid EPG source format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_defaults_to_location() {
        let mut source = SourceConfig::new("https://example.com/epg.xml", SourceFormat::Xmltv);
        assert_eq!(source.identity(), "https://example.com/epg.xml");

        source.name = Some("example".to_string());
        assert_eq!(source.identity(), "example");
    }

    #[test]
    fn test_is_remote() {
        assert!(SourceConfig::new("https://example.com/epg.xml", SourceFormat::Xmltv).is_remote());
        assert!(SourceConfig::new("http://example.com/epg.xml", SourceFormat::Xmltv).is_remote());
        assert!(!SourceConfig::new("./data/epg.xml", SourceFormat::Xmltv).is_remote());
        assert!(!SourceConfig::new("/tmp/epg.xml", SourceFormat::Xmltv).is_remote());
    }

    #[test]
    fn test_fetch_locations_windows() {
        let mut source = SourceConfig::new(
            "https://example.com/grid?timespan=6&time={timestamp}",
            SourceFormat::GridJson,
        );
        source.windows = Some(FetchWindows {
            count: 3,
            interval_secs: 21000,
        });

        let locations = source.fetch_locations(1_000_000);
        assert_eq!(
            locations,
            vec![
                "https://example.com/grid?timespan=6&time=1000000",
                "https://example.com/grid?timespan=6&time=1021000",
                "https://example.com/grid?timespan=6&time=1042000",
            ]
        );
    }

    #[test]
    fn test_fetch_locations_single() {
        let source = SourceConfig::new("./epg.xml", SourceFormat::Xmltv);
        assert_eq!(source.fetch_locations(42), vec!["./epg.xml"]);
    }

    #[test]
    fn test_source_format_from_str() {
        assert_eq!("XMLTV".parse::<SourceFormat>().unwrap(), SourceFormat::Xmltv);
        assert_eq!("grid".parse::<SourceFormat>().unwrap(), SourceFormat::GridJson);
        assert_eq!("tubi_json".parse::<SourceFormat>().unwrap(), SourceFormat::TubiJson);
        assert!("rss".parse::<SourceFormat>().is_err());
        assert_eq!(SourceFormat::GridJson.to_string(), "grid_json");
    }
}
