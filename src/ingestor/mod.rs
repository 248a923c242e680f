//! Source acquisition
//!
//! Fetches every configured source (expanding time-shifted windows), parses
//! each payload according to its format and hands the engine one
//! [`SourceInput`] per fetch, in configuration order.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::errors::{AppResult, SourceError, SourceResult};
use crate::models::{SourceConfig, SourceDocument, SourceFormat, SourceInput};
use crate::utils::jitter::retry_with_backoff;
use crate::utils::xmltv_parser::parse_xmltv_document;

pub mod grid;
pub mod overrides;
pub mod tubi;

pub use overrides::load_overrides;

/// Retrieves the raw payload behind a location
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> SourceResult<String>;
}

/// HTTP(S) fetcher with timeout, user agent and retries
pub struct HttpFetcher {
    client: Client,
    retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            retries: config.retries,
            retry_delay: config.retry_delay(),
        })
    }

    async fn fetch_once(&self, url: &str) -> SourceResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown status"),
            ));
        }

        response.text().await.map_err(|e| map_request_error(url, e))
    }
}

fn map_request_error(url: &str, error: reqwest::Error) -> SourceError {
    if error.is_timeout() || error.is_connect() {
        SourceError::timeout(url)
    } else {
        SourceError::http(
            error.status().map(|s| s.as_u16()).unwrap_or_default(),
            error.to_string(),
        )
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> SourceResult<String> {
        retry_with_backoff(
            move || self.fetch_once(location),
            location,
            self.retries,
            self.retry_delay,
        )
        .await
    }
}

/// Local file fetcher
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

#[async_trait]
impl SourceFetcher for FileFetcher {
    async fn fetch(&self, location: &str) -> SourceResult<String> {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| SourceError::io(location, e.to_string()))
    }
}

/// Parse a payload in the given format into a source document
pub fn parse_document(
    content: &str,
    format: SourceFormat,
    source: &str,
) -> SourceResult<SourceDocument> {
    match format {
        SourceFormat::Xmltv => parse_xmltv_document(content, source),
        SourceFormat::GridJson => grid::parse_grid_document(content, source),
        SourceFormat::TubiJson => tubi::parse_tubi_document(content, source),
    }
}

/// Fetches and parses all configured sources
pub struct SourceIngestor {
    remote: Box<dyn SourceFetcher>,
    local: Box<dyn SourceFetcher>,
}

impl SourceIngestor {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        Ok(Self::with_fetchers(
            Box::new(HttpFetcher::new(config)?),
            Box::new(FileFetcher),
        ))
    }

    pub fn with_fetchers(remote: Box<dyn SourceFetcher>, local: Box<dyn SourceFetcher>) -> Self {
        Self { remote, local }
    }

    fn fetcher_for(&self, source: &SourceConfig) -> &dyn SourceFetcher {
        if source.is_remote() {
            self.remote.as_ref()
        } else {
            self.local.as_ref()
        }
    }

    /// Fetch and parse one concrete location of a source
    pub async fn ingest_location(&self, source: &SourceConfig, location: &str) -> SourceInput {
        let identity = source.identity().to_string();
        debug!("Fetching '{}' from {}", identity, location);

        let result = match self.fetcher_for(source).fetch(location).await {
            Ok(content) => parse_document(&content, source.format, &identity),
            Err(e) => Err(e),
        };

        match result {
            Ok(document) => {
                info!(
                    "Fetched '{}' ({}): {} channels, {} programmes",
                    identity,
                    source.format,
                    document.channels.len(),
                    document.programmes.len()
                );
                SourceInput::Document(document)
            }
            Err(error) => {
                warn!("Failed to ingest '{}' from {}: {}", identity, location, error);
                SourceInput::Failed {
                    source: identity,
                    error,
                }
            }
        }
    }

    /// Fetch every source and window concurrently
    ///
    /// The result keeps configuration order (sources in order, windows in
    /// ascending timestamp order) whatever order the fetches complete in.
    pub async fn ingest_all(&self, sources: &[SourceConfig], base_timestamp: i64) -> Vec<SourceInput> {
        let jobs: Vec<(&SourceConfig, String)> = sources
            .iter()
            .flat_map(|source| {
                source
                    .fetch_locations(base_timestamp)
                    .into_iter()
                    .map(move |location| (source, location))
            })
            .collect();

        info!(
            "Fetching {} documents from {} configured sources",
            jobs.len(),
            sources.len()
        );

        join_all(
            jobs.iter()
                .map(|(source, location)| self.ingest_location(source, location)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchWindows;
    use std::collections::HashMap;

    /// Serves canned payloads keyed by location
    struct StaticFetcher {
        payloads: HashMap<String, SourceResult<String>>,
    }

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        async fn fetch(&self, location: &str) -> SourceResult<String> {
            self.payloads
                .get(location)
                .cloned()
                .unwrap_or_else(|| Err(SourceError::http(404, "Not Found")))
        }
    }

    fn xmltv(channel: &str) -> String {
        format!(
            r#"<tv><channel id="{channel}"><display-name>{channel}</display-name></channel></tv>"#
        )
    }

    fn ingestor(payloads: Vec<(&str, SourceResult<String>)>) -> SourceIngestor {
        let payloads: HashMap<String, SourceResult<String>> = payloads
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        SourceIngestor::with_fetchers(
            Box::new(StaticFetcher {
                payloads: payloads.clone(),
            }),
            Box::new(StaticFetcher { payloads }),
        )
    }

    #[tokio::test]
    async fn test_ingest_all_keeps_config_order() {
        let ingestor = ingestor(vec![
            ("http://a/epg.xml", Ok(xmltv("A"))),
            ("http://b/epg.xml", Ok(xmltv("B"))),
        ]);
        let sources = vec![
            SourceConfig::new("http://b/epg.xml", SourceFormat::Xmltv),
            SourceConfig::new("http://a/epg.xml", SourceFormat::Xmltv),
        ];

        let inputs = ingestor.ingest_all(&sources, 0).await;
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].source(), "http://b/epg.xml");
        assert_eq!(inputs[1].source(), "http://a/epg.xml");
    }

    #[tokio::test]
    async fn test_windows_expand_to_separate_documents() {
        let ingestor = ingestor(vec![
            ("http://grid/?time=100", Ok(r#"{"channels": []}"#.to_string())),
            ("http://grid/?time=160", Ok(r#"{"channels": []}"#.to_string())),
        ]);
        let mut source = SourceConfig::new("http://grid/?time={timestamp}", SourceFormat::GridJson);
        source.name = Some("grid".to_string());
        source.windows = Some(FetchWindows {
            count: 3,
            interval_secs: 60,
        });

        let inputs = ingestor.ingest_all(&[source], 100).await;
        assert_eq!(inputs.len(), 3);
        assert!(inputs.iter().all(|i| i.source() == "grid"));
        assert!(matches!(inputs[0], SourceInput::Document(_)));
        assert!(matches!(inputs[1], SourceInput::Document(_)));
        // Third window (time=220) is not served
        assert!(matches!(
            inputs[2],
            SourceInput::Failed {
                error: SourceError::Http { status: 404, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parse_failure_is_source_failure() {
        let ingestor = ingestor(vec![("http://bad/epg.xml", Ok("<html></html>".to_string()))]);
        let sources = vec![SourceConfig::new("http://bad/epg.xml", SourceFormat::Xmltv)];

        let inputs = ingestor.ingest_all(&sources, 0).await;
        assert!(matches!(
            inputs[0],
            SourceInput::Failed {
                error: SourceError::ParseError { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_file_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epg.xml");
        std::fs::write(&path, xmltv("LOCAL")).unwrap();

        let content = FileFetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert!(content.contains("LOCAL"));

        let missing = FileFetcher
            .fetch(dir.path().join("missing.xml").to_str().unwrap())
            .await;
        assert!(matches!(missing, Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_parse_document_dispatch() {
        let doc = parse_document(&xmltv("X"), SourceFormat::Xmltv, "s").unwrap();
        assert_eq!(doc.channels[0].id, "X");
        assert!(parse_document("{}", SourceFormat::GridJson, "s").is_ok());
        assert!(parse_document("{}", SourceFormat::TubiJson, "s").is_ok());
        assert!(parse_document("{}", SourceFormat::Xmltv, "s").is_err());
    }
}
