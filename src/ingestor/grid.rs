//! Listings grid JSON adapter
//!
//! Payload shape: `{"channels": [{"channelId", "callSign", "thumbnail",
//! "events": [{"startTime", "endTime", "program": {"title", "shortDesc"}}]}]}`.
//! Timestamps are handed to the engine as-is (ISO 8601 in practice).

use serde::Deserialize;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::{DisplayName, EpgChannel, EpgProgramme, SourceDocument};

#[derive(Debug, Deserialize)]
struct GridPayload {
    #[serde(default)]
    channels: Vec<GridChannel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridChannel {
    channel_id: Option<String>,
    call_sign: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    events: Vec<GridEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridEvent {
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    program: GridProgram,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProgram {
    title: Option<String>,
    short_desc: Option<String>,
}

/// Parse a grid payload into a source document tagged with `source`
pub fn parse_grid_document(content: &str, source: &str) -> SourceResult<SourceDocument> {
    let payload: GridPayload = serde_json::from_str(content)
        .map_err(|e| SourceError::parse_error("grid_json", e.to_string()))?;

    let mut document = SourceDocument::new(source);

    for channel in payload.channels {
        let id = channel.channel_id.unwrap_or_default();
        let name = channel
            .call_sign
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        for event in channel.events {
            document.programmes.push(EpgProgramme {
                channel_id: id.clone(),
                start: event.start_time.unwrap_or_default(),
                stop: event.end_time.filter(|s| !s.is_empty()),
                title: event.program.title,
                description: event.program.short_desc,
                ..Default::default()
            });
        }

        document.channels.push(EpgChannel {
            display_names: if name.is_empty() {
                Vec::new()
            } else {
                vec![DisplayName::new(name)]
            },
            icon: channel.thumbnail.filter(|t| !t.is_empty()).map(absolute_url),
            id,
        });
    }

    debug!(
        "Grid payload '{}': {} channels, {} events",
        source,
        document.channels.len(),
        document.programmes.len()
    );

    Ok(document)
}

/// Grid thumbnails are often protocol-relative (`//host/path`)
fn absolute_url(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}
