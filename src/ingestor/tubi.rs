//! Tubi programming JSON adapter
//!
//! Each entry of `rows` is one channel with its `programs`. Numeric fields
//! arrive either as numbers or as strings depending on the endpoint, so they
//! are read as raw JSON values.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::{DisplayName, EpgChannel, EpgProgramme, EpisodeNumber, Rating, SourceDocument};

const DEFAULT_RATING_SYSTEM: &str = "mpaa";

#[derive(Debug, Deserialize)]
struct TubiPayload {
    #[serde(default)]
    rows: Vec<TubiRow>,
}

#[derive(Debug, Deserialize)]
struct TubiRow {
    content_id: Option<Value>,
    title: Option<String>,
    #[serde(default)]
    images: TubiImages,
    #[serde(default)]
    programs: Vec<TubiProgram>,
}

#[derive(Debug, Default, Deserialize)]
struct TubiImages {
    #[serde(default)]
    thumbnail: Vec<String>,
    #[serde(default)]
    poster: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TubiProgram {
    start_time: Option<String>,
    end_time: Option<String>,
    title: Option<String>,
    description: Option<String>,
    year: Option<Value>,
    season_number: Option<Value>,
    episode_number: Option<Value>,
    #[serde(default)]
    ratings: Vec<TubiRating>,
    #[serde(default)]
    images: TubiImages,
}

#[derive(Debug, Deserialize)]
struct TubiRating {
    system: Option<String>,
    value: Option<String>,
}

/// Parse a Tubi programming payload into a source document tagged with `source`
pub fn parse_tubi_document(content: &str, source: &str) -> SourceResult<SourceDocument> {
    let payload: TubiPayload = serde_json::from_str(content)
        .map_err(|e| SourceError::parse_error("tubi_json", e.to_string()))?;

    let mut document = SourceDocument::new(source);

    for row in payload.rows {
        let id = row.content_id.as_ref().and_then(value_to_string).unwrap_or_default();

        for program in row.programs {
            document.programmes.push(convert_program(&id, program));
        }

        let name = row.title.filter(|t| !t.trim().is_empty());
        document.channels.push(EpgChannel {
            display_names: name.map(DisplayName::new).into_iter().collect(),
            icon: row.images.thumbnail.into_iter().next(),
            id,
        });
    }

    debug!(
        "Tubi payload '{}': {} channels, {} programmes",
        source,
        document.channels.len(),
        document.programmes.len()
    );

    Ok(document)
}

fn convert_program(channel_id: &str, program: TubiProgram) -> EpgProgramme {
    let season = program.season_number.as_ref().and_then(value_to_number);
    let episode = program.episode_number.as_ref().and_then(value_to_number);

    let episode_numbers = match (season, episode) {
        (Some(season), Some(episode)) if season > 0 && episode > 0 => vec![EpisodeNumber {
            system: Some("xmltv_ns".to_string()),
            value: format!("{}.{}.", season - 1, episode - 1),
        }],
        _ => Vec::new(),
    };

    let rating = program.ratings.into_iter().next().and_then(|r| {
        r.value.filter(|v| !v.is_empty()).map(|value| Rating {
            system: Some(r.system.unwrap_or_else(|| DEFAULT_RATING_SYSTEM.to_string())),
            value,
        })
    });

    EpgProgramme {
        channel_id: channel_id.to_string(),
        start: program.start_time.unwrap_or_default(),
        stop: program.end_time.filter(|s| !s.is_empty()),
        title: program.title,
        description: program.description,
        date: program
            .year
            .as_ref()
            .and_then(value_to_string)
            .filter(|y| !y.is_empty() && y != "0"),
        episode_numbers,
        rating,
        icon: program.images.poster.into_iter().next(),
        ..Default::default()
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
