use serde::{Deserialize, Serialize};

pub mod epg_source;

pub use epg_source::{FetchWindows, SourceConfig, SourceFormat};

/// A channel display name, optionally tagged with a language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    pub value: String,
    pub lang: Option<String>,
}

impl DisplayName {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    pub fn with_lang<S: Into<String>, L: Into<String>>(value: S, lang: L) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }
}

/// A channel as declared by a source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpgChannel {
    pub id: String,
    pub display_names: Vec<DisplayName>,
    pub icon: Option<String>,
}

impl EpgChannel {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, display_name: N) -> Self {
        Self {
            id: id.into(),
            display_names: vec![DisplayName::new(display_name)],
            icon: None,
        }
    }

    pub fn with_icon<S: Into<String>>(mut self, icon: S) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Primary display name (the first one declared)
    pub fn display_name(&self) -> Option<&str> {
        self.display_names.first().map(|n| n.value.as_str())
    }
}

/// Episode numbering in a given XMLTV system (`xmltv_ns`, `onscreen`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeNumber {
    pub system: Option<String>,
    pub value: String,
}

/// Parental rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub system: Option<String>,
    pub value: String,
}

/// A programme event as declared by a source document
///
/// `start` and `stop` carry the source's own text; the merge engine rewrites
/// them into the canonical XMLTV form when the event is accepted. Everything
/// after `description` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EpgProgramme {
    pub channel_id: String,
    pub start: String,
    pub stop: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub sub_title: Option<String>,
    pub categories: Vec<String>,
    pub episode_numbers: Vec<EpisodeNumber>,
    pub rating: Option<Rating>,
    pub date: Option<String>,
    pub icon: Option<String>,
    pub language: Option<String>,
}

impl EpgProgramme {
    pub fn new<C: Into<String>, S: Into<String>>(channel_id: C, start: S) -> Self {
        Self {
            channel_id: channel_id.into(),
            start: start.into(),
            ..Default::default()
        }
    }

    pub fn with_stop<S: Into<String>>(mut self, stop: S) -> Self {
        self.stop = Some(stop.into());
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One fetch of one feed, already parsed
///
/// `source` is the identity used to look up the allow-list entry. Repeated
/// time-shifted fetches of the same feed are separate documents sharing the
/// same identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source: String,
    pub channels: Vec<EpgChannel>,
    pub programmes: Vec<EpgProgramme>,
}

impl SourceDocument {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            channels: Vec::new(),
            programmes: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: EpgChannel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_programme(mut self, programme: EpgProgramme) -> Self {
        self.programmes.push(programme);
        self
    }
}

/// A programme accepted by the merge, with canonical timestamps and defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedProgramme {
    pub channel_id: String,
    pub start: String,
    pub stop: Option<String>,
    pub title: String,
    pub description: String,
    pub sub_title: Option<String>,
    pub categories: Vec<String>,
    pub episode_numbers: Vec<EpisodeNumber>,
    pub rating: Option<Rating>,
    pub date: Option<String>,
    pub icon: Option<String>,
    pub language: Option<String>,
}

/// Final aggregate: every channel block precedes every programme block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergedDocument {
    pub channels: Vec<EpgChannel>,
    pub programmes: Vec<MergedProgramme>,
}

impl MergedDocument {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.programmes.is_empty()
    }

    pub fn channel(&self, id: &str) -> Option<&EpgChannel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn programmes_for<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a MergedProgramme> + 'a {
        self.programmes
            .iter()
            .filter(move |p| p.channel_id == channel_id)
    }
}

/// What a collaborator hands the merge engine for one fetch
///
/// A fetch that failed upstream is still reported so the run summary can
/// count it; it contributes nothing to the merged document.
#[derive(Debug, Clone)]
pub enum SourceInput {
    Document(SourceDocument),
    Failed {
        source: String,
        error: crate::errors::SourceError,
    },
}

impl SourceInput {
    pub fn source(&self) -> &str {
        match self {
            SourceInput::Document(document) => &document.source,
            SourceInput::Failed { source, .. } => source,
        }
    }
}

impl From<SourceDocument> for SourceInput {
    fn from(document: SourceDocument) -> Self {
        SourceInput::Document(document)
    }
}
