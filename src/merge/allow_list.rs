//! Per-source channel allow-lists
//!
//! An entry restricts a source to a set of channel ids. A source without an
//! entry, or whose entry is the empty set, is unrestricted: an empty
//! allow-list never means "exclude everything".

use std::collections::{HashMap, HashSet};

use crate::models::{EpgChannel, EpgProgramme, SourceDocument};

/// Mapping from source identity to permitted channel ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowListConfig {
    entries: HashMap<String, HashSet<String>>,
}

/// The restriction that applies to one source
#[derive(Debug, Clone, Copy)]
pub enum AllowList<'a> {
    Unrestricted,
    Only(&'a HashSet<String>),
}

impl AllowList<'_> {
    pub fn permits(&self, channel_id: &str) -> bool {
        match self {
            AllowList::Unrestricted => true,
            AllowList::Only(ids) => ids.contains(channel_id),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, AllowList::Only(_))
    }
}

impl AllowListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry for a source, replacing any previous one
    pub fn insert<S, I, C>(&mut self, source: S, channel_ids: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.entries.insert(
            source.into(),
            channel_ids.into_iter().map(Into::into).collect(),
        );
    }

    pub fn with_entry<S, I, C>(mut self, source: S, channel_ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.insert(source, channel_ids);
        self
    }

    /// Look up the restriction for a source identity
    pub fn entry(&self, source: &str) -> AllowList<'_> {
        match self.entries.get(source) {
            Some(ids) if !ids.is_empty() => AllowList::Only(ids),
            _ => AllowList::Unrestricted,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Channels and programmes of one document that survived its allow-list
#[derive(Debug, Clone, Default)]
pub struct FilteredDocument {
    pub channels: Vec<EpgChannel>,
    pub programmes: Vec<EpgProgramme>,
    pub channels_filtered: usize,
    pub programmes_filtered: usize,
}

/// Apply an allow-list to a source document
///
/// Programmes are tested on their own `channel_id`, independently of which
/// channels survived, since a source's channel and programme lists need not
/// agree with each other.
pub fn filter_document(document: SourceDocument, allow_list: AllowList<'_>) -> FilteredDocument {
    let SourceDocument {
        channels,
        programmes,
        ..
    } = document;

    if !allow_list.is_restricted() {
        return FilteredDocument {
            channels,
            programmes,
            channels_filtered: 0,
            programmes_filtered: 0,
        };
    }

    let channel_total = channels.len();
    let programme_total = programmes.len();

    let channels: Vec<EpgChannel> = channels
        .into_iter()
        .filter(|c| allow_list.permits(&c.id))
        .collect();
    let programmes: Vec<EpgProgramme> = programmes
        .into_iter()
        .filter(|p| allow_list.permits(&p.channel_id))
        .collect();

    FilteredDocument {
        channels_filtered: channel_total - channels.len(),
        programmes_filtered: programme_total - programmes.len(),
        channels,
        programmes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> SourceDocument {
        SourceDocument::new("feed")
            .with_channel(EpgChannel::new("A", "Alpha"))
            .with_channel(EpgChannel::new("B", "Bravo"))
            .with_programme(EpgProgramme::new("A", "20250101120000 +0000"))
            .with_programme(EpgProgramme::new("B", "20250101120000 +0000"))
            .with_programme(EpgProgramme::new("C", "20250101120000 +0000"))
    }

    #[test]
    fn test_missing_entry_is_unrestricted() {
        let config = AllowListConfig::new();
        let filtered = filter_document(sample_document(), config.entry("feed"));
        assert_eq!(filtered.channels.len(), 2);
        assert_eq!(filtered.programmes.len(), 3);
        assert_eq!(filtered.channels_filtered, 0);
        assert_eq!(filtered.programmes_filtered, 0);
    }

    #[test]
    fn test_empty_entry_is_unrestricted() {
        let config = AllowListConfig::new().with_entry("feed", Vec::<String>::new());
        assert!(!config.entry("feed").is_restricted());

        let filtered = filter_document(sample_document(), config.entry("feed"));
        assert_eq!(filtered.channels.len(), 2);
        assert_eq!(filtered.programmes.len(), 3);
    }

    #[test]
    fn test_restriction_applies_to_channels_and_programmes() {
        let config = AllowListConfig::new().with_entry("feed", ["A"]);
        let filtered = filter_document(sample_document(), config.entry("feed"));

        assert_eq!(filtered.channels.len(), 1);
        assert_eq!(filtered.channels[0].id, "A");
        assert_eq!(filtered.programmes.len(), 1);
        assert_eq!(filtered.programmes[0].channel_id, "A");
        assert_eq!(filtered.channels_filtered, 1);
        assert_eq!(filtered.programmes_filtered, 2);
    }

    #[test]
    fn test_programmes_filtered_independently_of_channels() {
        // "C" has no channel entry in the document but is allowed
        let config = AllowListConfig::new().with_entry("feed", ["C"]);
        let filtered = filter_document(sample_document(), config.entry("feed"));

        assert!(filtered.channels.is_empty());
        assert_eq!(filtered.programmes.len(), 1);
        assert_eq!(filtered.programmes[0].channel_id, "C");
    }

    #[test]
    fn test_entry_for_other_source_does_not_apply() {
        let config = AllowListConfig::new().with_entry("other", ["A"]);
        let filtered = filter_document(sample_document(), config.entry("feed"));
        assert_eq!(filtered.channels.len(), 2);
    }
}
