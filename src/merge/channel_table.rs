//! Channel merge table: first writer wins

use std::collections::HashMap;
use tracing::debug;

use crate::models::{DisplayName, EpgChannel};

/// Result of offering a channel to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelIngest {
    /// First time this id was seen; its metadata is kept
    Inserted,
    /// Id already present; the contributed metadata is ignored entirely
    Duplicate,
    /// Channel had no id and was dropped
    MissingId,
}

/// Accumulates channels across sources keyed by id, in first-insertion order
#[derive(Debug, Default)]
pub struct ChannelMergeTable {
    channels: Vec<EpgChannel>,
    index: HashMap<String, usize>,
}

impl ChannelMergeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, mut channel: EpgChannel) -> ChannelIngest {
        if channel.id.trim().is_empty() {
            debug!("Skipping channel without id: {:?}", channel.display_name());
            return ChannelIngest::MissingId;
        }

        if self.index.contains_key(&channel.id) {
            return ChannelIngest::Duplicate;
        }

        if channel.display_names.is_empty() {
            channel.display_names.push(DisplayName::new(channel.id.clone()));
        }

        self.index.insert(channel.id.clone(), self.channels.len());
        self.channels.push(channel);
        ChannelIngest::Inserted
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&EpgChannel> {
        self.index.get(id).map(|&i| &self.channels[i])
    }

    /// Merged channels in first-insertion order
    pub fn all(&self) -> &[EpgChannel] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<EpgChannel> {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
