//! Final document assembly
//!
//! Output order is part of the contract: every channel precedes every
//! programme, channels keep first-insertion order, and programmes are
//! flattened channel-major with each channel's events ascending by start.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::{EpgChannel, MergedDocument, MergedProgramme};

/// Assemble merged channels and deduplicated, sorted schedules
///
/// Schedules for channel ids that no source declared as a channel are kept
/// and placed after those of the declared channels, in their own order.
pub fn assemble(
    channels: Vec<EpgChannel>,
    schedules: Vec<(String, Vec<MergedProgramme>)>,
) -> MergedDocument {
    let total: usize = schedules.iter().map(|(_, p)| p.len()).sum();
    let mut by_channel: HashMap<String, Vec<MergedProgramme>> =
        HashMap::with_capacity(schedules.len());
    let mut orphan_order = Vec::new();

    {
        let declared: HashSet<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        for (channel_id, programmes) in schedules {
            if !declared.contains(channel_id.as_str()) {
                orphan_order.push(channel_id.clone());
            }
            by_channel.insert(channel_id, programmes);
        }
    }

    let mut programmes = Vec::with_capacity(total);
    for channel in &channels {
        if let Some(events) = by_channel.remove(&channel.id) {
            programmes.extend(events);
        }
    }

    for channel_id in orphan_order {
        if let Some(events) = by_channel.remove(&channel_id) {
            debug!(
                "Programmes for undeclared channel '{}' appended after declared channels ({} events)",
                channel_id,
                events.len()
            );
            programmes.extend(events);
        }
    }

    MergedDocument {
        channels,
        programmes,
    }
}
