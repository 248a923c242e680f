//! Programme dedup index
//!
//! One index is shared by every source document of a run. An event is
//! identified by `(channel_id, start)`: the first event seen for a slot is
//! kept and later ones are dropped, whatever their content. This conflates
//! two distinct programmes that start at the same instant on the same
//! channel, which upstream feeds are assumed never to produce.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::{EpgProgramme, MergedProgramme};
use crate::utils::datetime::XmltvTimestamp;

/// Fallback text for programmes that arrive without title or description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammeDefaults {
    pub title: String,
    pub description: String,
}

impl Default for ProgrammeDefaults {
    fn default() -> Self {
        Self {
            title: crate::config::defaults::DEFAULT_PROGRAMME_TITLE.to_string(),
            description: crate::config::defaults::DEFAULT_PROGRAMME_DESCRIPTION.to_string(),
        }
    }
}

/// Why an event was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Slot already taken by an earlier event
    Duplicate,
    /// No channel id to attach the event to
    MissingChannel,
    /// Start time absent or empty
    MissingStart,
    /// Start time present but not a recognised timestamp
    InvalidStart,
}

impl RejectReason {
    pub fn is_malformed(&self) -> bool {
        !matches!(self, RejectReason::Duplicate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accept,
    Reject(RejectReason),
}

#[derive(Debug, Default)]
struct ChannelSchedule {
    seen_starts: HashSet<String>,
    events: Vec<(XmltvTimestamp, MergedProgramme)>,
}

/// Per-channel set of accepted start keys plus the accepted events
#[derive(Debug, Default)]
pub struct ProgrammeDedupIndex {
    defaults: ProgrammeDefaults,
    schedules: HashMap<String, ChannelSchedule>,
    channel_order: Vec<String>,
    accepted: usize,
}

impl ProgrammeDedupIndex {
    pub fn new(defaults: ProgrammeDefaults) -> Self {
        Self {
            defaults,
            ..Default::default()
        }
    }

    /// Offer an event; on accept it is normalised and stored
    pub fn offer(&mut self, programme: EpgProgramme) -> Offer {
        if programme.channel_id.trim().is_empty() {
            debug!("Rejecting programme without channel id at '{}'", programme.start);
            return Offer::Reject(RejectReason::MissingChannel);
        }

        if programme.start.trim().is_empty() {
            debug!(
                "Rejecting programme without start on channel '{}'",
                programme.channel_id
            );
            return Offer::Reject(RejectReason::MissingStart);
        }

        let start = match XmltvTimestamp::parse(&programme.start) {
            Ok(start) => start,
            Err(e) => {
                debug!(
                    "Rejecting programme on channel '{}': {}",
                    programme.channel_id, e
                );
                return Offer::Reject(RejectReason::InvalidStart);
            }
        };

        if let Some(schedule) = self.schedules.get(&programme.channel_id) {
            if schedule.seen_starts.contains(start.as_str()) {
                return Offer::Reject(RejectReason::Duplicate);
            }
        }

        let merged = self.normalise(programme, &start);
        if !self.schedules.contains_key(&merged.channel_id) {
            self.channel_order.push(merged.channel_id.clone());
        }
        let schedule = self.schedules.entry(merged.channel_id.clone()).or_default();

        schedule.seen_starts.insert(start.as_str().to_string());
        schedule.events.push((start, merged));
        self.accepted += 1;
        Offer::Accept
    }

    fn normalise(&self, programme: EpgProgramme, start: &XmltvTimestamp) -> MergedProgramme {
        let stop = programme.stop.as_deref().and_then(|raw| {
            match XmltvTimestamp::parse(raw) {
                Ok(stop) => Some(stop.into_string()),
                Err(e) => {
                    debug!(
                        "Dropping stop time of programme on channel '{}' at {}: {}",
                        programme.channel_id, start, e
                    );
                    None
                }
            }
        });

        MergedProgramme {
            start: start.as_str().to_string(),
            stop,
            title: non_empty(programme.title).unwrap_or_else(|| self.defaults.title.clone()),
            description: non_empty(programme.description)
                .unwrap_or_else(|| self.defaults.description.clone()),
            channel_id: programme.channel_id,
            sub_title: programme.sub_title,
            categories: programme.categories,
            episode_numbers: programme.episode_numbers,
            rating: programme.rating,
            date: programme.date,
            icon: programme.icon,
            language: programme.language,
        }
    }

    /// Number of events accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }

    /// Drain into per-channel lists sorted by start ascending
    ///
    /// Channels come out in the order their first event was accepted. The
    /// sort is stable, so events with the same instant keep first-seen order.
    pub fn into_sorted(mut self) -> Vec<(String, Vec<MergedProgramme>)> {
        self.channel_order
            .into_iter()
            .map(|channel_id| {
                let mut events = self
                    .schedules
                    .remove(&channel_id)
                    .map(|schedule| schedule.events)
                    .unwrap_or_default();
                events.sort_by(|a, b| a.0.instant().cmp(&b.0.instant()));
                let programmes = events.into_iter().map(|(_, p)| p).collect();
                (channel_id, programmes)
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ProgrammeDedupIndex {
        ProgrammeDedupIndex::new(ProgrammeDefaults {
            title: "Untitled".to_string(),
            description: String::new(),
        })
    }

    #[test]
    fn test_duplicate_slot_rejected_first_kept() {
        let mut index = index();
        assert_eq!(
            index.offer(EpgProgramme::new("X", "20250101120000 +0000").with_title("News")),
            Offer::Accept
        );
        assert_eq!(
            index.offer(EpgProgramme::new("X", "20250101120000 +0000").with_title("Noticias")),
            Offer::Reject(RejectReason::Duplicate)
        );

        let sorted = index.into_sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].1.len(), 1);
        assert_eq!(sorted[0].1[0].title, "News");
    }

    #[test]
    fn test_same_start_different_channel_accepted() {
        let mut index = index();
        assert_eq!(index.offer(EpgProgramme::new("X", "20250101120000 +0000")), Offer::Accept);
        assert_eq!(index.offer(EpgProgramme::new("Y", "20250101120000 +0000")), Offer::Accept);
        assert_eq!(index.accepted(), 2);
    }

    #[test]
    fn test_duplicate_detected_across_formats() {
        let mut index = index();
        assert_eq!(index.offer(EpgProgramme::new("X", "2025-01-01T12:00Z")), Offer::Accept);
        assert_eq!(
            index.offer(EpgProgramme::new("X", "20250101120000 +0000")),
            Offer::Reject(RejectReason::Duplicate)
        );
    }

    #[test]
    fn test_missing_or_invalid_start_rejected() {
        let mut index = index();
        assert_eq!(
            index.offer(EpgProgramme::new("X", "")),
            Offer::Reject(RejectReason::MissingStart)
        );
        assert_eq!(
            index.offer(EpgProgramme::new("X", "soon")),
            Offer::Reject(RejectReason::InvalidStart)
        );
        assert_eq!(
            index.offer(EpgProgramme::new("", "20250101120000 +0000")),
            Offer::Reject(RejectReason::MissingChannel)
        );
        assert!(index.is_empty());
        assert!(RejectReason::InvalidStart.is_malformed());
        assert!(!RejectReason::Duplicate.is_malformed());
    }

    #[test]
    fn test_sorted_by_start() {
        let mut index = index();
        for start in ["20250101140000 +0000", "20250101120000 +0000", "20250101160000 +0000"] {
            index.offer(EpgProgramme::new("X", start));
        }

        let sorted = index.into_sorted();
        let starts: Vec<&str> = sorted[0].1.iter().map(|p| p.start.as_str()).collect();
        assert_eq!(
            starts,
            vec![
                "20250101120000 +0000",
                "20250101140000 +0000",
                "20250101160000 +0000"
            ]
        );
    }

    #[test]
    fn test_defaults_and_stop_normalisation() {
        let mut index = index();
        index.offer(EpgProgramme::new("X", "2025-01-01T12:00:00Z").with_stop("2025-01-01T13:00:00Z"));
        index.offer(EpgProgramme::new("X", "20250101130000 +0000").with_stop("whenever"));

        let sorted = index.into_sorted();
        let programmes = &sorted[0].1;
        assert_eq!(programmes[0].title, "Untitled");
        assert_eq!(programmes[0].description, "");
        assert_eq!(programmes[0].stop.as_deref(), Some("20250101130000 +0000"));
        assert_eq!(programmes[1].stop, None);
    }

    #[test]
    fn test_channel_order_is_first_acceptance() {
        let mut index = index();
        index.offer(EpgProgramme::new("B", "20250101120000 +0000"));
        index.offer(EpgProgramme::new("A", "20250101120000 +0000"));
        index.offer(EpgProgramme::new("B", "20250101130000 +0000"));

        let channels: Vec<String> = index.into_sorted().into_iter().map(|(id, _)| id).collect();
        assert_eq!(channels, vec!["B", "A"]);
    }
}
