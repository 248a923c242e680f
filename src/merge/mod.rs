//! The merge/dedup/override engine
//!
//! Source documents are processed one at a time in the order the caller
//! supplies them; that order decides which source wins channel metadata.
//! For each document the allow-list filter runs first, surviving channels go
//! to the [`ChannelMergeTable`] and surviving programmes to the shared
//! [`ProgrammeDedupIndex`]. Once every document is in, name overrides are
//! applied and the final document is assembled.
//!
//! ```rust
//! use epg_merger::merge::{EpgMerger, MergeConfig};
//! use epg_merger::models::{EpgChannel, EpgProgramme, SourceDocument};
//!
//! let merger = EpgMerger::new(MergeConfig::default());
//! let feed = SourceDocument::new("feed")
//!     .with_channel(EpgChannel::new("X", "Alpha"))
//!     .with_programme(EpgProgramme::new("X", "20250101120000 +0000").with_title("News"));
//!
//! let output = merger.merge([feed.clone(), feed]);
//! assert_eq!(output.document.channels.len(), 1);
//! assert_eq!(output.document.programmes.len(), 1);
//! ```

pub mod allow_list;
pub mod assembler;
pub mod channel_table;
pub mod dedup;
pub mod overrides;
pub mod report;

pub use allow_list::{AllowList, AllowListConfig};
pub use channel_table::{ChannelIngest, ChannelMergeTable};
pub use dedup::{Offer, ProgrammeDedupIndex, ProgrammeDefaults, RejectReason};
pub use overrides::{NameOverrides, OverrideOutcome};
pub use report::{MergeReport, SourceReport, SourceStatus};

use tracing::{debug, info, warn};

use crate::errors::SourceError;
use crate::models::{MergedDocument, SourceDocument, SourceInput};

/// Everything a merge run is parameterised by
///
/// Passed in explicitly so runs with different configurations never share
/// state.
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    pub allow_lists: AllowListConfig,
    pub overrides: NameOverrides,
    pub defaults: ProgrammeDefaults,
}

/// Merged document plus the advisory run summary
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub document: MergedDocument,
    pub report: MergeReport,
}

/// Entry point of the engine
#[derive(Debug, Clone, Default)]
pub struct EpgMerger {
    config: MergeConfig,
}

impl EpgMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Begin a run; the returned value owns all per-run state
    pub fn start_run(&self) -> MergeRun<'_> {
        MergeRun::new(&self.config)
    }

    /// Merge a complete, ordered set of inputs in one run
    pub fn merge<I, T>(&self, sources: I) -> MergeOutput
    where
        I: IntoIterator<Item = T>,
        T: Into<SourceInput>,
    {
        let mut run = self.start_run();
        for input in sources {
            match input.into() {
                SourceInput::Document(document) => {
                    run.ingest(document);
                }
                SourceInput::Failed { source, error } => {
                    run.record_failure(source, &error);
                }
            }
        }
        run.finish()
    }
}

/// One non-reentrant unit of work
///
/// Channel table and dedup index live here and are dropped with the run, so
/// nothing leaks between runs.
#[derive(Debug)]
pub struct MergeRun<'a> {
    config: &'a MergeConfig,
    channels: ChannelMergeTable,
    programmes: ProgrammeDedupIndex,
    sources: Vec<SourceReport>,
}

impl<'a> MergeRun<'a> {
    fn new(config: &'a MergeConfig) -> Self {
        Self {
            config,
            channels: ChannelMergeTable::new(),
            programmes: ProgrammeDedupIndex::new(config.defaults.clone()),
            sources: Vec::new(),
        }
    }

    /// Feed one source document through filter, channel table and dedup index
    pub fn ingest(&mut self, document: SourceDocument) -> &SourceReport {
        let source = document.source.clone();
        info!(
            "Processing source '{}': {} channels, {} programmes",
            source,
            document.channels.len(),
            document.programmes.len()
        );

        let allow_list = self.config.allow_lists.entry(&source);
        if allow_list.is_restricted() {
            debug!("Applying allow-list for source '{}'", source);
        }
        let filtered = allow_list::filter_document(document, allow_list);

        let mut report = SourceReport::merged(source);
        report.channels_filtered = filtered.channels_filtered;
        report.programmes_filtered = filtered.programmes_filtered;

        for channel in filtered.channels {
            match self.channels.ingest(channel) {
                ChannelIngest::Inserted => report.channels_added += 1,
                ChannelIngest::Duplicate => report.channels_duplicate += 1,
                ChannelIngest::MissingId => report.channels_missing_id += 1,
            }
        }

        for programme in filtered.programmes {
            match self.programmes.offer(programme) {
                Offer::Accept => report.programmes_accepted += 1,
                Offer::Reject(reason) => report.record_rejection(reason),
            }
        }

        info!(
            "  - Source '{}': {} channels added, {} programmes accepted ({} duplicate, {} malformed, {} filtered)",
            report.source,
            report.channels_added,
            report.programmes_accepted,
            report.programmes_duplicate,
            report.programmes_malformed,
            report.programmes_filtered
        );

        self.sources.push(report);
        &self.sources[self.sources.len() - 1]
    }

    /// Record a source whose document could not be produced upstream
    pub fn record_failure<S: Into<String>>(&mut self, source: S, error: &SourceError) {
        let source = source.into();
        warn!("Skipping source '{}': {}", source, error);
        self.sources.push(SourceReport::failed(source, error));
    }

    /// Apply overrides and assemble the final document
    pub fn finish(self) -> MergeOutput {
        let MergeRun {
            config,
            channels,
            programmes,
            sources,
        } = self;

        let mut channels = channels.into_channels();
        let outcomes = overrides::apply_overrides(&mut channels, &config.overrides);
        let overrides_applied = outcomes.iter().filter(|o| o.is_applied()).count();

        let document = assembler::assemble(channels, programmes.into_sorted());

        let report = MergeReport {
            sources,
            channels_merged: document.channels.len(),
            programmes_merged: document.programmes.len(),
            overrides_applied,
            overrides_skipped: outcomes.len() - overrides_applied,
        };
        report.log_summary();

        MergeOutput { document, report }
    }
}
