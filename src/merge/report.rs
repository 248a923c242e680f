//! Run summary
//!
//! Advisory counters surfaced to the caller; nothing in the merge depends
//! on them.

use serde::Serialize;
use tracing::{info, warn};

use super::dedup::RejectReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    Merged,
    Failed { error: String },
}

/// Counters for one source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub channels_added: usize,
    pub channels_duplicate: usize,
    pub channels_missing_id: usize,
    pub channels_filtered: usize,
    pub programmes_accepted: usize,
    pub programmes_filtered: usize,
    pub programmes_duplicate: usize,
    pub programmes_malformed: usize,
}

impl SourceReport {
    pub fn merged<S: Into<String>>(source: S) -> Self {
        Self::with_status(source, SourceStatus::Merged)
    }

    pub fn failed<S: Into<String>, E: ToString>(source: S, error: &E) -> Self {
        Self::with_status(
            source,
            SourceStatus::Failed {
                error: error.to_string(),
            },
        )
    }

    fn with_status<S: Into<String>>(source: S, status: SourceStatus) -> Self {
        Self {
            source: source.into(),
            status,
            channels_added: 0,
            channels_duplicate: 0,
            channels_missing_id: 0,
            channels_filtered: 0,
            programmes_accepted: 0,
            programmes_filtered: 0,
            programmes_duplicate: 0,
            programmes_malformed: 0,
        }
    }

    pub(crate) fn record_rejection(&mut self, reason: RejectReason) {
        if reason.is_malformed() {
            self.programmes_malformed += 1;
        } else {
            self.programmes_duplicate += 1;
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }
}

/// Summary of a whole merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub sources: Vec<SourceReport>,
    pub channels_merged: usize,
    pub programmes_merged: usize,
    pub overrides_applied: usize,
    pub overrides_skipped: usize,
}

impl MergeReport {
    pub fn sources_failed(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failed()).count()
    }

    pub fn programmes_filtered(&self) -> usize {
        self.sources.iter().map(|s| s.programmes_filtered).sum()
    }

    pub fn programmes_duplicate(&self) -> usize {
        self.sources.iter().map(|s| s.programmes_duplicate).sum()
    }

    pub fn programmes_malformed(&self) -> usize {
        self.sources.iter().map(|s| s.programmes_malformed).sum()
    }

    pub fn channels_skipped(&self) -> usize {
        self.sources.iter().map(|s| s.channels_missing_id).sum()
    }

    pub fn log_summary(&self) {
        if self.channels_merged == 0 {
            warn!(
                "No source contributed any channels ({} sources, {} failed)",
                self.sources.len(),
                self.sources_failed()
            );
        }

        info!(
            "Merge completed: {} sources ({} failed), {} channels, {} programmes accepted; \
             rejected {} filtered, {} duplicate, {} malformed; overrides {} applied, {} skipped",
            self.sources.len(),
            self.sources_failed(),
            self.channels_merged,
            self.programmes_merged,
            self.programmes_filtered(),
            self.programmes_duplicate(),
            self.programmes_malformed(),
            self.overrides_applied,
            self.overrides_skipped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;

    #[test]
    fn test_totals() {
        let mut a = SourceReport::merged("a");
        a.programmes_filtered = 2;
        a.record_rejection(RejectReason::Duplicate);
        a.record_rejection(RejectReason::MissingStart);
        let b = SourceReport::failed("b", &SourceError::timeout("http://b"));

        let report = MergeReport {
            sources: vec![a, b],
            ..Default::default()
        };

        assert_eq!(report.sources_failed(), 1);
        assert_eq!(report.programmes_filtered(), 2);
        assert_eq!(report.programmes_duplicate(), 1);
        assert_eq!(report.programmes_malformed(), 1);
    }

    #[test]
    fn test_serialize_failed_source() {
        let report = SourceReport::failed("b", &SourceError::http(404, "Not Found"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "HTTP error: 404 - Not Found");
        assert_eq!(json["source"], "b");
    }
}
