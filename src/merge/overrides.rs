//! Display-name overrides applied after the merge

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::{DisplayName, EpgChannel};

/// Channel id -> desired display name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameOverrides(HashMap<String, String>);

impl NameOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I: Into<String>, N: Into<String>>(&mut self, channel_id: I, name: N) {
        self.0.insert(channel_id.into(), name.into());
    }

    pub fn get(&self, channel_id: &str) -> Option<&str> {
        self.0.get(channel_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<I: Into<String>, N: Into<String>> FromIterator<(I, N)> for NameOverrides {
    fn from_iter<T: IntoIterator<Item = (I, N)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, name)| (id.into(), name.into()))
                .collect(),
        )
    }
}

/// Per-channel outcome of the override pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum OverrideOutcome {
    Applied { channel_id: String, name: String },
    Skipped { channel_id: String },
}

impl OverrideOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OverrideOutcome::Applied { .. })
    }
}

/// Replace display names of every channel that has an override
///
/// All prior display names of an overridden channel are discarded and
/// exactly one remains. Channels without an entry are left untouched.
pub fn apply_overrides(
    channels: &mut [EpgChannel],
    overrides: &NameOverrides,
) -> Vec<OverrideOutcome> {
    let outcomes: Vec<OverrideOutcome> = channels
        .iter_mut()
        .map(|channel| match overrides.get(&channel.id) {
            Some(name) => {
                channel.display_names = vec![DisplayName::new(name)];
                debug!("Override applied: {} -> {}", channel.id, name);
                OverrideOutcome::Applied {
                    channel_id: channel.id.clone(),
                    name: name.to_string(),
                }
            }
            None => {
                debug!("No override for {}, keeping merged names", channel.id);
                OverrideOutcome::Skipped {
                    channel_id: channel.id.clone(),
                }
            }
        })
        .collect();

    if !overrides.is_empty() {
        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        info!("Name overrides applied: {}/{} channels", applied, channels.len());
    }

    outcomes
}
