//! Name override table loader
//!
//! The table is a flat JSON object mapping channel id to display name. It is
//! optional: every failure to obtain it degrades to an empty table.

use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::merge::NameOverrides;

/// Load the override table from `path`, or an empty table on any failure
pub async fn load_overrides<P: AsRef<Path>>(path: P) -> NameOverrides {
    let path = path.as_ref();

    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let overrides = parse_overrides(&content);
            info!(
                "Loaded {} channel name overrides from {}",
                overrides.len(),
                path.display()
            );
            overrides
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Override file {} not found, continuing without overrides",
                path.display()
            );
            NameOverrides::new()
        }
        Err(e) => {
            warn!(
                "Failed to read override file {}: {}, continuing without overrides",
                path.display(),
                e
            );
            NameOverrides::new()
        }
    }
}

/// Parse override JSON; malformed input yields an empty table
pub fn parse_overrides(content: &str) -> NameOverrides {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid override JSON: {}, continuing without overrides", e);
            return NameOverrides::new();
        }
    };

    let Value::Object(entries) = value else {
        warn!("Override JSON is not an object, continuing without overrides");
        return NameOverrides::new();
    };

    let mut overrides = NameOverrides::new();
    for (channel_id, name) in entries {
        match name {
            Value::String(name) => overrides.insert(channel_id, name),
            other => warn!(
                "Ignoring override for '{}': expected a string, got {}",
                channel_id, other
            ),
        }
    }
    overrides
}
