//! Locally cached theme left behind by older overlay builds.
//!
//! The file is a JSON object of cached entries. The theme sits under
//! [`LEGACY_THEME_KEY`], either as an object or as the JSON text of one.

use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::theme::RawColors;

pub const LEGACY_THEME_KEY: &str = "nn-hud-theme-colors";

/// Extracts the cached color map from the file contents.
pub fn parse_legacy_store(text: &str) -> Option<RawColors> {
    let store: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("[legacy] unreadable theme cache: {e}");
            return None;
        }
    };
    match store.get(LEGACY_THEME_KEY)? {
        Value::Object(map) => Some(map.clone()),
        Value::String(inner) => match serde_json::from_str::<Value>(inner) {
            Ok(Value::Object(map)) => Some(map),
            _ => {
                warn!("[legacy] cached theme is not an object");
                None
            }
        },
        _ => None,
    }
}

/// Reads the cache once. Missing or broken files yield `None`.
pub async fn read_legacy_theme(path: &Path) -> Option<RawColors> {
    match fs::read_to_string(path).await {
        Ok(text) => parse_legacy_store(&text),
        Err(e) => {
            debug!("[legacy] no theme cache at {}: {e}", path.display());
            None
        }
    }
}
