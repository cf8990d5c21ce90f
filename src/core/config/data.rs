use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::pricing::PricingEntry;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Model id sent with every request (e.g., "gpt-4o")
    pub model: Option<String>,
    /// OpenAI-compatible API root, without the `/chat/completions` suffix
    pub base_url: Option<String>,
    /// System instruction sent ahead of the conversation
    pub personality: Option<String>,
    /// Second currency shown next to USD (e.g., "PLN")
    pub currency_code: Option<String>,
    /// Units of `currency_code` per USD
    pub currency_rate: Option<f64>,
    /// Extra or replacement model prices, per million tokens
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing: Vec<PricingEntry>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
