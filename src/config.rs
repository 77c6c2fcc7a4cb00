//! Archive configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` at the top of
//! an archive. Stock defaults are overridden by whatever the file sets.
//!
//! ## Config File Location
//!
//! ```text
//! archive/
//! ├── config.toml              # Archive config (overrides stock defaults)
//! ├── index.md
//! ├── notes.md
//! └── notes/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_url = "/"               # URL prefix pages are served under
//! static_root = "/static/"     # URL prefix figures and documents are served under
//! sort_listings = true         # Sort directory listings alphabetically
//! new_page_suffix = ".md"      # Suffix for pages created without a file
//!
//! [licenses.cc-by]
//! url = "http://creativecommons.org/licenses/by/4.0/"
//! name = "Creative Commons Attribution"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. A new licence code is added alongside the stock
//! ones rather than replacing them:
//!
//! ```toml
//! [licenses.in-house]
//! url = "https://example.org/terms"
//! name = "Example Org terms of use"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::classify::PAGE_SUFFIXES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file looked up in the docroot.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Archive configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// URL prefix joined in front of every page address.
    pub base_url: String,
    /// URL prefix for figures and documents of paired directories.
    pub static_root: String,
    /// Sort directory listings alphabetically before classification.
    pub sort_listings: bool,
    /// Suffix given to a page file created by saving a page that had none.
    pub new_page_suffix: String,
    /// Licence codes recognized in a page's rights element.
    pub licenses: BTreeMap<String, License>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            static_root: "/static/".to_string(),
            sort_listings: true,
            new_page_suffix: ".md".to_string(),
            licenses: stock_licenses(),
        }
    }
}

impl ArchiveConfig {
    /// Defaults with the two URL prefixes replaced.
    pub fn with_urls(base_url: &str, static_root: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            static_root: static_root.to_string(),
            ..Self::default()
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_root.is_empty() {
            return Err(ConfigError::Validation(
                "static_root must not be empty".into(),
            ));
        }
        if !PAGE_SUFFIXES.contains(&self.new_page_suffix.as_str()) {
            return Err(ConfigError::Validation(format!(
                "new_page_suffix must be one of {}",
                PAGE_SUFFIXES.join(", ")
            )));
        }
        for (code, license) in &self.licenses {
            if license.url.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "licenses.{code}.url must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// A licence a rights value can name by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct License {
    pub url: String,
    pub name: String,
}

fn stock_licenses() -> BTreeMap<String, License> {
    [
        (
            "cc-by",
            "http://creativecommons.org/licenses/by/4.0/",
            "Creative Commons Attribution",
        ),
        (
            "cc-by-nc",
            "http://creativecommons.org/licenses/by-nc/4.0/",
            "Creative Commons Attribution-NonCommercial",
        ),
        (
            "cc-by-sa",
            "http://creativecommons.org/licenses/by-sa/4.0/",
            "Creative Commons Attribution-ShareAlike",
        ),
        (
            "cc-by-nc-sa",
            "http://creativecommons.org/licenses/by-nc-sa/4.0/",
            "Creative Commons Attribution-NonCommercial-ShareAlike",
        ),
        (
            "cc-by-nd",
            "http://creativecommons.org/licenses/by-nd/4.0/",
            "Creative Commons Attribution-NoDerivs",
        ),
        (
            "cc-by-nc-nd",
            "http://creativecommons.org/licenses/by-nc-nd/4.0/",
            "Creative Commons Attribution-NonCommercial-NoDerivs",
        ),
    ]
    .into_iter()
    .map(|(code, url, name)| {
        (
            code.to_string(),
            License {
                url: url.to_string(),
                name: name.to_string(),
            },
        )
    })
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ArchiveConfig::default()).expect("default config must serialize")
}

/// Deep-merge two TOML values. Tables merge key by key; any other overlay
/// value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `config.toml` from `dir` without applying defaults. `None` when the
/// file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ArchiveConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ArchiveConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration of the archive at `docroot`.
pub fn load_config(docroot: &Path) -> Result<ArchiveConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(docroot)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# flatnote Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the top of the archive, beside the root index page.
# Unknown keys will cause an error.

# URL prefix every page address is joined onto.
base_url = "/"

# URL prefix figures and documents are served under. A page's figures are
# linked as <static_root>/<base_url>/<address>/<filename>.
static_root = "/static/"

# Sort directory listings alphabetically. Children, siblings and the
# previous/next links all follow listing order.
sort_listings = true

# Suffix for the file created when a page without one is saved.
# One of: .txt .md .mkd .markdown .html .htm .xhtml
new_page_suffix = ".md"

# ---------------------------------------------------------------------------
# Licences
# ---------------------------------------------------------------------------
# A page whose DC.Rights value is one of these codes gets a link to the
# licence. Add tables to recognize more codes.
[licenses.cc-by]
url = "http://creativecommons.org/licenses/by/4.0/"
name = "Creative Commons Attribution"

[licenses.cc-by-nc]
url = "http://creativecommons.org/licenses/by-nc/4.0/"
name = "Creative Commons Attribution-NonCommercial"

[licenses.cc-by-sa]
url = "http://creativecommons.org/licenses/by-sa/4.0/"
name = "Creative Commons Attribution-ShareAlike"

[licenses.cc-by-nc-sa]
url = "http://creativecommons.org/licenses/by-nc-sa/4.0/"
name = "Creative Commons Attribution-NonCommercial-ShareAlike"

[licenses.cc-by-nd]
url = "http://creativecommons.org/licenses/by-nd/4.0/"
name = "Creative Commons Attribution-NoDerivs"

[licenses.cc-by-nc-nd]
url = "http://creativecommons.org/licenses/by-nc-nd/4.0/"
name = "Creative Commons Attribution-NonCommercial-NoDerivs"
"##
}
