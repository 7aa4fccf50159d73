//! Shared sessiontree configuration types.
//!
//! The CLI and any embedding renderer read `sessiontree.toml` using these
//! types. Every nested key has a default; user documents are deep-merged over
//! the defaults so a file may override a single threshold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "sessiontree.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Top-level configuration (persisted as `sessiontree.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub tree: TreeSettings,
    #[serde(default)]
    pub stream: StreamSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Content at or below both inline limits stays inline.
    #[serde(default = "default_inline_max_lines")]
    pub inline_max_lines: usize,
    #[serde(default = "default_inline_max_chars")]
    pub inline_max_chars: usize,
    /// Rich-display tier: file content beyond it and generic text reaching it pop up.
    #[serde(default = "default_rich_display_lines")]
    pub rich_display_lines: usize,
    #[serde(default = "default_rich_display_chars")]
    pub rich_display_chars: usize,
    /// Payloads larger than this skip the JSON validation attempt.
    #[serde(default = "default_json_validation_max_bytes")]
    pub json_validation_max_bytes: usize,
    /// Tool name prefixes that mark remote/API-style tools.
    #[serde(default = "default_api_tool_prefixes")]
    pub api_tool_prefixes: Vec<String>,
    /// Advisory only: slower classifications are logged, never aborted.
    #[serde(default = "default_classification_budget_ms")]
    pub classification_budget_ms: u64,
    /// Content-type tag (e.g. `FILE_CONTENT`) to popup strategy name.
    #[serde(default = "default_strategies")]
    pub strategies: BTreeMap<String, String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            inline_max_lines: default_inline_max_lines(),
            inline_max_chars: default_inline_max_chars(),
            rich_display_lines: default_rich_display_lines(),
            rich_display_chars: default_rich_display_chars(),
            json_validation_max_bytes: default_json_validation_max_bytes(),
            api_tool_prefixes: default_api_tool_prefixes(),
            classification_budget_ms: default_classification_budget_ms(),
            strategies: default_strategies(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSettings {
    #[serde(default = "default_true")]
    pub expand_messages: bool,
    #[serde(default = "default_false")]
    pub expand_tool_calls: bool,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            expand_messages: true,
            expand_tool_calls: false,
            label_max_chars: default_label_max_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ViewerConfig {
    /// Parse a user document and deep-merge it over the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let overlay: toml::Table = source.parse()?;
        let mut merged = defaults_value()?;
        merge_toml(&mut merged, toml::Value::Table(overlay));
        finish(merged)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load config files in order (later files win); missing files are skipped.
pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<ViewerConfig, ConfigError> {
    let mut merged = defaults_value()?;
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: toml::Table = content.parse().map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        merge_toml(&mut merged, toml::Value::Table(overlay));
    }
    finish(merged)
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other overlay value replaces the base value.
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ViewerConfig::default())?)
}

fn finish(merged: toml::Value) -> Result<ViewerConfig, ConfigError> {
    let mut config: ViewerConfig = merged.try_into()?;
    apply_compat_fallbacks(&mut config);
    Ok(config)
}

/// Repair inconsistent threshold combinations after loading.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut ViewerConfig) -> bool {
    let classifier = &mut config.classifier;
    let mut changed = false;

    if classifier.rich_display_lines < classifier.inline_max_lines {
        classifier.rich_display_lines = classifier.inline_max_lines;
        changed = true;
    }
    if classifier.rich_display_chars < classifier.inline_max_chars {
        classifier.rich_display_chars = classifier.inline_max_chars;
        changed = true;
    }
    if config.tree.label_max_chars < 8 {
        config.tree.label_max_chars = 8;
        changed = true;
    }

    changed
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_inline_max_lines() -> usize {
    2
}
fn default_inline_max_chars() -> usize {
    80
}
fn default_rich_display_lines() -> usize {
    5
}
fn default_rich_display_chars() -> usize {
    200
}
fn default_json_validation_max_bytes() -> usize {
    100 * 1024
}
fn default_api_tool_prefixes() -> Vec<String> {
    vec!["mcp__".to_string()]
}
fn default_classification_budget_ms() -> u64 {
    50
}
fn default_label_max_chars() -> usize {
    80
}
fn default_poll_interval_ms() -> u64 {
    500
}

pub const DEFAULT_STRATEGIES: &[(&str, &str)] = &[
    ("TOOL_INPUT", "json_popup_always"),
    ("ERROR_CONTENT", "error_popup_highlighted"),
    ("COMMAND_OUTPUT", "terminal_style_popup"),
    ("JSON_API_RESPONSE", "json_popup_with_folding"),
    ("FILE_CONTENT", "syntax_highlighted_popup"),
    ("GENERIC_TEXT", "rich_popup"),
    ("PLAIN_TEXT", "rich_popup"),
];

pub fn default_strategies() -> BTreeMap<String, String> {
    DEFAULT_STRATEGIES
        .iter()
        .map(|(tag, strategy)| ((*tag).to_string(), (*strategy).to_string()))
        .collect()
}
