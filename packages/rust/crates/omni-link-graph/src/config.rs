//! Link-graph settings: recognized note suffixes and execution policy.
//!
//! Settings live under the `link_graph` key of one or more YAML files, merged
//! in order (later files win), then environment overrides are applied.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::error::LinkGraphError;

pub(crate) const LINK_GRAPH_FILE_TYPES_ENV: &str = "OMNI_LINK_GRAPH_FILE_TYPES";
pub(crate) const LINK_GRAPH_SEQUENTIAL_ENV: &str = "OMNI_LINK_GRAPH_SEQUENTIAL";
pub(crate) const DEFAULT_FILE_TYPE: &str = "md";

/// How the driver schedules per-note builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// One note at a time, in listing order; errors are reported in that order.
    #[default]
    Sequential,
    /// All reads launched together; results merged as they complete.
    Concurrent,
}

impl ExecutionPolicy {
    /// Policy from the `sequential` switch.
    #[must_use]
    pub const fn from_sequential(sequential: bool) -> Self {
        if sequential {
            Self::Sequential
        } else {
            Self::Concurrent
        }
    }
}

/// Resolved link-graph settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraphSettings {
    /// Recognized note suffixes without the leading dot (default `["md"]`).
    pub file_types: Vec<String>,
    /// Scheduling of per-note builds.
    pub policy: ExecutionPolicy,
    /// Also follow local `[text](path.md)` links.
    pub include_markdown_links: bool,
}

impl Default for LinkGraphSettings {
    fn default() -> Self {
        Self {
            file_types: vec![DEFAULT_FILE_TYPE.to_string()],
            policy: ExecutionPolicy::Sequential,
            include_markdown_links: false,
        }
    }
}

/// Trim, drop leading dots, lowercase and dedup suffixes; empty input falls
/// back to `md`.
#[must_use]
pub fn normalize_file_types(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let out: Vec<String> = raw
        .iter()
        .map(|item| item.trim().trim_start_matches('.').to_lowercase())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.clone()))
        .collect();
    if out.is_empty() {
        vec![DEFAULT_FILE_TYPE.to_string()]
    } else {
        out
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    deep_merge(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn setting_value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => parse_bool(text),
        Value::Number(number) => number.as_i64().map(|v| v != 0),
        _ => None,
    }
}

fn get_setting_value<'a>(settings: &'a Value, dotted_key: &str) -> Option<&'a Value> {
    let mut cursor = settings;
    for segment in dotted_key.split('.') {
        match cursor {
            Value::Mapping(map) => {
                let key = Value::String(segment.to_string());
                cursor = map.get(&key)?;
            }
            _ => return None,
        }
    }
    Some(cursor)
}

fn get_setting_bool(settings: &Value, dotted_key: &str) -> Option<bool> {
    get_setting_value(settings, dotted_key).and_then(setting_value_to_bool)
}

fn get_setting_string_list(settings: &Value, dotted_key: &str) -> Option<Vec<String>> {
    match get_setting_value(settings, dotted_key)? {
        Value::String(single) => Some(split_list(single)),
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text.trim().to_string()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                })
                .filter(|item| !item.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl LinkGraphSettings {
    /// Read settings from a merged YAML document (`link_graph.*` keys).
    #[must_use]
    pub fn from_settings_value(settings: &Value) -> Self {
        let defaults = Self::default();
        let file_types = get_setting_string_list(settings, "link_graph.file_types")
            .map_or(defaults.file_types, |raw| normalize_file_types(&raw));
        let policy = get_setting_bool(settings, "link_graph.sequential")
            .map_or(defaults.policy, ExecutionPolicy::from_sequential);
        let include_markdown_links =
            get_setting_bool(settings, "link_graph.include_markdown_links")
                .unwrap_or(defaults.include_markdown_links);
        Self {
            file_types,
            policy,
            include_markdown_links,
        }
    }

    /// Parse settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`LinkGraphError::Config`] when the text is not valid YAML.
    pub fn from_yaml_str(content: &str) -> Result<Self, LinkGraphError> {
        let value = serde_yaml::from_str::<Value>(content)
            .map_err(|e| LinkGraphError::Config(e.to_string()))?;
        Ok(Self::from_settings_value(&value))
    }

    /// Merge YAML files in order (later ones win) and read settings.
    ///
    /// Missing or unparsable files are skipped with a warning.
    #[must_use]
    pub fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut merged = Value::Mapping(Mapping::new());
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                log::debug!("link_graph config not found: {}", path.display());
                continue;
            }
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Failed to read link_graph config {}: {e}", path.display());
                    continue;
                }
            };
            match serde_yaml::from_str::<Value>(&content) {
                Ok(value) => deep_merge(&mut merged, value),
                Err(e) => log::warn!("Failed to parse link_graph config {}: {e}", path.display()),
            }
        }
        Self::from_settings_value(&merged)
    }

    /// Apply overrides from a variable lookup (`OMNI_LINK_GRAPH_FILE_TYPES`,
    /// `OMNI_LINK_GRAPH_SEQUENTIAL`). Unparsable values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(LINK_GRAPH_FILE_TYPES_ENV) {
            let items = split_list(&raw);
            if !items.is_empty() {
                self.file_types = normalize_file_types(&items);
            }
        }
        if let Some(raw) = lookup(LINK_GRAPH_SEQUENTIAL_ENV) {
            match parse_bool(&raw) {
                Some(flag) => self.policy = ExecutionPolicy::from_sequential(flag),
                None => log::warn!("Ignoring {LINK_GRAPH_SEQUENTIAL_ENV}={raw}: not a boolean"),
            }
        }
        self
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }
}
