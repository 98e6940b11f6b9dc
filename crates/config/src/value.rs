//! Configuration values and the deep merge engine.
//!
//! Every configuration layer (built-in defaults, user settings, per-call
//! overrides, resolved roles) is a [`ConfigMap`]. Layers are combined with
//! [`merge_deep`], left to right, so later layers win.
//!
//! Merge rule:
//! - a `Map` value merges recursively into the target's child map
//!   (created when absent);
//! - any other value (scalars and lists alike) replaces the target wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nested configuration mapping.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// Render a scalar the way a user would write it; `None` for containers.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::Integer(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::List(_) | ConfigValue::Map(_) => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

/// Look up a value by a dotted path (`"options.selection_boundary"`).
pub fn get_path<'a>(map: &'a ConfigMap, path: &str) -> Option<&'a ConfigValue> {
    let mut parts = path.split('.');
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.as_map()?.get(part)?;
    }
    Some(current)
}

/// Look up a string by dotted path; missing or non-string values yield `""`.
pub fn get_str<'a>(map: &'a ConfigMap, path: &str) -> &'a str {
    get_path(map, path).and_then(ConfigValue::as_str).unwrap_or("")
}

/// Merge `source` into `target` in place.
pub fn merge_into(target: &mut ConfigMap, source: &ConfigMap) {
    for (key, value) in source {
        match value {
            ConfigValue::Map(child) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| ConfigValue::Map(ConfigMap::new()));
                match slot {
                    ConfigValue::Map(target_child) => merge_into(target_child, child),
                    // A scalar or list cannot absorb a map; the map takes its place.
                    other => *other = ConfigValue::Map(child.clone()),
                }
            }
            ConfigValue::Bool(_)
            | ConfigValue::Integer(_)
            | ConfigValue::Float(_)
            | ConfigValue::String(_)
            | ConfigValue::List(_) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Deep-merge a sequence of layers, later layers taking precedence.
pub fn merge_deep<'a, I>(layers: I) -> ConfigMap
where
    I: IntoIterator<Item = &'a ConfigMap>,
{
    let mut result = ConfigMap::new();
    for layer in layers {
        merge_into(&mut result, layer);
    }
    result
}

/// Build a [`ConfigMap`] from a JSON object.
pub fn from_json(value: serde_json::Value) -> Result<ConfigMap, serde_json::Error> {
    serde_json::from_value(value)
}
