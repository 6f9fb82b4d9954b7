use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlateError};
use crate::model::Scope;

/// Keys the controller keeps for itself
pub const RESERVED_KEYS: &[char] = &['u', 'q', 'h', 'p', 'n'];

/// What an annotation records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Labels from a fixed set on single spans
    #[default]
    Categorical,
    /// Unlabelled links between two spans
    Link,
    /// Free-text labels on single spans
    Text,
}

impl AnnotationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Categorical => "categorical",
            AnnotationType::Link => "link",
            AnnotationType::Text => "text",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationType {
    type Err = SlateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "categorical" => Ok(AnnotationType::Categorical),
            "link" => Ok(AnnotationType::Link),
            "text" => Ok(AnnotationType::Text),
            other => Err(SlateError::UnknownAnnotationType(other.to_string())),
        }
    }
}

/// A label and the key that toggles it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub name: String,
    pub key: char,
    #[serde(default = "default_start_mark")]
    pub start_mark: String,
    #[serde(default = "default_end_mark")]
    pub end_mark: String,
}

fn default_start_mark() -> String {
    "{".to_string()
}

fn default_end_mark() -> String {
    "}".to_string()
}

impl LabelConfig {
    pub fn new(name: impl Into<String>, key: char) -> Self {
        Self {
            name: name.into(),
            key,
            start_mark: default_start_mark(),
            end_mark: default_end_mark(),
        }
    }

    /// Parse a label list with one `LABEL [key [start-mark [end-mark]]]`
    /// entry per line. Keys default to 1, 2, ... in order.
    pub fn parse_list(text: &str) -> Result<Vec<LabelConfig>> {
        let mut labels: Vec<LabelConfig> = Vec::new();
        for line in text.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some(name) = parts.first() else {
                continue;
            };

            let default_key = (labels.len() + 1).to_string();
            let key_text = parts.get(1).copied().unwrap_or(&default_key);
            let mut chars = key_text.chars();
            let key = match (chars.next(), chars.next()) {
                (Some(key), None) => key,
                _ => {
                    return Err(SlateError::KeyBinding(format!(
                        "This key is too long: {}",
                        key_text
                    )))
                }
            };
            if RESERVED_KEYS.contains(&key) {
                return Err(SlateError::KeyBinding(format!(
                    "This key is a reserved value: {}",
                    key
                )));
            }
            if let Some(existing) = labels.iter().find(|l| l.key == key) {
                return Err(SlateError::KeyBinding(format!(
                    "Key {} is used by both {} and {}",
                    key, existing.name, name
                )));
            }

            let mut label = LabelConfig::new(*name, key);
            if let Some(start) = parts.get(2) {
                label.start_mark = start.to_string();
            }
            if let Some(end) = parts.get(3) {
                label.end_mark = end.to_string();
            }
            labels.push(label);
        }
        Ok(labels)
    }
}

/// Settings shared by every file in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scope: Scope,
    pub annotation_type: AnnotationType,
    /// Read and replace output files that already exist
    pub overwrite: bool,
    /// Never change or save annotations
    pub readonly: bool,
    pub labels: Vec<LabelConfig>,
    pub prevent_self_links: bool,
    pub prevent_forward_links: bool,
    /// Mark every linked span when rendering
    pub show_linked: bool,
    /// Steps between automatic saves in categorical mode
    pub save_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scope: Scope::Token,
            annotation_type: AnnotationType::Categorical,
            overwrite: false,
            readonly: false,
            labels: vec![
                LabelConfig::new("a", 'a'),
                LabelConfig::new("s", 's'),
                LabelConfig::new("d", 'd'),
                LabelConfig::new("v", 'v'),
            ],
            prevent_self_links: false,
            prevent_forward_links: false,
            show_linked: true,
            save_interval: 100,
        }
    }
}

impl Config {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SlateError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_known_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn label_for_key(&self, key: char) -> Option<&LabelConfig> {
        self.labels.iter().find(|l| l.key == key)
    }
}
