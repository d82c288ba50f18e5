/*!
 * YAML frontmatter handling.
 *
 * Frontmatter is kept as an ordered YAML mapping so that reconstruction
 * preserves every key in its original position. Only keys on the caller's
 * allow-list are ever exposed for translation or replaced.
 */

use serde_json::{Map as JsonMap, Value as JsonValue};
use serde_yaml::{Mapping, Value as YamlValue};

use crate::errors::DocumentError;

/// Sentinel line delimiting the frontmatter block
pub const FRONTMATTER_SENTINEL: &str = "---";

/// Keys translated when no allow-list is configured
pub const DEFAULT_TRANSLATABLE_KEYS: [&str; 3] = ["title", "description", "summary"];

/// Parsed frontmatter mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    entries: Mapping,
}

impl Frontmatter {
    /// Create an empty frontmatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the YAML text found between the two sentinels
    pub fn parse(block: &str) -> Result<Self, DocumentError> {
        if block.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: YamlValue = serde_yaml::from_str(block)
            .map_err(|e| DocumentError::MalformedFrontmatter(e.to_string()))?;

        match value {
            YamlValue::Null => Ok(Self::new()),
            YamlValue::Mapping(entries) => Ok(Self { entries }),
            other => Err(DocumentError::FrontmatterNotMapping(yaml_type_name(&other).to_string())),
        }
    }

    /// Whether the mapping has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up a value by string key
    pub fn get(&self, key: &str) -> Option<&YamlValue> {
        self.entries.get(key)
    }

    /// Look up a string value by key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(YamlValue::as_str)
    }

    /// Set a value, keeping the key's position if it already exists
    pub fn insert(&mut self, key: &str, value: YamlValue) {
        self.entries.insert(YamlValue::String(key.to_string()), value);
    }

    /// String keys in document order
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    /// Allow-listed entries, as a JSON object for the translation prompt
    pub fn translatable(&self, allow_list: &[String]) -> JsonMap<String, JsonValue> {
        let mut subset = JsonMap::new();
        for (key, value) in &self.entries {
            let Some(key) = key.as_str() else { continue };
            if !allow_list.iter().any(|allowed| allowed == key) {
                continue;
            }
            if let Ok(json) = serde_json::to_value(value) {
                subset.insert(key.to_string(), json);
            }
        }
        subset
    }

    /// Copy of this frontmatter with allow-listed values replaced.
    ///
    /// Keys that are not allow-listed or not present in the original are
    /// ignored; every original key survives.
    pub fn with_translations(
        &self,
        translations: &JsonMap<String, JsonValue>,
        allow_list: &[String],
    ) -> Result<Self, DocumentError> {
        let mut updated = self.clone();
        for (key, value) in translations {
            if !allow_list.iter().any(|allowed| allowed == key) || self.get(key).is_none() {
                continue;
            }
            let yaml = serde_yaml::to_value(value).map_err(|e| DocumentError::Serialize(e.to_string()))?;
            updated.insert(key, yaml);
        }
        Ok(updated)
    }

    /// Serialize to YAML, empty string for an empty mapping
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        if self.entries.is_empty() {
            return Ok(String::new());
        }
        let yaml = serde_yaml::to_string(&self.entries).map_err(|e| DocumentError::Serialize(e.to_string()))?;
        if yaml.ends_with('\n') {
            Ok(yaml)
        } else {
            Ok(format!("{}\n", yaml))
        }
    }

    /// Render the complete sentinel-delimited block
    pub fn to_block(&self) -> Result<String, DocumentError> {
        Ok(format!(
            "{sentinel}\n{body}{sentinel}",
            sentinel = FRONTMATTER_SENTINEL,
            body = self.to_yaml()?
        ))
    }
}

fn yaml_type_name(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}
