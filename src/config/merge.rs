use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Supported document syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => DocumentFormat::Toml,
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parses a configuration document and lowers it to a JSON tree.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    source_name: &str,
) -> Result<Value, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        source_name: source_name.to_string(),
        message,
    };
    let value = match format {
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            serde_json::to_value(yaml).map_err(|e| parse_err(e.to_string()))?
        }
        DocumentFormat::Toml => {
            let table: toml::Value = toml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))?
        }
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
    };
    match value {
        // an empty YAML file is a valid, empty layer
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(parse_err("top level must be a mapping".into())),
    }
}

pub fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(
        &text,
        DocumentFormat::from_path(path),
        &path.display().to_string(),
    )
}

/// Deep-merges `overlay` into `base`. Objects merge key by key; any other
/// value, lists included, replaces the base value wholesale.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let nested = value.is_object() && base_map.get(&key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = base_map.get_mut(&key) {
                        merge_into(existing, value);
                    }
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Writes `value` at a dotted path, creating intermediate objects.
pub fn set_path(doc: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *doc = value;
        return;
    };
    let mut node = doc;
    for part in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_are_replaced_not_concatenated() {
        let mut base = json!({
            "attributes": {
                "channel": { "weights": [["voice", 0.8], ["text", 0.2]], "nullable": false }
            }
        });
        merge_into(
            &mut base,
            json!({ "attributes": { "channel": { "weights": [["voice", 1.0]] } } }),
        );
        assert_eq!(
            base["attributes"]["channel"]["weights"],
            json!([["voice", 1.0]])
        );
        assert_eq!(base["attributes"]["channel"]["nullable"], json!(false));
    }

    #[test]
    fn set_path_creates_missing_objects() {
        let mut doc = json!({ "calendar": {} });
        set_path(&mut doc, &["calendar", "outages", "count_override"], json!(3));
        assert_eq!(doc["calendar"]["outages"]["count_override"], json!(3));
    }

    #[test]
    fn empty_yaml_is_an_empty_layer() {
        let doc = parse_document("", DocumentFormat::Yaml, "empty.yml").unwrap();
        assert_eq!(doc, json!({}));
    }
}
