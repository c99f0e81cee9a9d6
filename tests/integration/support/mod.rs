use callsynth::config::{
    load_document, resolve, resolve_documents, ConfigSources, DirectOverrides, EffectiveConfig,
};
use callsynth::record::CallRecord;
use callsynth::ConfigError;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub fn config_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join(name)
}

pub fn base_document() -> Value {
    load_document(&config_path("base.yml")).expect("shipped base configuration parses")
}

pub fn resolve_layers(
    layers: Vec<Value>,
    direct: &DirectOverrides,
) -> Result<EffectiveConfig, ConfigError> {
    resolve_documents(base_document(), layers, direct)
}

/// Shipped base configuration without any override layer.
pub fn base_config() -> EffectiveConfig {
    let sources = ConfigSources {
        base: config_path("base.yml"),
        overrides: Vec::new(),
    };
    resolve(&sources, &DirectOverrides::default()).expect("shipped base configuration resolves")
}

pub fn base_config_with(direct: DirectOverrides) -> EffectiveConfig {
    resolve_layers(Vec::new(), &direct).expect("base configuration resolves with overrides")
}

/// Two buckets at 50% each, 10 calls per day, no outages and no weekday
/// or scale factors.
pub fn two_bucket_document() -> Value {
    let mut doc = base_document();
    let attributes = doc["attributes"]
        .as_object_mut()
        .expect("attributes is a mapping");
    for spec in attributes.values_mut() {
        if let Some(adjust) = spec.get_mut("adjust").and_then(Value::as_object_mut) {
            adjust.remove("time_of_day_bucket");
        }
    }
    let layer = json!({
        "volume": {
            "baseline_weekday": 10,
            "baseline_weekend": 10,
            "scale": 1.0,
            "app_issue_multiplier": 1.0
        },
        "calendar": {
            "time_buckets": ["Morning", "Afternoon"],
            "bucket_shares": {
                "weekday": [["Morning", 0.5], ["Afternoon", 0.5]],
                "weekend": [["Morning", 0.5], ["Afternoon", 0.5]]
            },
            "weekday_factors": {
                "Mon": 1.0, "Tue": 1.0, "Wed": 1.0, "Thu": 1.0,
                "Fri": 1.0, "Sat": 1.0, "Sun": 1.0
            },
            "outages": { "count": [[0, 1.0]] }
        },
        "team": {
            "shifts": [
                { "name": "Early", "buckets": ["Morning"] },
                { "name": "Mid", "buckets": ["Morning", "Afternoon"] },
                { "name": "Late", "buckets": ["Afternoon"] }
            ]
        }
    });
    callsynth::config::merge_into(&mut doc, layer);
    doc
}

pub fn two_bucket_config() -> EffectiveConfig {
    resolve_documents(two_bucket_document(), Vec::new(), &DirectOverrides::default())
        .expect("two-bucket configuration resolves")
}

/// Every record file under `root`, keyed by `<date>/<file>`.
pub fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.expect("walk output tree");
        if entry.file_type().is_file() {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .replace('\\', "/");
            let bytes = fs::read(entry.path()).expect("read output file");
            files.push((relative, bytes));
        }
    }
    files
}

pub fn read_records(root: &Path) -> Vec<CallRecord> {
    read_tree(root)
        .into_iter()
        .filter(|(path, _)| !path.starts_with("_meta/"))
        .map(|(path, bytes)| {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|e| panic!("{path} is not a call record: {e}"))
        })
        .collect()
}
