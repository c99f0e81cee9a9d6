use super::support::{base_document, config_path, resolve_layers};
use callsynth::config::{
    parse_document, resolve, resolve_documents, ConfigSources, DirectOverrides, DocumentFormat,
    ViolationPolicy,
};
use callsynth::ConfigError;
use serde_json::json;

fn resolve_with(layer: serde_json::Value) -> Result<callsynth::EffectiveConfig, ConfigError> {
    resolve_layers(vec![layer], &DirectOverrides::default())
}

#[test]
fn negative_weight_names_the_distribution() {
    let err = resolve_with(json!({
        "attributes": { "channel": { "weights": [["voice", -0.1], ["text", 1.0]] } }
    }))
    .unwrap_err();
    match err {
        ConfigError::NegativeWeight { key, option, .. } => {
            assert_eq!(key, "attributes.channel.weights");
            assert_eq!(option, "voice");
        }
        other => panic!("expected a negative weight error, got {other:?}"),
    }
}

#[test]
fn missing_required_section_is_rejected() {
    let mut doc = base_document();
    doc.as_object_mut().unwrap().remove("kpis");
    let err = resolve_documents(doc, Vec::new(), &DirectOverrides::default()).unwrap_err();
    assert!(
        matches!(&err, ConfigError::MissingSection { section } if section == "kpis"),
        "got {err:?}"
    );
}

#[test]
fn missing_attribute_table_is_rejected() {
    let mut doc = base_document();
    doc["attributes"].as_object_mut().unwrap().remove("region");
    let err = resolve_documents(doc, Vec::new(), &DirectOverrides::default()).unwrap_err();
    assert!(
        matches!(&err, ConfigError::MissingSection { section } if section == "attributes.region"),
        "got {err:?}"
    );
}

#[test]
fn unknown_keys_fail_resolution() {
    let err = resolve_with(json!({ "volume": { "baseline_weekdays": 10 } })).unwrap_err();
    match err {
        ConfigError::Parse { message, .. } => assert!(message.contains("baseline_weekdays")),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn dependency_cycle_is_rejected_at_resolution() {
    let err = resolve_with(json!({
        "attributes": {
            "customer_segment": {
                "adjust": { "intent": { "Loan": [["Premium", 0.2]] } }
            }
        }
    }))
    .unwrap_err();
    match err {
        ConfigError::DependencyCycle { fields } => {
            assert!(fields.contains(&"intent".to_string()));
            assert!(fields.contains(&"customer_segment".to_string()));
            assert_eq!(fields.first(), fields.last());
        }
        other => panic!("expected a dependency cycle, got {other:?}"),
    }
}

#[test]
fn unknown_references_name_the_key() {
    let err = resolve_with(json!({
        "attributes": {
            "product": {
                "constraints": [
                    { "field": "intent", "allowed": { "Card Block": ["Gold Card"] } }
                ]
            }
        }
    }))
    .unwrap_err();
    match err {
        ConfigError::UnknownReference { key, reference } => {
            assert_eq!(key, "attributes.product.constraints[0].allowed.Card Block");
            assert_eq!(reference, "Gold Card");
        }
        other => panic!("expected an unknown reference, got {other:?}"),
    }
}

#[test]
fn required_record_fields_cannot_be_nullable() {
    let layer = json!({ "attributes": { "channel": { "nullable": true } } });
    let err = resolve_with(layer).unwrap_err();
    assert!(
        matches!(
            &err,
            ConfigError::InvalidValue { key, .. } if key == "attributes.channel.nullable"
        ),
        "got {err:?}"
    );
}

#[test]
fn negative_volume_multiplier_is_reported_not_clamped() {
    let config = resolve_with(json!({ "volume": { "scale": -1.0 } }))
        .expect("a negative scale is only detected when volumes are allocated");
    let harness = super::IntegrationHarness::new();
    let err = harness
        .run("negative", &config, 1, "2025-09-01", "2025-09-01")
        .unwrap_err();
    assert!(
        matches!(err, callsynth::GenerationError::Config(ConfigError::NegativeVolume { .. })),
        "got {err:?}"
    );
}

#[test]
fn layers_apply_in_order_and_direct_overrides_win() {
    let sources = ConfigSources {
        base: config_path("base.yml"),
        overrides: vec![config_path("overrides.yml")],
    };
    let direct = DirectOverrides {
        outage_count: Some(2),
        validate: Some(false),
        on_violation: Some(ViolationPolicy::Collect),
    };
    let config = resolve(&sources, &direct).unwrap();

    assert_eq!(config.settings.calendar.outages.app_issue_days_after, 2);
    assert_eq!(config.settings.calendar.outages.count_override, Some(2));
    assert!(!config.settings.run.validate);
    assert_eq!(config.settings.run.on_violation, ViolationPolicy::Collect);
    let channel = config.attribute(callsynth::config::CategoricalField::Channel);
    assert_eq!(channel.weights.weight_of(&"text".to_string()), Some(0.35));
    // the merged document records the direct overrides
    assert_eq!(config.document["calendar"]["outages"]["count_override"], json!(2));
    assert_eq!(config.document["run"]["on_violation"], json!("collect"));
}

#[test]
fn toml_layers_merge_like_yaml() {
    let layer = parse_document(
        "[volume]\nbaseline_weekday = 50.0\n",
        DocumentFormat::Toml,
        "inline.toml",
    )
    .unwrap();
    let config = resolve_layers(vec![layer], &DirectOverrides::default()).unwrap();
    assert_eq!(config.settings.volume.baseline_weekday, 50.0);
    assert_eq!(config.settings.volume.baseline_weekend, 120.0);
}

#[test]
fn unreadable_base_is_a_read_error() {
    let sources = ConfigSources {
        base: config_path("does-not-exist.yml"),
        overrides: Vec::new(),
    };
    let err = resolve(&sources, &DirectOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
}
