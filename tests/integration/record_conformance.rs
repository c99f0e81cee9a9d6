use super::support::{base_config, base_config_with, read_records, read_tree, resolve_layers};
use super::IntegrationHarness;
use callsynth::config::DirectOverrides;
use callsynth::record::{CallSchema, RecordValidator};
use callsynth::GenerationResult;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

#[test]
fn records_carry_exactly_the_schema_fields() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    harness.run("fields", &config, 31, "2025-09-01", "2025-09-03")?;
    let schema = CallSchema::from_config(&config);
    let expected: BTreeSet<&str> = schema.field_names().collect();

    let tree = read_tree(&harness.out_dir("fields"));
    let records: Vec<_> = tree
        .iter()
        .filter(|(path, _)| !path.starts_with("_meta/"))
        .collect();
    assert!(!records.is_empty());
    for (path, bytes) in records {
        let value: Value = serde_json::from_slice(bytes).expect("record is JSON");
        let keys: BTreeSet<&str> = value
            .as_object()
            .expect("record is an object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, expected, "{path}");
        let flags = value["compliance_flags"].as_object().expect("flags object");
        for status in flags.values() {
            assert!(status == "pass" || status == "fail", "{path}: {status}");
        }
    }
    Ok(())
}

#[test]
fn written_records_respect_attribute_rules() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config_with(DirectOverrides {
        outage_count: Some(1),
        ..DirectOverrides::default()
    });
    let summary = harness.run("rules", &config, 77, "2025-09-01", "2025-09-14")?;
    let outage_days: BTreeMap<_, _> = summary
        .report
        .days
        .iter()
        .map(|d| (d.date, d.outage))
        .collect();
    let records = read_records(&harness.out_dir("rules"));
    assert_eq!(records.len() as u64, summary.report.calls_written);

    let with_amount = ["Transfer", "Loan", "Mortgage"];
    for record in &records {
        let id = record.call_id;
        match record.product.as_deref() {
            Some(product) if with_amount.contains(&product) => {
                assert!(record.amount_bucket.is_some(), "{id}");
            }
            _ => assert!(record.amount_bucket.is_none(), "{id}"),
        }
        if record.intent == "Card Block" {
            assert_eq!(record.product.as_deref(), Some("Credit Card"), "{id}");
        }
        if !outage_days[&record.date] {
            assert_ne!(record.scenario, "Outage-related", "{id}");
        }
        assert_eq!(
            record.automation_action_present,
            record.automation_action_type.is_some(),
            "{id}"
        );
        if record.self_service_potential == "Low" {
            assert!(record.automation_action_type.is_none(), "{id}");
        }
        match record.region.as_str() {
            "GE" | "VD" => assert!(["FR", "DE"].contains(&record.language.as_str()), "{id}"),
            "TI" => assert!(["IT", "DE"].contains(&record.language.as_str()), "{id}"),
            _ => {}
        }
        if record.scenario == "Complaint Handling" {
            assert!(record.complaint_category.is_some(), "{id}");
        }
    }
    Ok(())
}

#[test]
fn numeric_fields_stay_in_range() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    harness.run("ranges", &config, 5, "2025-09-08", "2025-09-10")?;
    let ani = &config.settings.ani;

    for record in read_records(&harness.out_dir("ranges")) {
        assert!(record.ani.starts_with(&ani.country_code));
        let digits = &record.ani[ani.country_code.len()..];
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert!((ani.min_digits as usize..=ani.max_digits as usize).contains(&digits.len()));
        assert!((-1.0..=1.0).contains(&record.sentiment_score));
        assert!(record.nps_score <= 10);
        assert!((0.0..=100.0).contains(&record.silence_ratio));
        assert!((0.0..=100.0).contains(&record.script_adherence));
        assert!(record.awt >= 0.0 && record.hold_time >= 0.0);
    }
    Ok(())
}

#[test]
fn generated_records_pass_validation_against_their_context() {
    let config = base_config();
    let streams = callsynth::rng::StreamFactory::new(callsynth::rng::Seed::Int(3));
    let day = super::date("2025-09-02");
    let plan = callsynth::generator::plan_run(day, day, &config, &streams).expect("plan");
    let schema = CallSchema::from_config(&config);
    let validator = RecordValidator::new(&schema).expect("schema compiles");
    let calendar_day = &plan.calendar.days[0];

    for (position, slot) in plan.slots[0].iter().enumerate() {
        let (context, record) =
            callsynth::generator::generate_call(calendar_day, slot, position, &config, &streams);
        let value = serde_json::to_value(&record).expect("record serializes");
        let violations = validator.validate(&value, &config, &context);
        assert!(violations.is_empty(), "{violations:?}");
    }
}

#[test]
fn multi_intent_calls_keep_distinct_secondary_intents() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = resolve_layers(
        vec![json!({ "intent_count": [[3, 1.0]] })],
        &DirectOverrides::default(),
    )?;
    harness.run("three", &config, 12, "2025-09-01", "2025-09-02")?;
    let records = read_records(&harness.out_dir("three"));
    assert!(!records.is_empty());
    for record in &records {
        let extra = &record.secondary_intents;
        assert_eq!(extra.len(), 2, "{}", record.call_id);
        assert_ne!(extra[0], extra[1]);
        assert!(!extra.contains(&record.intent), "{}", record.call_id);
    }

    harness.run("mixed", &base_config(), 12, "2025-09-01", "2025-09-02")?;
    let counts: BTreeSet<usize> = read_records(&harness.out_dir("mixed"))
        .iter()
        .map(|r| r.secondary_intents.len())
        .collect();
    assert!(counts.contains(&0) && counts.len() > 1, "{counts:?}");
    Ok(())
}
