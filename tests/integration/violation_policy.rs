use super::support::{read_records, resolve_layers};
use super::IntegrationHarness;
use callsynth::config::{DirectOverrides, EffectiveConfig, ViolationPolicy};
use callsynth::{GenerationError, GenerationResult};
use serde_json::json;

/// Premium callers asking about cards or loans while premium products are
/// pinned to Giro: no product value satisfies every rule.
fn contradictory_config(direct: DirectOverrides) -> EffectiveConfig {
    let layer = json!({
        "attributes": {
            "customer_segment": { "weights": [["Premium", 1.0], ["Standard", 0.0]] },
            "intent": {
                "weights": [
                    ["Card Block", 1.0],
                    ["Online-Banking", 0.0],
                    ["Transfer", 0.0],
                    ["Account Inquiry", 0.0],
                    ["Fees", 0.0],
                    ["Technical Support", 0.0],
                    ["Loan", 0.0]
                ]
            },
            "product": {
                "constraints": [
                    {
                        "field": "intent",
                        "allowed": {
                            "Card Block": ["Credit Card"],
                            "Transfer": ["Transfer", "Giro"],
                            "Loan": ["Loan", "Mortgage"]
                        }
                    },
                    { "field": "customer_segment", "allowed": { "Premium": ["Giro"] } }
                ]
            }
        }
    });
    let direct = DirectOverrides {
        outage_count: Some(0),
        ..direct
    };
    resolve_layers(vec![layer], &direct).expect("contradictory rules still resolve")
}

#[test]
fn fail_fast_aborts_on_first_violation() {
    let harness = IntegrationHarness::new();
    let config = contradictory_config(DirectOverrides {
        on_violation: Some(ViolationPolicy::FailFast),
        ..DirectOverrides::default()
    });
    match harness.run("fail-fast", &config, 3, "2025-09-02", "2025-09-02") {
        Err(GenerationError::Schema(violation)) => {
            assert_eq!(violation.field, "product");
            assert!(violation.expected.contains("when"), "{}", violation.expected);
        }
        other => panic!("expected a schema violation, got {other:?}"),
    }
}

#[test]
fn collect_rejects_records_and_reports_them() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = contradictory_config(DirectOverrides {
        on_violation: Some(ViolationPolicy::Collect),
        ..DirectOverrides::default()
    });
    let summary = harness.run("collect", &config, 3, "2025-09-02", "2025-09-03")?;
    let report = &summary.report;

    assert!(report.calls_planned > 0);
    assert_eq!(report.calls_written, 0);
    assert_eq!(report.calls_rejected, report.calls_planned);
    assert!(report.violations_per_field.get("product").is_some_and(|n| *n > 0));
    assert!(report.violations.iter().all(|v| !v.call_id.is_empty()));
    assert!(read_records(&harness.out_dir("collect")).is_empty());
    Ok(())
}

#[test]
fn disabled_validation_writes_every_planned_call() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = contradictory_config(DirectOverrides {
        validate: Some(false),
        ..DirectOverrides::default()
    });
    let summary = harness.run("unchecked", &config, 3, "2025-09-02", "2025-09-02")?;

    assert!(!summary.report.validated);
    assert_eq!(summary.report.calls_written, summary.report.calls_planned);
    assert!(summary.report.violations.is_empty());
    assert_eq!(
        read_records(&harness.out_dir("unchecked")).len() as u64,
        summary.report.calls_written
    );
    Ok(())
}
