use super::support::{base_config, read_records, read_tree, two_bucket_config};
use super::IntegrationHarness;
use callsynth::generator::generate;
use callsynth::GenerationResult;
use std::collections::{BTreeMap, BTreeSet};

#[test]
fn identical_seed_and_config_reproduce_output_bytes() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    harness.run("first", &config, 7, "2025-09-01", "2025-09-07")?;
    harness.run("second", &config, 7, "2025-09-01", "2025-09-07")?;

    let first = read_tree(&harness.out_dir("first"));
    let second = read_tree(&harness.out_dir("second"));
    assert!(first.len() > 6, "expected metadata plus records");
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn worker_count_does_not_change_output() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    let mut single = harness.options("single", 99, "2025-10-06", "2025-10-10");
    single.workers = Some(1);
    let mut wide = harness.options("wide", 99, "2025-10-06", "2025-10-10");
    wide.workers = Some(4);
    generate(&single, &config)?;
    generate(&wide, &config)?;

    assert_eq!(
        read_tree(&harness.out_dir("single")),
        read_tree(&harness.out_dir("wide"))
    );
    Ok(())
}

#[test]
fn different_seeds_produce_different_calls() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    harness.run("a", &config, 1, "2025-09-01", "2025-09-01")?;
    harness.run("b", &config, 2, "2025-09-01", "2025-09-01")?;

    let ids = |name: &str| {
        read_records(&harness.out_dir(name))
            .into_iter()
            .map(|r| r.call_id)
            .collect::<Vec<_>>()
    };
    let a = ids("a");
    let b = ids("b");
    assert!(!a.is_empty());
    assert!(a.iter().all(|id| !b.contains(id)));
    Ok(())
}

#[test]
fn seeded_two_bucket_day_splits_evenly_and_reproduces() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = two_bucket_config();
    let summary = harness.run("example", &config, 12345, "2025-09-01", "2025-09-01")?;

    assert_eq!(summary.report.days.len(), 1);
    assert!(summary.report.outages.is_empty());
    assert_eq!(summary.report.calls_written, 10);
    assert_eq!(summary.report.calls_per_bucket.get("Morning"), Some(&5));
    assert_eq!(summary.report.calls_per_bucket.get("Afternoon"), Some(&5));

    let records = read_records(&harness.out_dir("example"));
    assert_eq!(records.len(), 10);
    let mut per_bucket: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &records {
        *per_bucket.entry(record.time_of_day_bucket.as_str()).or_default() += 1;
        assert_eq!(record.date.to_string(), "2025-09-01");
    }
    assert_eq!(per_bucket.get("Morning"), Some(&5));
    assert_eq!(per_bucket.get("Afternoon"), Some(&5));

    harness.run("example-again", &config, 12345, "2025-09-01", "2025-09-01")?;
    let again = read_records(&harness.out_dir("example-again"));
    let assignments = |records: &[callsynth::CallRecord]| {
        records
            .iter()
            .map(|r| (r.call_id, r.agent_name.clone(), r.agent_shift.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(assignments(&records), assignments(&again));
    assert_eq!(records, again);
    Ok(())
}

#[test]
fn empty_range_writes_metadata_only() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let summary = harness.run("empty", &base_config(), 4, "2025-09-02", "2025-09-01")?;

    assert!(summary.report.days.is_empty());
    assert_eq!(summary.report.calls_planned, 0);
    assert_eq!(summary.report.calls_written, 0);
    assert!(summary.manifest.days.is_empty());
    assert_eq!(summary.manifest.metadata.len(), 5);

    let paths: BTreeSet<String> = read_tree(&harness.out_dir("empty"))
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert!(paths.iter().all(|path| path.starts_with("_meta/")), "{paths:?}");
    for entry in &summary.manifest.metadata {
        assert!(paths.contains(&entry.path), "{} missing", entry.path);
    }
    assert!(read_records(&harness.out_dir("empty")).is_empty());
    Ok(())
}
