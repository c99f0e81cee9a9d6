use super::support::{base_config, read_tree, two_bucket_config};
use super::IntegrationHarness;
use callsynth::output::{hash_path, read_manifest, META_DIR, MANIFEST_FILE};
use callsynth::GenerationResult;
use std::collections::BTreeSet;

#[test]
fn manifest_hashes_match_files_on_disk() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = base_config();
    let summary = harness.run("hashed", &config, 17, "2025-09-01", "2025-09-02")?;
    let root = harness.out_dir("hashed");

    assert_eq!(summary.manifest_path, root.join(META_DIR).join(MANIFEST_FILE));
    let manifest = read_manifest(&summary.manifest_path)?;
    assert_eq!(manifest, summary.manifest);
    for entry in manifest.entries() {
        let path = root.join(&entry.path);
        assert_eq!(hash_path(&path).expect("listed file exists"), entry.sha256, "{}", entry.path);
        assert_eq!(std::fs::metadata(&path).expect("metadata").len(), entry.bytes);
    }

    let record_files: usize = manifest.days.iter().map(|d| d.files.len()).sum();
    assert_eq!(record_files as u64, summary.report.calls_written);
    assert_eq!(manifest.days.len(), 2);
    assert_eq!(manifest.metadata.len(), 5);
    Ok(())
}

#[test]
fn manifest_lists_every_file_but_itself() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let summary = harness.run("listed", &base_config(), 2, "2025-09-05", "2025-09-06")?;
    let listed: BTreeSet<String> = summary.manifest.entries().map(|e| e.path.clone()).collect();
    let on_disk: BTreeSet<String> = read_tree(&harness.out_dir("listed"))
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path != &format!("{META_DIR}/{MANIFEST_FILE}"))
        .collect();
    assert_eq!(listed, on_disk);
    Ok(())
}

#[test]
fn rerunning_a_day_replaces_its_group() -> GenerationResult<()> {
    let harness = IntegrationHarness::new();
    let config = two_bucket_config();
    harness.run("rerun", &config, 1, "2025-09-01", "2025-09-01")?;
    let first: BTreeSet<String> = read_tree(&harness.out_dir("rerun"))
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path.starts_with("2025-09-01/"))
        .collect();

    let summary = harness.run("rerun", &config, 2, "2025-09-01", "2025-09-01")?;
    let second: BTreeSet<String> = read_tree(&harness.out_dir("rerun"))
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path.starts_with("2025-09-01/"))
        .collect();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert!(first.is_disjoint(&second), "stale records survived the rerun");
    let listed: BTreeSet<String> = summary.manifest.days[0]
        .files
        .iter()
        .map(|e| e.path.clone())
        .collect();
    assert_eq!(listed, second);
    Ok(())
}
