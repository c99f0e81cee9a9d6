use callsynth::config::EffectiveConfig;
use callsynth::generator::{generate, RunOptions, RunSummary};
use callsynth::rng::Seed;
use callsynth::GenerationResult;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct IntegrationHarness {
    workspace: TempDir,
}

const SHIPPED_CONFIGS: &[&str] = &["config/base.yml", "config/overrides.yml"];

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        Self { workspace }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    pub fn out_dir(&self, name: &str) -> PathBuf {
        self.workspace.path().join(name)
    }

    pub fn options(&self, name: &str, seed: u64, start: &str, end: &str) -> RunOptions {
        RunOptions {
            start: date(start),
            end: date(end),
            out_dir: self.out_dir(name),
            seed: Seed::Int(seed),
            workers: None,
        }
    }

    pub fn run(
        &self,
        name: &str,
        config: &EffectiveConfig,
        seed: u64,
        start: &str,
        end: &str,
    ) -> GenerationResult<RunSummary> {
        generate(&self.options(name, seed, start, end), config)
    }
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test dates are ISO formatted")
}

mod config_errors;
mod coverage;
mod determinism;
mod manifest;
mod outages;
mod record_conformance;
mod source_width;
mod violation_policy;
mod volume;
pub mod support;

#[test]
fn shipped_configs_exist() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    for path in SHIPPED_CONFIGS {
        assert!(
            root.join(path).exists(),
            "Expected shipped configuration to exist: {path}"
        );
    }
}
