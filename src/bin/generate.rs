use anyhow::{Context, Result};
use callsynth::config::{resolve, ConfigSources, DirectOverrides, ViolationPolicy};
use callsynth::generator::{generate, RunOptions};
use callsynth::rng::Seed;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Generate synthetic contact-center call records")]
struct Cli {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Output directory
    #[arg(long = "out")]
    out_dir: PathBuf,

    /// Run seed; integers and free-form strings are accepted
    #[arg(long)]
    seed: Seed,

    /// Exact number of outage windows, replacing the configured distribution
    #[arg(long)]
    outages: Option<u32>,

    /// Skip record validation
    #[arg(long)]
    no_validate: bool,

    /// What to do when a record fails validation
    #[arg(long, value_enum)]
    on_violation: Option<PolicyArg>,

    /// Base configuration document [default: config/base.yml]
    #[arg(long)]
    config_base: Option<PathBuf>,

    /// Override layer, applied in the order given (repeatable). Without
    /// one, config/overrides.yml is used alongside the default base
    #[arg(long = "config-override")]
    config_overrides: Vec<PathBuf>,

    /// Worker threads for day-level generation
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum PolicyArg {
    FailFast,
    Collect,
}

impl From<PolicyArg> for ViolationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => ViolationPolicy::FailFast,
            PolicyArg::Collect => ViolationPolicy::Collect,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let sources = ConfigSources::discover(cli.config_base, cli.config_overrides);
    let direct = DirectOverrides {
        outage_count: cli.outages,
        validate: cli.no_validate.then_some(false),
        on_violation: cli.on_violation.map(Into::into),
    };
    let config = resolve(&sources, &direct).with_context(|| {
        format!(
            "Failed to resolve configuration from {}",
            sources.base.display()
        )
    })?;

    let options = RunOptions {
        start: cli.start,
        end: cli.end,
        out_dir: cli.out_dir,
        seed: cli.seed,
        workers: cli.workers,
    };
    let summary = generate(&options, &config).context("Generation run failed")?;
    println!(
        "Wrote {} calls over {} days to {} ({} rejected). Manifest: {}",
        summary.report.calls_written,
        summary.report.days.len(),
        options.out_dir.display(),
        summary.report.calls_rejected,
        summary.manifest_path.display()
    );
    Ok(())
}
