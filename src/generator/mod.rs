//! Run orchestration.
//!
//! A run plans everything first (calendar, volumes, shifts, call slots),
//! so configuration and coverage problems abort before a single record
//! exists. Days are then generated independently on a rayon pool: every
//! call derives its streams from the seed and its (day, call) position,
//! which keeps output identical regardless of worker count or scheduling.

mod report;

pub use report::{DaySummary, DayTally, GenerationReport};

use crate::calendar::{plan_calendar, CalendarPlan, DaySpec};
use crate::config::{EffectiveConfig, ViolationPolicy};
use crate::error::{GenerationError, GenerationResult};
use crate::metrics::synthesize;
use crate::output::{
    self, DayFiles, Manifest, OutputWriter, CONFIG_FILE, DESCRIPTIONS_FILE, PROMPT_FILE,
    REPORT_FILE, SCHEMA_FILE,
};
use crate::record::{
    assemble, field_descriptions, prompt_template, CallRecord, CallSchema, RecordValidator,
};
use crate::rng::{Seed, StreamFactory};
use crate::roster::{assign_calls, plan_shifts, CallSlot, DayRoster};
use crate::sampling::{sample_attributes, CallContext, CallIndex, FieldLookup};
use crate::volume::{allocate_days, DayVolume};
use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Invocation parameters that are not part of the configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub out_dir: PathBuf,
    pub seed: Seed,
    /// Worker threads; rayon's default when `None`.
    pub workers: Option<usize>,
}

/// Everything decided before per-call generation starts.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub calendar: CalendarPlan,
    pub volumes: Vec<DayVolume>,
    pub rosters: Vec<DayRoster>,
    pub slots: Vec<Vec<CallSlot>>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: GenerationReport,
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
}

pub fn plan_run(
    start: NaiveDate,
    end: NaiveDate,
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> GenerationResult<RunPlan> {
    let calendar = plan_calendar(start, end, config, streams)?;
    let volumes = allocate_days(&calendar.days, config)?;
    let rosters = plan_shifts(&calendar.days, &volumes, config, streams)?;
    let slots = rosters
        .iter()
        .zip(&volumes)
        .map(|(roster, volume)| assign_calls(roster, volume, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RunPlan {
        calendar,
        volumes,
        rosters,
        slots,
    })
}

/// Builds one call record from its slot.
pub fn generate_call(
    day: &DaySpec,
    slot: &CallSlot,
    call: usize,
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> (CallContext, CallRecord) {
    let at = CallIndex {
        day: day.stream_index(),
        call: call as u64,
    };
    let context = CallContext::new(day, slot);
    let attributes = sample_attributes(&context, config, streams, at);
    let metrics = synthesize(&FieldLookup::new(&context, &attributes), config, streams, at);
    let record = assemble(day, &context, &attributes, metrics, config, streams, at);
    (context, record)
}

struct DayJob<'a> {
    day: &'a DaySpec,
    slots: &'a [CallSlot],
}

struct DayOutcome {
    summary: DaySummary,
    tally: DayTally,
    files: DayFiles,
}

struct Generator<'a> {
    config: &'a EffectiveConfig,
    streams: &'a StreamFactory,
    validator: &'a RecordValidator,
    writer: &'a OutputWriter,
}

impl Generator<'_> {
    fn run_day(&self, job: DayJob<'_>) -> GenerationResult<DayOutcome> {
        let run = &self.config.settings.run;
        let mut tally = DayTally {
            planned: job.slots.len() as u32,
            ..DayTally::default()
        };
        let mut records = Vec::with_capacity(job.slots.len());

        for (call, slot) in job.slots.iter().enumerate() {
            let (context, record) = generate_call(job.day, slot, call, self.config, self.streams);
            if run.validate {
                let value =
                    serde_json::to_value(&record).map_err(|source| GenerationError::Serialize {
                        what: format!("call {}", record.call_id),
                        source,
                    })?;
                let violations = self.validator.validate(&value, self.config, &context);
                if let Some(first) = violations.first() {
                    match run.on_violation {
                        ViolationPolicy::FailFast => return Err(first.clone().into()),
                        ViolationPolicy::Collect => {
                            for violation in &violations {
                                warn!(%violation, "record rejected");
                            }
                            tally.reject(violations);
                            continue;
                        }
                    }
                }
            }
            let bytes = output::to_pretty_json(&record, "call record")?;
            tally.accept(&record);
            records.push((record.call_id.to_string(), bytes));
        }

        let files = self.writer.write_day(job.day.date, &records)?;
        info!(
            date = %job.day.date,
            written = tally.written,
            rejected = tally.rejected,
            "day generated"
        );
        Ok(DayOutcome {
            summary: DaySummary {
                date: job.day.date,
                planned: tally.planned,
                written: tally.written,
                rejected: tally.rejected,
                outage: job.day.has_outage(),
                app_issue: job.day.app_issue,
            },
            tally,
            files,
        })
    }
}

/// Runs a full generation into `options.out_dir`.
pub fn generate(options: &RunOptions, config: &EffectiveConfig) -> GenerationResult<RunSummary> {
    let streams = StreamFactory::new(options.seed.clone());
    info!(
        seed = %options.seed,
        start = %options.start,
        end = %options.end,
        out = %options.out_dir.display(),
        "starting generation run"
    );
    let plan = plan_run(options.start, options.end, config, &streams)?;
    debug!(
        days = plan.calendar.days.len(),
        outages = plan.calendar.outages.len(),
        calls = plan.volumes.iter().map(|v| u64::from(v.total)).sum::<u64>(),
        "run planned"
    );

    let schema = CallSchema::from_config(config);
    let validator = RecordValidator::new(&schema)?;
    let writer = OutputWriter::create(&options.out_dir)?;
    let mut manifest = Manifest {
        seed: options.seed.to_string(),
        ..Manifest::default()
    };
    manifest.metadata.push(writer.write_meta(CONFIG_FILE, &config.document)?);
    manifest.metadata.push(writer.write_meta(SCHEMA_FILE, &schema.to_json_schema())?);
    manifest.metadata.push(writer.write_meta(DESCRIPTIONS_FILE, &field_descriptions())?);
    manifest.metadata.push(writer.write_meta(PROMPT_FILE, &prompt_template())?);

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers.unwrap_or(0))
        .build()
        .map_err(|e| GenerationError::WorkerPool(e.to_string()))?;
    let generator = Generator {
        config,
        streams: &streams,
        validator: &validator,
        writer: &writer,
    };
    let jobs: Vec<DayJob<'_>> = plan
        .calendar
        .days
        .iter()
        .zip(&plan.slots)
        .map(|(day, slots)| DayJob { day, slots })
        .collect();
    let outcomes = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| generator.run_day(job))
            .collect::<GenerationResult<Vec<_>>>()
    })?;

    let mut report = GenerationReport::new(
        options.seed.to_string(),
        options.start,
        options.end,
        config.settings.run.validate,
    );
    report.outages = plan.calendar.outages.clone();
    for outcome in outcomes {
        report.absorb(outcome.summary, outcome.tally);
        manifest.days.push(outcome.files);
    }
    manifest.metadata.push(writer.write_meta(REPORT_FILE, &report)?);
    let manifest_path = writer.write_manifest(&manifest)?;

    info!(
        written = report.calls_written,
        rejected = report.calls_rejected,
        files = manifest.file_count(),
        "generation finished"
    );
    Ok(RunSummary {
        report,
        manifest,
        manifest_path,
    })
}
