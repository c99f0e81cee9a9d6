use crate::calendar::OutageWindow;
use crate::error::SchemaViolation;
use crate::record::CallRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts gathered while generating one day.
#[derive(Debug, Clone, Default)]
pub struct DayTally {
    pub planned: u32,
    pub written: u32,
    pub rejected: u32,
    pub per_bucket: BTreeMap<String, u64>,
    pub per_channel: BTreeMap<String, u64>,
    pub per_scenario: BTreeMap<String, u64>,
    pub violations: Vec<SchemaViolation>,
}

impl DayTally {
    pub fn accept(&mut self, record: &CallRecord) {
        self.written += 1;
        *self.per_bucket.entry(record.time_of_day_bucket.clone()).or_default() += 1;
        *self.per_channel.entry(record.channel.clone()).or_default() += 1;
        *self.per_scenario.entry(record.scenario.clone()).or_default() += 1;
    }

    pub fn reject(&mut self, violations: Vec<SchemaViolation>) {
        self.rejected += 1;
        self.violations.extend(violations);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub planned: u32,
    pub written: u32,
    pub rejected: u32,
    pub outage: bool,
    pub app_issue: bool,
}

/// Run summary persisted as `_meta/generation_report.json`. Contains no
/// wall-clock data, so identical runs produce identical reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub seed: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub validated: bool,
    pub calls_planned: u64,
    pub calls_written: u64,
    pub calls_rejected: u64,
    pub days: Vec<DaySummary>,
    pub outages: Vec<OutageWindow>,
    pub calls_per_bucket: BTreeMap<String, u64>,
    pub calls_per_channel: BTreeMap<String, u64>,
    pub calls_per_scenario: BTreeMap<String, u64>,
    pub violations_per_field: BTreeMap<String, u64>,
    pub violations: Vec<SchemaViolation>,
}

impl GenerationReport {
    pub fn new(seed: String, start: NaiveDate, end: NaiveDate, validated: bool) -> Self {
        Self {
            seed,
            start,
            end,
            validated,
            calls_planned: 0,
            calls_written: 0,
            calls_rejected: 0,
            days: Vec::new(),
            outages: Vec::new(),
            calls_per_bucket: BTreeMap::new(),
            calls_per_channel: BTreeMap::new(),
            calls_per_scenario: BTreeMap::new(),
            violations_per_field: BTreeMap::new(),
            violations: Vec::new(),
        }
    }

    pub fn absorb(&mut self, summary: DaySummary, tally: DayTally) {
        self.calls_planned += u64::from(tally.planned);
        self.calls_written += u64::from(tally.written);
        self.calls_rejected += u64::from(tally.rejected);
        merge_counts(&mut self.calls_per_bucket, tally.per_bucket);
        merge_counts(&mut self.calls_per_channel, tally.per_channel);
        merge_counts(&mut self.calls_per_scenario, tally.per_scenario);
        for violation in &tally.violations {
            *self
                .violations_per_field
                .entry(violation.field.clone())
                .or_default() += 1;
        }
        self.violations.extend(tally.violations);
        self.days.push(summary);
    }
}

fn merge_counts(into: &mut BTreeMap<String, u64>, from: BTreeMap<String, u64>) {
    for (key, count) in from {
        *into.entry(key).or_default() += count;
    }
}
