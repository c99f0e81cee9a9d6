//! Typed configuration model.
//!
//! Every struct rejects unknown keys, so a misspelled option in the base
//! document or in any override layer fails resolution instead of being
//! silently ignored.

use super::fields::{CategoricalField, ComplianceCheck, DayOfWeek, FieldRef};
use crate::sampling::WeightTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved option label that maps to JSON `null` on nullable fields.
pub const NONE_OPTION: &str = "none";

/// Root of the effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub run: RunSettings,
    pub volume: VolumeSettings,
    pub calendar: CalendarSettings,
    pub team: TeamSettings,
    pub attributes: BTreeMap<CategoricalField, AttributeSpec>,
    /// How many distinct intents a call raises. The first drawn intent is
    /// the primary one every dependency rule reads.
    #[serde(default = "default_intent_count")]
    pub intent_count: WeightTable<u32>,
    #[serde(default)]
    pub ani: AniSettings,
    pub kpis: KpiSettings,
    pub compliance: ComplianceSettings,
}

/// What happens when a record fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    #[default]
    FailFast,
    Collect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    #[serde(default = "default_true")]
    pub validate: bool,
    #[serde(default)]
    pub on_violation: ViolationPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            validate: true,
            on_violation: ViolationPolicy::default(),
        }
    }
}

fn default_intent_count() -> WeightTable<u32> {
    WeightTable::single(1)
}

const fn default_true() -> bool {
    true
}

const fn default_one() -> f64 {
    1.0
}

/// Daily volume baselines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSettings {
    pub baseline_weekday: f64,
    pub baseline_weekend: f64,
    /// Global scale applied on top of baselines (e.g. 0.2 for a sample run).
    #[serde(default = "default_one")]
    pub scale: f64,
    /// Multiplier applied on app-issue days that carry no outage window.
    #[serde(default = "default_one")]
    pub app_issue_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarSettings {
    /// Canonical time-of-day buckets, in chronological order.
    pub time_buckets: Vec<String>,
    pub bucket_shares: WeekProfile,
    #[serde(default)]
    pub weekday_factors: BTreeMap<DayOfWeek, f64>,
    #[serde(default)]
    pub premium_wait_peak_days: Vec<DayOfWeek>,
    #[serde(default)]
    pub outages: OutageSettings,
}

impl CalendarSettings {
    pub fn weekday_factor(&self, day: DayOfWeek) -> f64 {
        self.weekday_factors.get(&day).copied().unwrap_or(1.0)
    }
}

/// Weights with an optional weekend variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeekProfile {
    pub weekday: WeightTable<String>,
    /// Falls back to the weekday profile when absent.
    #[serde(default)]
    pub weekend: Option<WeightTable<String>>,
}

impl WeekProfile {
    pub fn for_day(&self, weekend: bool) -> &WeightTable<String> {
        match (&self.weekend, weekend) {
            (Some(profile), true) => profile,
            _ => &self.weekday,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutageSettings {
    #[serde(default = "default_outage_count")]
    pub count: WeightTable<u32>,
    /// Replaces the sampled count when set.
    #[serde(default)]
    pub count_override: Option<u32>,
    #[serde(default = "default_outage_duration")]
    pub duration_days: WeightTable<u32>,
    #[serde(default)]
    pub volume_multiplier: MultiplierRange,
    #[serde(default = "default_true")]
    pub weekdays_only: bool,
    /// Days after an outage window flagged as app-issue days.
    #[serde(default)]
    pub app_issue_days_after: u32,
}

impl Default for OutageSettings {
    fn default() -> Self {
        Self {
            count: default_outage_count(),
            count_override: None,
            duration_days: default_outage_duration(),
            volume_multiplier: MultiplierRange::default(),
            weekdays_only: true,
            app_issue_days_after: 0,
        }
    }
}

fn default_outage_count() -> WeightTable<u32> {
    WeightTable::single(0)
}

fn default_outage_duration() -> WeightTable<u32> {
    WeightTable::single(1)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiplierRange {
    pub min: f64,
    pub max: f64,
}

impl Default for MultiplierRange {
    fn default() -> Self {
        Self { min: 1.0, max: 1.0 }
    }
}

/// Roster, shift patterns and coverage targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamSettings {
    pub agents: Vec<AgentSpec>,
    pub shifts: Vec<ShiftPattern>,
    #[serde(default = "default_min_agents")]
    pub min_agents_per_bucket: usize,
    /// Upper bound of calls one agent takes within a single bucket.
    #[serde(default = "default_max_calls")]
    pub max_calls_per_agent: u32,
    #[serde(default)]
    pub rest_days_per_week: u8,
    /// Optional workload split between teams; agent workloads then split
    /// each team's share.
    #[serde(default)]
    pub team_shares: Option<WeekProfile>,
}

const fn default_min_agents() -> usize {
    1
}

const fn default_max_calls() -> u32 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSpec {
    pub name: String,
    pub team: String,
    #[serde(default = "default_one")]
    pub workload: f64,
    /// Workload on Saturdays and Sundays; `workload` when absent.
    #[serde(default)]
    pub weekend_workload: Option<f64>,
    /// Preferred shift patterns, by weight.
    pub shifts: WeightTable<String>,
}

impl AgentSpec {
    pub fn workload_for(&self, weekend: bool) -> f64 {
        match (self.weekend_workload, weekend) {
            (Some(workload), true) => workload,
            _ => self.workload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftPattern {
    pub name: String,
    pub buckets: Vec<String>,
}

/// Weighted distribution plus dependency rules for one categorical field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub weights: WeightTable<String>,
    #[serde(default)]
    pub nullable: bool,
    /// Fields that must be sampled before this one even when no adjustment
    /// or constraint mentions them.
    #[serde(default)]
    pub depends_on: Vec<FieldRef>,
    /// Additive weight deltas keyed by a parent field and its value.
    #[serde(default)]
    pub adjust: BTreeMap<FieldRef, BTreeMap<String, WeightTable<String>>>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRule>,
}

impl AttributeSpec {
    /// Every field this attribute reads while sampling.
    pub fn parents(&self) -> Vec<FieldRef> {
        let mut parents: Vec<FieldRef> = self.depends_on.clone();
        parents.extend(self.adjust.keys().copied());
        parents.extend(self.constraints.iter().map(|rule| rule.field));
        parents.sort();
        parents.dedup();
        parents
    }

    /// Option domain, including the `none` sentinel when nullable.
    pub fn domain(&self) -> impl Iterator<Item = &String> {
        self.weights.options()
    }
}

/// Restricts an attribute's options based on a parent's sampled value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintRule {
    pub field: FieldRef,
    pub allowed: BTreeMap<String, Vec<String>>,
    /// Applies when the parent value is not listed in `allowed`; no
    /// restriction when absent.
    #[serde(default)]
    pub otherwise: Option<Vec<String>>,
}

impl ConstraintRule {
    pub fn allowed_for(&self, parent_value: &str) -> Option<&[String]> {
        self.allowed
            .get(parent_value)
            .map(Vec::as_slice)
            .or(self.otherwise.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AniSettings {
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default = "default_min_digits")]
    pub min_digits: u32,
    #[serde(default = "default_max_digits")]
    pub max_digits: u32,
    /// Fields identifying a synthetic customer; equal keys share a number.
    #[serde(default = "default_customer_key")]
    pub customer_key: Vec<FieldRef>,
}

impl Default for AniSettings {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            min_digits: default_min_digits(),
            max_digits: default_max_digits(),
            customer_key: default_customer_key(),
        }
    }
}

fn default_country_code() -> String {
    "+49".into()
}

const fn default_min_digits() -> u32 {
    9
}

const fn default_max_digits() -> u32 {
    12
}

fn default_customer_key() -> Vec<FieldRef> {
    vec![
        FieldRef::Attribute(CategoricalField::CustomerSegment),
        FieldRef::Attribute(CategoricalField::Channel),
        FieldRef::Attribute(CategoricalField::Region),
    ]
}

/// Condition value: a single label, a boolean flag or a list of labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueMatch {
    Flag(bool),
    One(String),
    Any(Vec<String>),
}

impl ValueMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatch::Flag(flag) => value == if *flag { "true" } else { "false" },
            ValueMatch::One(expected) => expected == value,
            ValueMatch::Any(options) => options.iter().any(|option| option == value),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        match self {
            ValueMatch::Flag(flag) => vec![flag.to_string()],
            ValueMatch::One(expected) => vec![expected.clone()],
            ValueMatch::Any(options) => options.clone(),
        }
    }
}

/// Conjunction of field conditions. Empty means "always".
pub type Condition = BTreeMap<FieldRef, ValueMatch>;

/// Shifts a continuous metric's mean and scales its spread when `when`
/// holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextShift {
    pub when: Condition,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "default_one")]
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinuousMetric {
    pub mean: f64,
    pub sigma: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default)]
    pub shifts: Vec<ContextShift>,
}

const fn default_decimals() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscreteShift {
    pub when: Condition,
    pub deltas: WeightTable<u32>,
}

/// Integer-valued metric drawn from a weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscreteMetric {
    pub weights: WeightTable<u32>,
    #[serde(default)]
    pub adjust: Vec<DiscreteShift>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbabilityShift {
    pub when: Condition,
    pub delta: f64,
}

/// Boolean metric with a base probability and contextual deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbabilityMetric {
    pub base: f64,
    #[serde(default)]
    pub shifts: Vec<ProbabilityShift>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntShift {
    pub when: Condition,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpsSettings {
    pub weights: WeightTable<u8>,
    #[serde(default = "default_long_wait")]
    pub long_wait_seconds: f64,
    #[serde(default = "default_long_wait_penalty")]
    pub long_wait_penalty: i32,
    #[serde(default = "default_unresolved_penalty")]
    pub unresolved_penalty: i32,
    /// Added once per failed compliance check.
    #[serde(default)]
    pub compliance_fail_penalty: i32,
    #[serde(default)]
    pub shifts: Vec<IntShift>,
    #[serde(default = "default_nps_cap")]
    pub cap: u8,
}

const fn default_long_wait() -> f64 {
    120.0
}

const fn default_long_wait_penalty() -> i32 {
    -2
}

const fn default_unresolved_penalty() -> i32 {
    -1
}

const fn default_nps_cap() -> u8 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CheckValues {
    #[serde(rename = "Greeting", default)]
    pub greeting: f64,
    #[serde(rename = "Empathy", default)]
    pub empathy: f64,
    #[serde(rename = "Summary", default)]
    pub summary: f64,
    #[serde(rename = "Farewell", default)]
    pub farewell: f64,
}

impl CheckValues {
    pub fn get(&self, check: ComplianceCheck) -> f64 {
        match check {
            ComplianceCheck::Greeting => self.greeting,
            ComplianceCheck::Empathy => self.empathy,
            ComplianceCheck::Summary => self.summary,
            ComplianceCheck::Farewell => self.farewell,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentSettings {
    #[serde(default = "default_sentiment_noise")]
    pub noise_sigma: f64,
    #[serde(default)]
    pub shifts: Vec<ContextShift>,
    /// Added to the sentiment for each failed check.
    #[serde(default)]
    pub compliance_penalty: CheckValues,
}

const fn default_sentiment_noise() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SilencePenalty {
    pub low_nps_threshold: u8,
    pub per_point_below: f64,
}

impl Default for SilencePenalty {
    fn default() -> Self {
        Self {
            low_nps_threshold: 7,
            per_point_below: 1.5,
        }
    }
}

/// KPI distribution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KpiSettings {
    pub awt_seconds: ContinuousMetric,
    pub hold_seconds: ContinuousMetric,
    pub silence_ratio: ContinuousMetric,
    pub silence_total_seconds: ContinuousMetric,
    #[serde(default)]
    pub silence_nps_penalty: SilencePenalty,
    pub interruptions_count: ContinuousMetric,
    pub transfers_count: DiscreteMetric,
    pub script_adherence: ContinuousMetric,
    pub nps: NpsSettings,
    pub sentiment: SentimentSettings,
    pub fcr: ProbabilityMetric,
    pub repeat_call: ProbabilityMetric,
    /// Added to the repeat-call probability when the call was not resolved.
    #[serde(default)]
    pub repeat_call_unresolved_lift: f64,
    pub kb_article_used: ProbabilityMetric,
    pub language_switch: ProbabilityMetric,
    pub pii_disclosure: ProbabilityMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceShift {
    pub when: Condition,
    pub delta: f64,
    /// Checks the delta applies to; all four when empty.
    #[serde(default)]
    pub checks: Vec<ComplianceCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceSettings {
    pub pass_rates: CheckValues,
    /// Probability that a check reuses the call's shared latent draw.
    #[serde(default)]
    pub correlation: f64,
    #[serde(default)]
    pub shifts: Vec<ComplianceShift>,
    /// Subtracted from script adherence per failed check.
    #[serde(default)]
    pub script_penalty_per_fail: f64,
}
