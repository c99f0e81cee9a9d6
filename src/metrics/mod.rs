//! KPI synthesis from a call's sampled context.
//!
//! Every metric draws from its own stream keyed by metric name, day and
//! call. Distribution parameters are shifted by the context conditions
//! configured under `kpis`, then values are truncated to their declared
//! range. Compliance checks come first because NPS, sentiment and script
//! adherence react to failed checks.

use crate::config::{
    CheckValues, ComplianceCheck, ContinuousMetric, DiscreteMetric, EffectiveConfig,
    ProbabilityMetric,
};
use crate::rng::{Dimension, KeyedStream, StreamFactory, StreamKey};
use crate::sampling::{pick_index, CallIndex, FieldLookup};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }

    pub fn failed(&self) -> bool {
        *self == CheckStatus::Fail
    }
}

/// Pass/fail outcome of the four compliance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    #[serde(rename = "Greeting")]
    pub greeting: CheckStatus,
    #[serde(rename = "Empathy")]
    pub empathy: CheckStatus,
    #[serde(rename = "Summary")]
    pub summary: CheckStatus,
    #[serde(rename = "Farewell")]
    pub farewell: CheckStatus,
}

impl ComplianceFlags {
    pub fn get(&self, check: ComplianceCheck) -> CheckStatus {
        match check {
            ComplianceCheck::Greeting => self.greeting,
            ComplianceCheck::Empathy => self.empathy,
            ComplianceCheck::Summary => self.summary,
            ComplianceCheck::Farewell => self.farewell,
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = ComplianceCheck> + '_ {
        ComplianceCheck::ALL
            .into_iter()
            .filter(|check| self.get(*check).failed())
    }

    pub fn fail_count(&self) -> usize {
        self.failed_checks().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallMetrics {
    pub awt_seconds: f64,
    pub hold_seconds: f64,
    pub transfers_count: u32,
    pub silence_ratio: f64,
    pub interruptions_count: u32,
    pub fcr: bool,
    pub repeat_call: bool,
    pub nps_score: u8,
    pub sentiment_score: f64,
    pub compliance: ComplianceFlags,
    pub kb_article_used: bool,
    pub language_switch: bool,
    pub pii_disclosure: bool,
    pub script_adherence: f64,
    pub silence_total_seconds: f64,
}

/// Bounds of the sentiment score.
pub const SENTIMENT_RANGE: (f64, f64) = (-1.0, 1.0);
const SENTIMENT_DECIMALS: u32 = 3;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

struct MetricStreams<'a> {
    streams: &'a StreamFactory,
    at: CallIndex,
}

impl MetricStreams<'_> {
    fn get(&self, metric: &str) -> KeyedStream {
        let key = StreamKey::new(Dimension::Metric)
            .label(metric)
            .index(self.at.day)
            .index(self.at.call);
        self.streams.stream(&key)
    }
}

/// Mean and sigma after every matching context shift.
fn shifted(metric: &ContinuousMetric, lookup: &FieldLookup<'_>) -> (f64, f64) {
    metric
        .shifts
        .iter()
        .filter(|shift| lookup.matches(&shift.when))
        .fold((metric.mean, metric.sigma), |(mean, sigma), shift| {
            (mean + shift.mean, sigma * shift.spread)
        })
}

fn continuous(
    metric: &ContinuousMetric,
    lookup: &FieldLookup<'_>,
    stream: &mut KeyedStream,
    extra_mean: f64,
) -> f64 {
    let (mean, sigma) = shifted(metric, lookup);
    let value = stream.truncated_normal(mean + extra_mean, sigma, metric.min, metric.max);
    round_to(value, metric.decimals).clamp(metric.min, metric.max)
}

fn count(metric: &ContinuousMetric, lookup: &FieldLookup<'_>, stream: &mut KeyedStream) -> u32 {
    let (mean, sigma) = shifted(metric, lookup);
    let value = stream.truncated_normal(mean, sigma, metric.min, metric.max);
    value.round().clamp(metric.min.max(0.0), metric.max) as u32
}

fn probability(metric: &ProbabilityMetric, lookup: &FieldLookup<'_>) -> f64 {
    metric
        .shifts
        .iter()
        .filter(|shift| lookup.matches(&shift.when))
        .fold(metric.base, |p, shift| p + shift.delta)
        .clamp(0.0, 1.0)
}

fn discrete(metric: &DiscreteMetric, lookup: &FieldLookup<'_>, draw: f64) -> u32 {
    let mut weights: Vec<(u32, f64)> = metric.weights.iter().map(|(v, w)| (*v, w)).collect();
    for shift in metric.adjust.iter().filter(|s| lookup.matches(&s.when)) {
        for (value, delta) in shift.deltas.iter() {
            if let Some(entry) = weights.iter_mut().find(|(v, _)| v == value) {
                entry.1 += delta;
            }
        }
    }
    let raw: Vec<f64> = weights.iter().map(|(_, w)| w.max(0.0)).collect();
    let idx = pick_index(&raw, draw)
        .or_else(|| pick_index(&vec![1.0; raw.len()], draw))
        .unwrap_or(0);
    weights.get(idx).map(|(v, _)| *v).unwrap_or(0)
}

/// Compliance checks drawn from one stream. Each check reuses the call's
/// latent draw with probability `correlation`, so failures cluster.
fn draw_compliance(
    config: &EffectiveConfig,
    lookup: &FieldLookup<'_>,
    stream: &mut KeyedStream,
) -> ComplianceFlags {
    let settings = &config.settings.compliance;
    let latent = stream.unit();
    let mut status = |check: ComplianceCheck| {
        let rate = settings
            .shifts
            .iter()
            .filter(|shift| shift.checks.is_empty() || shift.checks.contains(&check))
            .filter(|shift| lookup.matches(&shift.when))
            .fold(settings.pass_rates.get(check), |p, shift| p + shift.delta)
            .clamp(0.0, 1.0);
        let shared = stream.chance(settings.correlation);
        let own = stream.unit();
        let draw = if shared { latent } else { own };
        CheckStatus::from_passed(draw < rate)
    };
    ComplianceFlags {
        greeting: status(ComplianceCheck::Greeting),
        empathy: status(ComplianceCheck::Empathy),
        summary: status(ComplianceCheck::Summary),
        farewell: status(ComplianceCheck::Farewell),
    }
}

fn penalty_for(flags: &ComplianceFlags, per_check: &CheckValues) -> f64 {
    flags.failed_checks().map(|check| per_check.get(check)).sum()
}

pub fn synthesize(
    lookup: &FieldLookup<'_>,
    config: &EffectiveConfig,
    streams: &StreamFactory,
    at: CallIndex,
) -> CallMetrics {
    let kpis = &config.settings.kpis;
    let metric = MetricStreams { streams, at };

    let compliance = draw_compliance(config, lookup, &mut metric.get("compliance"));
    let fails = compliance.fail_count();

    let fcr = metric.get("fcr").chance(probability(&kpis.fcr, lookup));
    let transfers_count = discrete(&kpis.transfers_count, lookup, metric.get("transfers").unit());
    let awt_seconds = continuous(&kpis.awt_seconds, lookup, &mut metric.get("awt"), 0.0);
    let hold_seconds = continuous(&kpis.hold_seconds, lookup, &mut metric.get("hold"), 0.0);
    let silence_ratio = continuous(
        &kpis.silence_ratio,
        lookup,
        &mut metric.get("silence_ratio"),
        0.0,
    );
    let interruptions_count = count(
        &kpis.interruptions_count,
        lookup,
        &mut metric.get("interruptions"),
    );

    let nps_settings = &kpis.nps;
    let mut nps_stream = metric.get("nps");
    let base_score = nps_settings
        .weights
        .pick(nps_stream.unit())
        .copied()
        .unwrap_or(nps_settings.cap) as i32;
    let mut correction = 0;
    if awt_seconds > nps_settings.long_wait_seconds {
        correction += nps_settings.long_wait_penalty;
    }
    if !fcr {
        correction += nps_settings.unresolved_penalty;
    }
    correction += nps_settings.compliance_fail_penalty * fails as i32;
    correction += nps_settings
        .shifts
        .iter()
        .filter(|shift| lookup.matches(&shift.when))
        .map(|shift| shift.delta)
        .sum::<i32>();
    let nps_score = (base_score + correction).clamp(0, nps_settings.cap as i32) as u8;

    let sentiment = &kpis.sentiment;
    let (shift_mean, spread) = sentiment
        .shifts
        .iter()
        .filter(|shift| lookup.matches(&shift.when))
        .fold((0.0, 1.0), |(mean, spread), shift| {
            (mean + shift.mean, spread * shift.spread)
        });
    let noise = metric
        .get("sentiment")
        .normal(0.0, sentiment.noise_sigma * spread);
    let raw_sentiment = (nps_score as f64 - 5.0) / 5.0
        + shift_mean
        + penalty_for(&compliance, &sentiment.compliance_penalty)
        + noise;
    let sentiment_score = round_to(
        raw_sentiment.clamp(SENTIMENT_RANGE.0, SENTIMENT_RANGE.1),
        SENTIMENT_DECIMALS,
    );

    let silence = &kpis.silence_nps_penalty;
    let points_below = silence.low_nps_threshold.saturating_sub(nps_score) as f64;
    let silence_total_seconds = continuous(
        &kpis.silence_total_seconds,
        lookup,
        &mut metric.get("silence_total"),
        points_below * silence.per_point_below,
    );

    let mut repeat_p = probability(&kpis.repeat_call, lookup);
    if !fcr {
        repeat_p = (repeat_p + kpis.repeat_call_unresolved_lift).clamp(0.0, 1.0);
    }
    let repeat_call = metric.get("repeat_call").chance(repeat_p);
    let kb_article_used = metric
        .get("kb_article")
        .chance(probability(&kpis.kb_article_used, lookup));
    let language_switch = metric
        .get("language_switch")
        .chance(probability(&kpis.language_switch, lookup));
    let pii_disclosure = metric
        .get("pii_disclosure")
        .chance(probability(&kpis.pii_disclosure, lookup));

    let script = &kpis.script_adherence;
    let script_penalty = config.settings.compliance.script_penalty_per_fail * fails as f64;
    let script_adherence = continuous(script, lookup, &mut metric.get("script_adherence"), 0.0);
    let script_adherence = round_to(script_adherence - script_penalty, script.decimals)
        .clamp(script.min, script.max);

    CallMetrics {
        awt_seconds,
        hold_seconds,
        transfers_count,
        silence_ratio,
        interruptions_count,
        fcr,
        repeat_call,
        nps_score,
        sentiment_score,
        compliance,
        kb_article_used,
        language_switch,
        pii_disclosure,
        script_adherence,
        silence_total_seconds,
    }
}
