//! Call record assembly and validation.

mod descriptions;
mod schema;
mod validate;

pub use descriptions::{field_descriptions, prompt_template, PROMPT_PLACEHOLDERS};
pub use schema::{CallSchema, FieldKind, FieldSpec};
pub use validate::RecordValidator;

use crate::calendar::DaySpec;
use crate::config::{CategoricalField, DayOfWeek, EffectiveConfig};
use crate::metrics::{CallMetrics, ComplianceFlags};
use crate::rng::{Dimension, StreamFactory, StreamKey};
use crate::sampling::{Attributes, CallContext, CallIndex, FieldLookup};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

/// One synthetic call. Field names are the external contract consumed by
/// the dialogue, timeline and upload tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: Uuid,
    pub date: NaiveDate,
    pub weekday: DayOfWeek,
    pub time_of_day_bucket: String,
    pub agent_name: String,
    pub team: String,
    pub agent_shift: String,
    pub customer_segment: String,
    pub channel: String,
    pub language: String,
    pub region: String,
    pub device_type: String,
    pub intent: String,
    /// Further intents of a multi-topic call; `intent` stays the primary.
    pub secondary_intents: Vec<String>,
    pub scenario: String,
    #[serde(rename = "AWT")]
    pub awt: f64,
    #[serde(rename = "Hold_time")]
    pub hold_time: f64,
    #[serde(rename = "Transfers_count")]
    pub transfers_count: u32,
    #[serde(rename = "Silence_ratio")]
    pub silence_ratio: f64,
    #[serde(rename = "Interruptions_count")]
    pub interruptions_count: u32,
    #[serde(rename = "FCR")]
    pub fcr: bool,
    pub repeat_call_within_72h: bool,
    pub escalation: String,
    pub complaint_category: Option<String>,
    #[serde(rename = "NPS_score")]
    pub nps_score: u8,
    pub sentiment_score: f64,
    pub product: Option<String>,
    pub amount_bucket: Option<String>,
    pub self_service_potential: String,
    pub automation_action_present: bool,
    pub automation_action_type: Option<String>,
    #[serde(rename = "ANI")]
    pub ani: String,
    pub compliance_flags: ComplianceFlags,
    pub kb_article_used: bool,
    pub language_switch: bool,
    pub pii_disclosure_flag: bool,
    pub script_adherence: f64,
    #[serde(rename = "Silence_total_seconds")]
    pub silence_total_seconds: f64,
}

/// Deterministic UUIDv4-shaped id from the call's identity stream.
pub fn call_id(streams: &StreamFactory, at: CallIndex) -> Uuid {
    let key = StreamKey::new(Dimension::Identity)
        .label("call_id")
        .index(at.day)
        .index(at.call);
    Builder::from_random_bytes(streams.stream(&key).bytes16()).into_uuid()
}

/// Caller number keyed by the configured customer fields, so calls from
/// the same synthetic customer share a number.
pub fn caller_number(
    lookup: &FieldLookup<'_>,
    config: &EffectiveConfig,
    streams: &StreamFactory,
) -> String {
    let ani = &config.settings.ani;
    let key = ani
        .customer_key
        .iter()
        .fold(StreamKey::new(Dimension::Customer).label("ani"), |key, field| {
            key.label(field.as_str()).label(lookup.value(*field))
        });
    let mut stream = streams.stream(&key);
    let digits = stream.range_inclusive(ani.min_digits, ani.max_digits);
    let mut number = ani.country_code.clone();
    for _ in 0..digits {
        number.push(char::from(b'0' + stream.below(10) as u8));
    }
    number
}

pub fn assemble(
    day: &DaySpec,
    context: &CallContext,
    attributes: &Attributes,
    metrics: CallMetrics,
    config: &EffectiveConfig,
    streams: &StreamFactory,
    at: CallIndex,
) -> CallRecord {
    let lookup = FieldLookup::new(context, attributes);
    let label = |field: CategoricalField| attributes.label(field).to_string();
    let automation_action_type = attributes.take(CategoricalField::AutomationActionType);
    CallRecord {
        call_id: call_id(streams, at),
        date: day.date,
        weekday: day.weekday,
        time_of_day_bucket: context.bucket.clone(),
        agent_name: context.agent.clone(),
        team: context.team.clone(),
        agent_shift: context.shift.clone(),
        customer_segment: label(CategoricalField::CustomerSegment),
        channel: label(CategoricalField::Channel),
        language: label(CategoricalField::Language),
        region: label(CategoricalField::Region),
        device_type: label(CategoricalField::DeviceType),
        intent: label(CategoricalField::Intent),
        secondary_intents: attributes.secondary_intents().to_vec(),
        scenario: label(CategoricalField::Scenario),
        awt: metrics.awt_seconds,
        hold_time: metrics.hold_seconds,
        transfers_count: metrics.transfers_count,
        silence_ratio: metrics.silence_ratio,
        interruptions_count: metrics.interruptions_count,
        fcr: metrics.fcr,
        repeat_call_within_72h: metrics.repeat_call,
        escalation: label(CategoricalField::Escalation),
        complaint_category: attributes.take(CategoricalField::ComplaintCategory),
        nps_score: metrics.nps_score,
        sentiment_score: metrics.sentiment_score,
        product: attributes.take(CategoricalField::Product),
        amount_bucket: attributes.take(CategoricalField::AmountBucket),
        self_service_potential: label(CategoricalField::SelfServicePotential),
        automation_action_present: automation_action_type.is_some(),
        automation_action_type,
        ani: caller_number(&lookup, config, streams),
        compliance_flags: metrics.compliance,
        kb_article_used: metrics.kb_article_used,
        language_switch: metrics.language_switch,
        pii_disclosure_flag: metrics.pii_disclosure,
        script_adherence: metrics.script_adherence,
        silence_total_seconds: metrics.silence_total_seconds,
    }
}
