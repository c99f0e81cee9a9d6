use crate::config::{CategoricalField, ContinuousMetric, DayOfWeek, EffectiveConfig, NONE_OPTION};
use crate::metrics::SENTIMENT_RANGE;
use serde_json::{json, Map, Value};

/// Declared type and bounds of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Uuid,
    Date,
    Enum { values: Vec<String>, nullable: bool },
    /// Distinct labels from `values`, at most `max_items` of them.
    LabelList { values: Vec<String>, max_items: usize },
    Number { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    Boolean,
    Phone {
        prefix: String,
        min_digits: u32,
        max_digits: u32,
    },
    Compliance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Field-by-field contract of a call record, derived from the effective
/// configuration. Rendered once as a JSON Schema document, which is both
/// persisted and compiled for record validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSchema {
    pub fields: Vec<FieldSpec>,
}

fn number(metric: &ContinuousMetric) -> FieldKind {
    FieldKind::Number {
        min: metric.min,
        max: metric.max,
    }
}

fn integer(metric: &ContinuousMetric) -> FieldKind {
    FieldKind::Integer {
        min: metric.min.max(0.0).ceil() as i64,
        max: metric.max.floor() as i64,
    }
}

fn labels(values: impl IntoIterator<Item = impl Into<String>>) -> FieldKind {
    FieldKind::Enum {
        values: values.into_iter().map(Into::into).collect(),
        nullable: false,
    }
}

impl CallSchema {
    pub fn from_config(config: &EffectiveConfig) -> Self {
        let settings = &config.settings;
        let kpis = &settings.kpis;
        let attribute = |field: CategoricalField| {
            let spec = config.attribute(field);
            FieldKind::Enum {
                values: spec
                    .domain()
                    .filter(|option| option.as_str() != NONE_OPTION)
                    .cloned()
                    .collect(),
                nullable: spec.nullable,
            }
        };
        let transfers: Vec<u32> = kpis.transfers_count.weights.options().copied().collect();
        let transfer_bounds = (
            transfers.iter().min().copied().unwrap_or(0),
            transfers.iter().max().copied().unwrap_or(0),
        );

        let fields = vec![
            ("call_id", FieldKind::Uuid),
            ("date", FieldKind::Date),
            ("weekday", labels(DayOfWeek::ALL.iter().map(|d| d.as_str()))),
            (
                "time_of_day_bucket",
                labels(settings.calendar.time_buckets.iter().cloned()),
            ),
            (
                "agent_name",
                labels(settings.team.agents.iter().map(|a| a.name.clone())),
            ),
            ("team", labels(config.team_names())),
            (
                "agent_shift",
                labels(settings.team.shifts.iter().map(|s| s.name.clone())),
            ),
            ("customer_segment", attribute(CategoricalField::CustomerSegment)),
            ("channel", attribute(CategoricalField::Channel)),
            ("language", attribute(CategoricalField::Language)),
            ("region", attribute(CategoricalField::Region)),
            ("device_type", attribute(CategoricalField::DeviceType)),
            ("intent", attribute(CategoricalField::Intent)),
            (
                "secondary_intents",
                FieldKind::LabelList {
                    values: config
                        .attribute(CategoricalField::Intent)
                        .domain()
                        .cloned()
                        .collect(),
                    max_items: config.max_intents().saturating_sub(1),
                },
            ),
            ("scenario", attribute(CategoricalField::Scenario)),
            ("AWT", number(&kpis.awt_seconds)),
            ("Hold_time", number(&kpis.hold_seconds)),
            (
                "Transfers_count",
                FieldKind::Integer {
                    min: transfer_bounds.0 as i64,
                    max: transfer_bounds.1 as i64,
                },
            ),
            ("Silence_ratio", number(&kpis.silence_ratio)),
            ("Interruptions_count", integer(&kpis.interruptions_count)),
            ("FCR", FieldKind::Boolean),
            ("repeat_call_within_72h", FieldKind::Boolean),
            ("escalation", attribute(CategoricalField::Escalation)),
            (
                "complaint_category",
                attribute(CategoricalField::ComplaintCategory),
            ),
            (
                "NPS_score",
                FieldKind::Integer {
                    min: 0,
                    max: kpis.nps.cap as i64,
                },
            ),
            (
                "sentiment_score",
                FieldKind::Number {
                    min: SENTIMENT_RANGE.0,
                    max: SENTIMENT_RANGE.1,
                },
            ),
            ("product", attribute(CategoricalField::Product)),
            ("amount_bucket", attribute(CategoricalField::AmountBucket)),
            (
                "self_service_potential",
                attribute(CategoricalField::SelfServicePotential),
            ),
            ("automation_action_present", FieldKind::Boolean),
            (
                "automation_action_type",
                attribute(CategoricalField::AutomationActionType),
            ),
            (
                "ANI",
                FieldKind::Phone {
                    prefix: settings.ani.country_code.clone(),
                    min_digits: settings.ani.min_digits,
                    max_digits: settings.ani.max_digits,
                },
            ),
            ("compliance_flags", FieldKind::Compliance),
            ("kb_article_used", FieldKind::Boolean),
            ("language_switch", FieldKind::Boolean),
            ("pii_disclosure_flag", FieldKind::Boolean),
            ("script_adherence", number(&kpis.script_adherence)),
            (
                "Silence_total_seconds",
                number(&kpis.silence_total_seconds),
            ),
        ];
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| FieldSpec { name, kind })
                .collect(),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Renders the contract as a JSON Schema (draft 7) document.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), kind_schema(&field.kind));
        }
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "CallRecord",
            "type": "object",
            "required": self.field_names().collect::<Vec<_>>(),
            "additionalProperties": false,
            "properties": properties,
        })
    }
}

const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";
const DATE_PATTERN: &str = "^[0-9]{4}-[0-9]{2}-[0-9]{2}$";

/// Escapes regex metacharacters in a literal prefix.
fn literal(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Uuid => json!({ "type": "string", "pattern": UUID_PATTERN }),
        FieldKind::Date => json!({ "type": "string", "format": "date", "pattern": DATE_PATTERN }),
        FieldKind::Enum { values, nullable } => {
            let strings = json!({ "type": "string", "enum": values });
            if *nullable {
                json!({ "anyOf": [strings, { "type": "null" }] })
            } else {
                strings
            }
        }
        FieldKind::LabelList { values, max_items } => json!({
            "type": "array",
            "items": { "type": "string", "enum": values },
            "uniqueItems": true,
            "maxItems": max_items,
        }),
        FieldKind::Number { min, max } => {
            json!({ "type": "number", "minimum": min, "maximum": max })
        }
        FieldKind::Integer { min, max } => {
            json!({ "type": "integer", "minimum": min, "maximum": max })
        }
        FieldKind::Boolean => json!({ "type": "boolean" }),
        FieldKind::Phone {
            prefix,
            min_digits,
            max_digits,
        } => json!({
            "type": "string",
            "pattern": format!("^{}[0-9]{{{min_digits},{max_digits}}}$", literal(prefix)),
        }),
        FieldKind::Compliance => {
            let check = json!({ "type": "string", "enum": ["pass", "fail"] });
            json!({
                "type": "object",
                "required": ["Greeting", "Empathy", "Summary", "Farewell"],
                "additionalProperties": false,
                "properties": {
                    "Greeting": check,
                    "Empathy": check,
                    "Summary": check,
                    "Farewell": check,
                },
            })
        }
    }
}
