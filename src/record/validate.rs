use super::schema::CallSchema;
use crate::config::{CategoricalField, EffectiveConfig, FieldRef, NONE_OPTION};
use crate::error::{GenerationError, SchemaViolation};
use crate::sampling::CallContext;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde_json::{Map, Value};

const RECORD: &str = "<record>";

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

/// Top-level record field an instance path points into; empty for the
/// record itself.
fn top_field(error: &ValidationError<'_>) -> String {
    error
        .instance_path
        .to_string()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn push_schema_error(call_id: &str, error: &ValidationError<'_>, out: &mut Vec<SchemaViolation>) {
    let field = top_field(error);
    match &error.kind {
        ValidationErrorKind::Required { property } if field.is_empty() => {
            let name = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            out.push(SchemaViolation::new(call_id, name, "present", "missing"));
        }
        ValidationErrorKind::AdditionalProperties { unexpected } if field.is_empty() => {
            for name in unexpected {
                out.push(SchemaViolation::new(call_id, name.as_str(), "no such field", "present"));
            }
        }
        _ => {
            let field = if field.is_empty() { RECORD.to_string() } else { field };
            out.push(SchemaViolation::new(
                call_id,
                field,
                error.to_string(),
                describe(&error.instance),
            ));
        }
    }
}

/// Value a dependency rule sees for `field`: the record's own value when
/// the record carries the field, otherwise the call context.
fn rule_value(record: &Map<String, Value>, context: &CallContext, field: FieldRef) -> String {
    match record.get(field.as_str()) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) => NONE_OPTION.to_string(),
        Some(other) => other.to_string(),
        None => match field {
            FieldRef::Context(ctx) => context.value(ctx).to_string(),
            FieldRef::Attribute(_) => NONE_OPTION.to_string(),
        },
    }
}

fn check_rules(
    call_id: &str,
    fields: &Map<String, Value>,
    config: &EffectiveConfig,
    context: &CallContext,
    out: &mut Vec<SchemaViolation>,
) {
    for field in config.sampling_order() {
        let spec = config.attribute(*field);
        let child = rule_value(fields, context, FieldRef::Attribute(*field));
        for rule in &spec.constraints {
            let parent = rule_value(fields, context, rule.field);
            let Some(allowed) = rule.allowed_for(&parent) else {
                continue;
            };
            if !allowed.contains(&child) {
                out.push(SchemaViolation::new(
                    call_id,
                    field.as_str(),
                    format!("one of [{}] when {} is {parent}", allowed.join(", "), rule.field),
                    child.clone(),
                ));
            }
        }
    }

    let intent = fields.get(CategoricalField::Intent.as_str());
    let repeated = fields
        .get("secondary_intents")
        .and_then(Value::as_array)
        .is_some_and(|secondary| intent.is_some_and(|primary| secondary.contains(primary)));
    if repeated {
        out.push(SchemaViolation::new(
            call_id,
            "secondary_intents",
            "intents other than the primary intent",
            intent.map(describe).unwrap_or_default(),
        ));
    }

    let present = fields.get("automation_action_present").and_then(Value::as_bool);
    let has_type = fields
        .get(CategoricalField::AutomationActionType.as_str())
        .is_some_and(|v| !v.is_null());
    if present.is_some_and(|p| p != has_type) {
        out.push(SchemaViolation::new(
            call_id,
            "automation_action_present",
            format!("{has_type} to match automation_action_type"),
            (!has_type).to_string(),
        ));
    }
}

/// The call schema compiled once per run, plus the configured cross-field
/// rules.
pub struct RecordValidator {
    compiled: JSONSchema,
}

impl RecordValidator {
    pub fn new(schema: &CallSchema) -> Result<Self, GenerationError> {
        let document = schema.to_json_schema();
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|e| GenerationError::SchemaCompile(e.to_string()))?;
        Ok(Self { compiled })
    }

    /// Checks one serialized record. Returns every violation found; empty
    /// means valid.
    pub fn validate(
        &self,
        record: &Value,
        config: &EffectiveConfig,
        context: &CallContext,
    ) -> Vec<SchemaViolation> {
        let call_id = record
            .get("call_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        let mut violations = Vec::new();
        if let Err(errors) = self.compiled.validate(record) {
            for error in errors {
                push_schema_error(&call_id, &error, &mut violations);
            }
        }
        if let Some(fields) = record.as_object() {
            check_rules(&call_id, fields, config, context, &mut violations);
        }
        violations
    }
}
