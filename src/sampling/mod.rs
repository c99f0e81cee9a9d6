//! Attribute and scenario sampling.
//!
//! Attributes are drawn in the dependency order computed when the
//! configuration was resolved, so every adjustment or constraint reads a
//! parent that already has its value. Each attribute draws from its own
//! stream keyed by field, day and call. A call may raise several intents:
//! the first one drawn is the primary intent every rule reads, the others
//! are drawn without replacement from the same adjusted weights.

mod context;
mod weights;

pub use context::{Attributes, CallContext, FieldLookup};
pub use weights::{pick_index, WeightTable};

use crate::config::{AttributeSpec, CategoricalField, EffectiveConfig, NONE_OPTION};
use crate::rng::{Dimension, StreamFactory, StreamKey};
use tracing::warn;

/// Position of a call within the run; both parts key its streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallIndex {
    pub day: u64,
    pub call: u64,
}

pub fn attribute_key(field: CategoricalField, at: CallIndex) -> StreamKey {
    StreamKey::new(Dimension::Attribute)
        .label(field.as_str())
        .index(at.day)
        .index(at.call)
}

pub fn sample_attributes(
    context: &CallContext,
    config: &EffectiveConfig,
    streams: &StreamFactory,
    at: CallIndex,
) -> Attributes {
    let mut attributes = Attributes::default();
    for field in config.sampling_order() {
        let spec = config.attribute(*field);
        let draw = streams.stream(&attribute_key(*field, at)).unit();
        let (value, secondary) = {
            let lookup = FieldLookup::new(context, &attributes);
            let value = draw_attribute(*field, spec, &lookup, draw);
            let secondary = match (field, value.as_deref()) {
                (CategoricalField::Intent, Some(primary)) => {
                    let count = intent_count(config, streams, at);
                    secondary_intents(spec, &lookup, primary, count, streams, at)
                }
                _ => Vec::new(),
            };
            (value, secondary)
        };
        attributes.insert(*field, value);
        if !secondary.is_empty() {
            attributes.set_secondary_intents(secondary);
        }
    }
    attributes
}

/// Number of intents this call raises, primary included.
fn intent_count(config: &EffectiveConfig, streams: &StreamFactory, at: CallIndex) -> u32 {
    let key = StreamKey::new(Dimension::Attribute)
        .label("intent_count")
        .index(at.day)
        .index(at.call);
    let draw = streams.stream(&key).unit();
    config.settings.intent_count.pick(draw).copied().unwrap_or(1)
}

/// Up to `count - 1` further intents, distinct from `primary` and from each
/// other. Stops early once no option with positive weight remains.
fn secondary_intents(
    spec: &AttributeSpec,
    lookup: &FieldLookup<'_>,
    primary: &str,
    count: u32,
    streams: &StreamFactory,
    at: CallIndex,
) -> Vec<String> {
    let mut weights = effective_weights(CategoricalField::Intent, spec, lookup);
    let mut chosen: Vec<String> = Vec::new();
    for position in 1..count {
        for entry in weights.iter_mut() {
            if entry.0 == primary || chosen.contains(entry.0) {
                entry.1 = 0.0;
            }
        }
        let raw: Vec<f64> = weights.iter().map(|(_, w)| *w).collect();
        let key = StreamKey::new(Dimension::Attribute)
            .label("secondary_intent")
            .index(at.day)
            .index(at.call)
            .index(u64::from(position));
        let Some(idx) = pick_index(&raw, streams.stream(&key).unit()) else {
            break;
        };
        chosen.push(weights[idx].0.clone());
    }
    chosen
}

/// Adjusted and constrained weights for one attribute, aligned with the
/// base table's option order.
pub fn effective_weights<'s>(
    field: CategoricalField,
    spec: &'s AttributeSpec,
    lookup: &FieldLookup<'_>,
) -> Vec<(&'s String, f64)> {
    let mut weights: Vec<(&String, f64)> = spec.weights.iter().collect();

    for (parent, by_value) in &spec.adjust {
        let parent_value = lookup.value(*parent);
        let Some(deltas) = by_value.get(&*parent_value) else {
            continue;
        };
        for (option, delta) in deltas.iter() {
            if let Some(entry) = weights.iter_mut().find(|(o, _)| *o == option) {
                entry.1 += delta;
            }
        }
    }
    for entry in weights.iter_mut() {
        entry.1 = entry.1.max(0.0);
    }

    let mut permitted = vec![true; weights.len()];
    for rule in &spec.constraints {
        let parent_value = lookup.value(rule.field);
        if let Some(allowed) = rule.allowed_for(&parent_value) {
            for (idx, (option, _)) in weights.iter().enumerate() {
                if !allowed.contains(option) {
                    permitted[idx] = false;
                }
            }
        }
    }
    if !permitted.iter().any(|p| *p) {
        warn!(
            field = field.as_str(),
            "constraints exclude every option, sampling unconstrained"
        );
        return weights;
    }

    let allowed_mass: f64 = weights
        .iter()
        .zip(&permitted)
        .filter(|(_, p)| **p)
        .map(|((_, w), _)| *w)
        .sum();
    weights
        .into_iter()
        .zip(permitted)
        .map(|((option, weight), ok)| match (ok, allowed_mass > 0.0) {
            (false, _) => (option, 0.0),
            (true, true) => (option, weight),
            // everything permitted lost its weight: uniform fallback
            (true, false) => (option, 1.0),
        })
        .collect()
}

fn draw_attribute(
    field: CategoricalField,
    spec: &AttributeSpec,
    lookup: &FieldLookup<'_>,
    draw: f64,
) -> Option<String> {
    let weights = effective_weights(field, spec, lookup);
    let raw: Vec<f64> = weights.iter().map(|(_, w)| *w).collect();
    let idx = pick_index(&raw, draw).unwrap_or(0);
    let option = weights.get(idx).map(|(o, _)| o.as_str())?;
    if spec.nullable && option == NONE_OPTION {
        None
    } else {
        Some(option.to_string())
    }
}
