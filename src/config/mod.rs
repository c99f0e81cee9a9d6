//! Configuration resolver.
//!
//! A run is configured by a base document, zero or more override layers
//! and a handful of direct overrides from the command line. Layers are
//! deep-merged (lists and scalars replace, objects merge), direct
//! overrides are written into the merged document, and the result is
//! parsed into [`GeneratorConfig`] and validated eagerly. The merged
//! document is kept verbatim so the run can persist exactly what it used.

mod fields;
mod merge;
mod model;
mod validate;

pub use fields::{CategoricalField, ComplianceCheck, ContextField, DayOfWeek, FieldRef};
pub use merge::{load_document, merge_into, parse_document, set_path, DocumentFormat};
pub use model::{
    AgentSpec, AniSettings, AttributeSpec, CalendarSettings, CheckValues, ComplianceSettings,
    ComplianceShift, Condition, ConstraintRule, ContextShift, ContinuousMetric, DiscreteMetric,
    DiscreteShift, GeneratorConfig, IntShift, KpiSettings, MultiplierRange, NpsSettings,
    OutageSettings, ProbabilityMetric, ProbabilityShift, RunSettings, SentimentSettings,
    ShiftPattern, SilencePenalty, TeamSettings, ValueMatch, ViolationPolicy, VolumeSettings,
    WeekProfile, NONE_OPTION,
};

use crate::error::ConfigError;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

/// Sections every effective configuration must carry.
pub const REQUIRED_SECTIONS: [&str; 6] =
    ["volume", "calendar", "team", "attributes", "kpis", "compliance"];

/// Default location of the base document, relative to the working dir.
pub const DEFAULT_BASE_PATH: &str = "config/base.yml";
/// Default override layer. Only picked up alongside the default base, and
/// skipped when the file does not exist.
pub const DEFAULT_OVERRIDES_PATH: &str = "config/overrides.yml";

/// Overrides supplied directly on the invocation surface.
#[derive(Debug, Clone, Default)]
pub struct DirectOverrides {
    pub outage_count: Option<u32>,
    pub validate: Option<bool>,
    pub on_violation: Option<ViolationPolicy>,
}

impl DirectOverrides {
    fn apply(&self, doc: &mut Value) {
        if let Some(count) = self.outage_count {
            set_path(doc, &["calendar", "outages", "count_override"], json!(count));
        }
        if let Some(validate) = self.validate {
            set_path(doc, &["run", "validate"], json!(validate));
        }
        if let Some(policy) = self.on_violation {
            let label = match policy {
                ViolationPolicy::FailFast => "fail_fast",
                ViolationPolicy::Collect => "collect",
            };
            set_path(doc, &["run", "on_violation"], json!(label));
        }
    }
}

/// Paths of the documents making up one run's configuration.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub base: PathBuf,
    pub overrides: Vec<PathBuf>,
}

impl ConfigSources {
    /// Sources for an invocation. Explicit override layers are used as
    /// given. Without any, the default override layer joins the default
    /// base; an explicit base never picks it up.
    pub fn discover(base: Option<PathBuf>, overrides: Vec<PathBuf>) -> Self {
        if !overrides.is_empty() {
            return Self {
                base: base.unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_PATH)),
                overrides,
            };
        }
        let Some(base) = base else {
            let default_overrides = PathBuf::from(DEFAULT_OVERRIDES_PATH);
            let overrides = if default_overrides.exists() {
                info!(path = %default_overrides.display(), "using default override layer");
                vec![default_overrides]
            } else {
                Vec::new()
            };
            return Self {
                base: PathBuf::from(DEFAULT_BASE_PATH),
                overrides,
            };
        };
        Self {
            base,
            overrides: Vec::new(),
        }
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self::discover(None, Vec::new())
    }
}

/// Fully merged, override-applied and validated configuration. Read-only
/// for the rest of the run.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub settings: GeneratorConfig,
    pub document: Value,
    sampling_order: Vec<CategoricalField>,
}

impl EffectiveConfig {
    /// Attributes in dependency order: every field comes after the fields
    /// it reads.
    pub fn sampling_order(&self) -> &[CategoricalField] {
        &self.sampling_order
    }

    pub fn attribute(&self, field: CategoricalField) -> &AttributeSpec {
        // presence of every attribute is checked during resolution
        &self.settings.attributes[&field]
    }

    pub fn team_names(&self) -> Vec<String> {
        validate::team_names(&self.settings)
    }

    /// Largest number of intents one call can carry.
    pub fn max_intents(&self) -> usize {
        self.settings
            .intent_count
            .iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(count, _)| *count as usize)
            .max()
            .unwrap_or(1)
    }
}

/// Loads every document named in `sources` and resolves them.
pub fn resolve(
    sources: &ConfigSources,
    direct: &DirectOverrides,
) -> Result<EffectiveConfig, ConfigError> {
    let base = load_document(&sources.base)?;
    let mut layers = Vec::with_capacity(sources.overrides.len());
    for path in &sources.overrides {
        debug!(path = %path.display(), "loading override layer");
        layers.push(load_document(path)?);
    }
    resolve_documents(base, layers, direct)
}

/// Merges already-parsed documents in order and validates the result.
pub fn resolve_documents(
    base: Value,
    overrides: Vec<Value>,
    direct: &DirectOverrides,
) -> Result<EffectiveConfig, ConfigError> {
    let mut document = base;
    for layer in overrides {
        merge_into(&mut document, layer);
    }
    direct.apply(&mut document);

    for section in REQUIRED_SECTIONS {
        if !document.get(section).is_some_and(Value::is_object) {
            return Err(ConfigError::MissingSection {
                section: section.to_string(),
            });
        }
    }

    let settings: GeneratorConfig =
        serde_json::from_value(document.clone()).map_err(|e| ConfigError::Parse {
            source_name: "effective configuration".into(),
            message: e.to_string(),
        })?;
    let sampling_order = validate::validate(&settings)?;
    debug!(
        order = ?sampling_order.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
        "attribute sampling order resolved"
    );
    Ok(EffectiveConfig {
        settings,
        document,
        sampling_order,
    })
}

/// Shipped base configuration plus `layers`, for unit tests.
#[cfg(test)]
pub(crate) fn shipped_config(layers: Vec<Value>) -> EffectiveConfig {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_BASE_PATH);
    let base = load_document(&path).expect("shipped base configuration parses");
    resolve_documents(base, layers, &DirectOverrides::default())
        .expect("shipped configuration resolves")
}
