use crate::calendar::DaySpec;
use crate::config::{CategoricalField, Condition, ContextField, DayOfWeek, FieldRef, NONE_OPTION};
use crate::roster::CallSlot;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Per-call facts fixed before any attribute is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    pub weekday: DayOfWeek,
    pub bucket: String,
    pub agent: String,
    pub team: String,
    pub shift: String,
    pub outage: bool,
    pub app_issue: bool,
    pub premium_wait_peak: bool,
}

impl CallContext {
    pub fn new(day: &DaySpec, slot: &CallSlot) -> Self {
        Self {
            weekday: day.weekday,
            bucket: slot.bucket.clone(),
            agent: slot.agent.clone(),
            team: slot.team.clone(),
            shift: slot.shift.clone(),
            outage: day.has_outage(),
            app_issue: day.app_issue,
            premium_wait_peak: day.premium_wait_peak,
        }
    }

    pub fn value(&self, field: ContextField) -> &str {
        let flag = |on: bool| if on { "true" } else { "false" };
        match field {
            ContextField::Weekday => self.weekday.as_str(),
            ContextField::TimeOfDayBucket => &self.bucket,
            ContextField::AgentName => &self.agent,
            ContextField::Team => &self.team,
            ContextField::AgentShift => &self.shift,
            ContextField::Outage => flag(self.outage),
            ContextField::AppIssue => flag(self.app_issue),
            ContextField::PremiumWaitPeak => flag(self.premium_wait_peak),
        }
    }
}

/// Sampled categorical values; `None` is a null on a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<CategoricalField, Option<String>>,
    secondary_intents: Vec<String>,
}

impl Attributes {
    /// Intents raised after the primary one, in draw order.
    pub fn secondary_intents(&self) -> &[String] {
        &self.secondary_intents
    }

    pub fn set_secondary_intents(&mut self, intents: Vec<String>) {
        self.secondary_intents = intents;
    }

    pub fn insert(&mut self, field: CategoricalField, value: Option<String>) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: CategoricalField) -> Option<&str> {
        self.values.get(&field).and_then(|v| v.as_deref())
    }

    pub fn is_sampled(&self, field: CategoricalField) -> bool {
        self.values.contains_key(&field)
    }

    /// Value as an option label, with nulls reported as `none`.
    pub fn label(&self, field: CategoricalField) -> &str {
        self.get(field).unwrap_or(NONE_OPTION)
    }

    /// Owned value for record assembly.
    pub fn take(&self, field: CategoricalField) -> Option<String> {
        self.get(field).map(str::to_string)
    }
}

/// Resolves any [`FieldRef`] against one call's context and the attributes
/// sampled so far.
#[derive(Clone, Copy)]
pub struct FieldLookup<'a> {
    pub context: &'a CallContext,
    pub attributes: &'a Attributes,
}

impl<'a> FieldLookup<'a> {
    pub fn new(context: &'a CallContext, attributes: &'a Attributes) -> Self {
        Self {
            context,
            attributes,
        }
    }

    pub fn value(&self, field: FieldRef) -> Cow<'a, str> {
        match field {
            FieldRef::Context(ctx) => Cow::Borrowed(self.context.value(ctx)),
            FieldRef::Attribute(attr) => Cow::Borrowed(self.attributes.label(attr)),
        }
    }

    /// True when every entry of the condition matches.
    pub fn matches(&self, condition: &Condition) -> bool {
        condition
            .iter()
            .all(|(field, expected)| expected.matches(&self.value(*field)))
    }
}
