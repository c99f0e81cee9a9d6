use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Categorical fields drawn by the attribute sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    CustomerSegment,
    Channel,
    Language,
    Region,
    DeviceType,
    Intent,
    Scenario,
    Escalation,
    ComplaintCategory,
    Product,
    AmountBucket,
    SelfServicePotential,
    AutomationActionType,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 13] = [
        CategoricalField::CustomerSegment,
        CategoricalField::Channel,
        CategoricalField::Language,
        CategoricalField::Region,
        CategoricalField::DeviceType,
        CategoricalField::Intent,
        CategoricalField::Scenario,
        CategoricalField::Escalation,
        CategoricalField::ComplaintCategory,
        CategoricalField::Product,
        CategoricalField::AmountBucket,
        CategoricalField::SelfServicePotential,
        CategoricalField::AutomationActionType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::CustomerSegment => "customer_segment",
            CategoricalField::Channel => "channel",
            CategoricalField::Language => "language",
            CategoricalField::Region => "region",
            CategoricalField::DeviceType => "device_type",
            CategoricalField::Intent => "intent",
            CategoricalField::Scenario => "scenario",
            CategoricalField::Escalation => "escalation",
            CategoricalField::ComplaintCategory => "complaint_category",
            CategoricalField::Product => "product",
            CategoricalField::AmountBucket => "amount_bucket",
            CategoricalField::SelfServicePotential => "self_service_potential",
            CategoricalField::AutomationActionType => "automation_action_type",
        }
    }

    /// Fields the call record declares as nullable.
    pub fn allows_null(&self) -> bool {
        matches!(
            self,
            CategoricalField::ComplaintCategory
                | CategoricalField::Product
                | CategoricalField::AmountBucket
                | CategoricalField::AutomationActionType
        )
    }
}

impl FromStr for CategoricalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoricalField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown attribute `{s}`"))
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call context that exists before any attribute is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextField {
    Weekday,
    TimeOfDayBucket,
    AgentName,
    Team,
    AgentShift,
    Outage,
    AppIssue,
    PremiumWaitPeak,
}

impl ContextField {
    pub const ALL: [ContextField; 8] = [
        ContextField::Weekday,
        ContextField::TimeOfDayBucket,
        ContextField::AgentName,
        ContextField::Team,
        ContextField::AgentShift,
        ContextField::Outage,
        ContextField::AppIssue,
        ContextField::PremiumWaitPeak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::Weekday => "weekday",
            ContextField::TimeOfDayBucket => "time_of_day_bucket",
            ContextField::AgentName => "agent_name",
            ContextField::Team => "team",
            ContextField::AgentShift => "agent_shift",
            ContextField::Outage => "outage",
            ContextField::AppIssue => "app_issue",
            ContextField::PremiumWaitPeak => "premium_wait_peak",
        }
    }
}

impl FromStr for ContextField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContextField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown context field `{s}`"))
    }
}

/// Reference to any field a weight adjustment, constraint or KPI shift can
/// be conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldRef {
    Context(ContextField),
    Attribute(CategoricalField),
}

impl FieldRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRef::Context(field) => field.as_str(),
            FieldRef::Attribute(field) => field.as_str(),
        }
    }
}

impl FromStr for FieldRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(field) = s.parse::<CategoricalField>() {
            return Ok(FieldRef::Attribute(field));
        }
        if let Ok(field) = s.parse::<ContextField>() {
            return Ok(FieldRef::Context(field));
        }
        Err(format!("unknown field reference `{s}`"))
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Three-letter weekday labels used in configuration and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Mon => "Mon",
            DayOfWeek::Tue => "Tue",
            DayOfWeek::Wed => "Wed",
            DayOfWeek::Thu => "Thu",
            DayOfWeek::Fri => "Fri",
            DayOfWeek::Sat => "Sat",
            DayOfWeek::Sun => "Sun",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayOfWeek::Sat | DayOfWeek::Sun)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
            Weekday::Sun => DayOfWeek::Sun,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four fixed compliance checks attached to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceCheck {
    Greeting,
    Empathy,
    Summary,
    Farewell,
}

impl ComplianceCheck {
    pub const ALL: [ComplianceCheck; 4] = [
        ComplianceCheck::Greeting,
        ComplianceCheck::Empathy,
        ComplianceCheck::Summary,
        ComplianceCheck::Farewell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceCheck::Greeting => "Greeting",
            ComplianceCheck::Empathy => "Empathy",
            ComplianceCheck::Summary => "Summary",
            ComplianceCheck::Farewell => "Farewell",
        }
    }
}
