use super::fields::{CategoricalField, ContextField, DayOfWeek, FieldRef};
use super::model::{
    AttributeSpec, Condition, ContinuousMetric, GeneratorConfig, ProbabilityMetric, NONE_OPTION,
};
use crate::error::ConfigError;
use std::collections::BTreeSet;

/// Value domains of every field a rule may reference.
pub(crate) struct Domains<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> Domains<'a> {
    pub(crate) fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub(crate) fn values(&self, field: FieldRef) -> Vec<String> {
        match field {
            FieldRef::Attribute(attr) => self
                .config
                .attributes
                .get(&attr)
                .map(|spec| spec.domain().cloned().collect())
                .unwrap_or_default(),
            FieldRef::Context(ctx) => match ctx {
                ContextField::Weekday => DayOfWeek::ALL
                    .iter()
                    .map(|d| d.as_str().to_string())
                    .collect(),
                ContextField::TimeOfDayBucket => self.config.calendar.time_buckets.clone(),
                ContextField::AgentName => self
                    .config
                    .team
                    .agents
                    .iter()
                    .map(|a| a.name.clone())
                    .collect(),
                ContextField::Team => team_names(self.config),
                ContextField::AgentShift => self
                    .config
                    .team
                    .shifts
                    .iter()
                    .map(|s| s.name.clone())
                    .collect(),
                ContextField::Outage | ContextField::AppIssue | ContextField::PremiumWaitPeak => {
                    vec!["true".to_string(), "false".to_string()]
                }
            },
        }
    }

    fn check_value(&self, field: FieldRef, value: &str, key: &str) -> Result<(), ConfigError> {
        if self.values(field).iter().any(|known| known == value) {
            Ok(())
        } else {
            Err(ConfigError::UnknownReference {
                key: key.to_string(),
                reference: value.to_string(),
            })
        }
    }

    fn check_condition(&self, condition: &Condition, key: &str) -> Result<(), ConfigError> {
        for (field, expected) in condition {
            for label in expected.labels() {
                self.check_value(*field, &label, &format!("{key}.when.{field}"))?;
            }
        }
        Ok(())
    }
}

pub(crate) fn team_names(config: &GeneratorConfig) -> Vec<String> {
    let mut teams: Vec<String> = Vec::new();
    for agent in &config.team.agents {
        if !teams.contains(&agent.team) {
            teams.push(agent.team.clone());
        }
    }
    teams
}

/// Eagerly validates the typed configuration and returns the attribute
/// sampling order.
pub(crate) fn validate(config: &GeneratorConfig) -> Result<Vec<CategoricalField>, ConfigError> {
    for field in CategoricalField::ALL {
        if !config.attributes.contains_key(&field) {
            return Err(ConfigError::MissingSection {
                section: format!("attributes.{field}"),
            });
        }
    }
    let domains = Domains::new(config);
    validate_calendar(config)?;
    validate_volume(config)?;
    validate_team(config)?;
    for (field, spec) in &config.attributes {
        validate_attribute(*field, spec, &domains)?;
    }
    validate_intent_count(config)?;
    validate_ani(config)?;
    validate_kpis(config, &domains)?;
    validate_compliance(config, &domains)?;
    sampling_order(config)
}

fn invalid(key: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        message: message.into(),
    }
}

fn unique_names<'a>(
    names: impl Iterator<Item = &'a String>,
    key: &str,
) -> Result<BTreeSet<&'a str>, ConfigError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(key, "names must not be empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(key, format!("`{name}` is listed twice")));
        }
    }
    Ok(seen)
}

fn validate_calendar(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let calendar = &config.calendar;
    if calendar.time_buckets.is_empty() {
        return Err(ConfigError::MissingSection {
            section: "calendar.time_buckets".into(),
        });
    }
    let buckets = unique_names(calendar.time_buckets.iter(), "calendar.time_buckets")?;
    let mut profiles = vec![("calendar.bucket_shares.weekday", &calendar.bucket_shares.weekday)];
    if let Some(weekend) = &calendar.bucket_shares.weekend {
        profiles.push(("calendar.bucket_shares.weekend", weekend));
    }
    for (key, profile) in profiles {
        profile.check(key)?;
        for bucket in profile.options() {
            if !buckets.contains(bucket.as_str()) {
                return Err(ConfigError::UnknownReference {
                    key: key.to_string(),
                    reference: bucket.clone(),
                });
            }
        }
    }
    for (day, factor) in &calendar.weekday_factors {
        if !factor.is_finite() {
            return Err(invalid(
                format!("calendar.weekday_factors.{day}"),
                "factor must be finite",
            ));
        }
    }

    let outages = &calendar.outages;
    outages.count.check("calendar.outages.count")?;
    outages.duration_days.check("calendar.outages.duration_days")?;
    if outages
        .duration_days
        .iter()
        .any(|(days, weight)| *days == 0 && weight > 0.0)
    {
        return Err(invalid(
            "calendar.outages.duration_days",
            "an outage lasts at least one day",
        ));
    }
    let range = outages.volume_multiplier;
    if !(range.min.is_finite() && range.max.is_finite()) || range.min < 0.0 || range.min > range.max
    {
        return Err(invalid(
            "calendar.outages.volume_multiplier",
            format!("expected 0 <= min <= max, got {}..{}", range.min, range.max),
        ));
    }
    Ok(())
}

fn validate_volume(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let volume = &config.volume;
    let checks = [
        ("volume.baseline_weekday", volume.baseline_weekday),
        ("volume.baseline_weekend", volume.baseline_weekend),
        ("volume.scale", volume.scale),
        ("volume.app_issue_multiplier", volume.app_issue_multiplier),
    ];
    for (key, value) in checks {
        if !value.is_finite() {
            return Err(invalid(key, "value must be finite"));
        }
    }
    Ok(())
}

fn validate_team(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let team = &config.team;
    if team.agents.is_empty() {
        return Err(ConfigError::MissingSection {
            section: "team.agents".into(),
        });
    }
    if team.shifts.is_empty() {
        return Err(ConfigError::MissingSection {
            section: "team.shifts".into(),
        });
    }
    unique_names(team.agents.iter().map(|a| &a.name), "team.agents")?;
    let shift_names = unique_names(team.shifts.iter().map(|s| &s.name), "team.shifts")?;
    let buckets: BTreeSet<&str> = config
        .calendar
        .time_buckets
        .iter()
        .map(String::as_str)
        .collect();
    for shift in &team.shifts {
        let key = format!("team.shifts.{}.buckets", shift.name);
        if shift.buckets.is_empty() {
            return Err(invalid(key, "a shift must cover at least one bucket"));
        }
        for bucket in &shift.buckets {
            if !buckets.contains(bucket.as_str()) {
                return Err(ConfigError::UnknownReference {
                    key,
                    reference: bucket.clone(),
                });
            }
        }
    }
    for agent in &team.agents {
        let key = format!("team.agents.{}", agent.name);
        let workloads = [
            ("workload", Some(agent.workload)),
            ("weekend_workload", agent.weekend_workload),
        ];
        for (name, workload) in workloads {
            if workload.is_some_and(|w| !w.is_finite() || w < 0.0) {
                return Err(invalid(
                    format!("{key}.{name}"),
                    "workload must be a non-negative number",
                ));
            }
        }
        agent.shifts.check(&format!("{key}.shifts"))?;
        for shift in agent.shifts.options() {
            if !shift_names.contains(shift.as_str()) {
                return Err(ConfigError::UnknownReference {
                    key: format!("{key}.shifts"),
                    reference: shift.clone(),
                });
            }
        }
    }
    if team.max_calls_per_agent == 0 {
        return Err(invalid(
            "team.max_calls_per_agent",
            "must allow at least one call",
        ));
    }
    if team.rest_days_per_week > 6 {
        return Err(invalid(
            "team.rest_days_per_week",
            "agents must work at least one day per week",
        ));
    }
    if let Some(shares) = &team.team_shares {
        let teams = team_names(config);
        let mut profiles = vec![("team.team_shares.weekday", &shares.weekday)];
        if let Some(weekend) = &shares.weekend {
            profiles.push(("team.team_shares.weekend", weekend));
        }
        for (key, profile) in profiles {
            profile.check(key)?;
            for name in profile.options() {
                if !teams.contains(name) {
                    return Err(ConfigError::UnknownReference {
                        key: key.to_string(),
                        reference: name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_intent_count(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let key = "intent_count";
    config.intent_count.check(key)?;
    let available = config
        .attributes
        .get(&CategoricalField::Intent)
        .map_or(0, |spec| spec.weights.len());
    for (count, weight) in config.intent_count.iter() {
        if weight > 0.0 && (*count == 0 || *count as usize > available) {
            return Err(invalid(
                key,
                format!("a call raises between 1 and {available} intents, got {count}"),
            ));
        }
    }
    Ok(())
}

fn validate_attribute(
    field: CategoricalField,
    spec: &AttributeSpec,
    domains: &Domains<'_>,
) -> Result<(), ConfigError> {
    let key = format!("attributes.{field}");
    spec.weights.check(&format!("{key}.weights"))?;
    if !spec.nullable && spec.weights.contains(&NONE_OPTION.to_string()) {
        return Err(invalid(
            format!("{key}.weights"),
            format!("`{NONE_OPTION}` is only allowed on nullable attributes"),
        ));
    }
    if spec.nullable && !field.allows_null() {
        return Err(invalid(
            format!("{key}.nullable"),
            "the call record declares this field as required",
        ));
    }
    let in_domain = |value: &str| spec.weights.options().any(|option| option == value);

    for parent in spec.parents() {
        if parent == FieldRef::Attribute(field) {
            return Err(ConfigError::DependencyCycle {
                fields: vec![field.to_string(), field.to_string()],
            });
        }
    }

    for (parent, by_value) in &spec.adjust {
        for (parent_value, deltas) in by_value {
            let adjust_key = format!("{key}.adjust.{parent}");
            domains.check_value(*parent, parent_value, &adjust_key)?;
            for (option, delta) in deltas.iter() {
                if !delta.is_finite() {
                    return Err(invalid(
                        format!("{adjust_key}.{parent_value}"),
                        "delta must be finite",
                    ));
                }
                if !in_domain(option) {
                    return Err(ConfigError::UnknownReference {
                        key: format!("{adjust_key}.{parent_value}"),
                        reference: option.clone(),
                    });
                }
            }
        }
    }

    for (idx, rule) in spec.constraints.iter().enumerate() {
        let rule_key = format!("{key}.constraints[{idx}]");
        let mut lists: Vec<(String, &Vec<String>)> = Vec::new();
        for (parent_value, allowed) in &rule.allowed {
            domains.check_value(rule.field, parent_value, &format!("{rule_key}.allowed"))?;
            lists.push((format!("{rule_key}.allowed.{parent_value}"), allowed));
        }
        if let Some(otherwise) = &rule.otherwise {
            lists.push((format!("{rule_key}.otherwise"), otherwise));
        }
        for (list_key, allowed) in lists {
            if allowed.is_empty() {
                return Err(invalid(list_key, "allowed values must not be empty"));
            }
            for value in allowed {
                if !in_domain(value) {
                    return Err(ConfigError::UnknownReference {
                        key: list_key.clone(),
                        reference: value.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_ani(config: &GeneratorConfig) -> Result<(), ConfigError> {
    let ani = &config.ani;
    if !ani.country_code.starts_with('+')
        || ani.country_code.len() < 2
        || !ani.country_code[1..].chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid(
            "ani.country_code",
            format!("`{}` is not a `+<digits>` prefix", ani.country_code),
        ));
    }
    if ani.min_digits == 0 || ani.min_digits > ani.max_digits || ani.max_digits > 15 {
        return Err(invalid(
            "ani.min_digits",
            format!(
                "expected 1 <= min_digits <= max_digits <= 15, got {}..{}",
                ani.min_digits, ani.max_digits
            ),
        ));
    }
    Ok(())
}

fn validate_continuous(
    metric: &ContinuousMetric,
    key: &str,
    domains: &Domains<'_>,
) -> Result<(), ConfigError> {
    if !(metric.mean.is_finite() && metric.sigma.is_finite()) || metric.sigma < 0.0 {
        return Err(invalid(key, "mean must be finite and sigma non-negative"));
    }
    if !(metric.min.is_finite() && metric.max.is_finite()) || metric.min > metric.max {
        return Err(invalid(
            key,
            format!("expected min <= max, got {}..{}", metric.min, metric.max),
        ));
    }
    for (idx, shift) in metric.shifts.iter().enumerate() {
        let shift_key = format!("{key}.shifts[{idx}]");
        domains.check_condition(&shift.when, &shift_key)?;
        if !shift.mean.is_finite() || !shift.spread.is_finite() || shift.spread < 0.0 {
            return Err(invalid(
                shift_key,
                "mean must be finite and spread non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_probability(
    metric: &ProbabilityMetric,
    key: &str,
    domains: &Domains<'_>,
) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&metric.base) {
        return Err(invalid(
            format!("{key}.base"),
            format!("probability {} is outside [0, 1]", metric.base),
        ));
    }
    for (idx, shift) in metric.shifts.iter().enumerate() {
        let shift_key = format!("{key}.shifts[{idx}]");
        domains.check_condition(&shift.when, &shift_key)?;
        if !shift.delta.is_finite() {
            return Err(invalid(shift_key, "delta must be finite"));
        }
    }
    Ok(())
}

fn validate_kpis(config: &GeneratorConfig, domains: &Domains<'_>) -> Result<(), ConfigError> {
    let kpis = &config.kpis;
    let continuous = [
        ("kpis.awt_seconds", &kpis.awt_seconds),
        ("kpis.hold_seconds", &kpis.hold_seconds),
        ("kpis.silence_ratio", &kpis.silence_ratio),
        ("kpis.silence_total_seconds", &kpis.silence_total_seconds),
        ("kpis.interruptions_count", &kpis.interruptions_count),
        ("kpis.script_adherence", &kpis.script_adherence),
    ];
    for (key, metric) in continuous {
        validate_continuous(metric, key, domains)?;
    }
    if kpis.silence_ratio.min < 0.0 || kpis.silence_ratio.max > 100.0 {
        return Err(invalid("kpis.silence_ratio", "must stay within 0..100"));
    }
    if kpis.script_adherence.min < 0.0 || kpis.script_adherence.max > 100.0 {
        return Err(invalid("kpis.script_adherence", "must stay within 0..100"));
    }
    if kpis.interruptions_count.min < 0.0 {
        return Err(invalid("kpis.interruptions_count", "counts cannot be negative"));
    }

    kpis.transfers_count
        .weights
        .check("kpis.transfers_count.weights")?;
    for (idx, shift) in kpis.transfers_count.adjust.iter().enumerate() {
        let shift_key = format!("kpis.transfers_count.adjust[{idx}]");
        domains.check_condition(&shift.when, &shift_key)?;
        for (count, _) in shift.deltas.iter() {
            if !kpis.transfers_count.weights.contains(count) {
                return Err(ConfigError::UnknownReference {
                    key: shift_key.clone(),
                    reference: count.to_string(),
                });
            }
        }
    }

    kpis.nps.weights.check("kpis.nps.weights")?;
    if kpis.nps.cap > 10 || kpis.nps.weights.options().any(|score| *score > 10) {
        return Err(invalid("kpis.nps", "scores must stay within 0..10"));
    }
    for (idx, shift) in kpis.nps.shifts.iter().enumerate() {
        domains.check_condition(&shift.when, &format!("kpis.nps.shifts[{idx}]"))?;
    }
    if !kpis.sentiment.noise_sigma.is_finite() || kpis.sentiment.noise_sigma < 0.0 {
        return Err(invalid(
            "kpis.sentiment.noise_sigma",
            "must be a non-negative number",
        ));
    }
    for (idx, shift) in kpis.sentiment.shifts.iter().enumerate() {
        domains.check_condition(&shift.when, &format!("kpis.sentiment.shifts[{idx}]"))?;
    }

    let probabilities = [
        ("kpis.fcr", &kpis.fcr),
        ("kpis.repeat_call", &kpis.repeat_call),
        ("kpis.kb_article_used", &kpis.kb_article_used),
        ("kpis.language_switch", &kpis.language_switch),
        ("kpis.pii_disclosure", &kpis.pii_disclosure),
    ];
    for (key, metric) in probabilities {
        validate_probability(metric, key, domains)?;
    }
    Ok(())
}

fn validate_compliance(config: &GeneratorConfig, domains: &Domains<'_>) -> Result<(), ConfigError> {
    let compliance = &config.compliance;
    for check in super::fields::ComplianceCheck::ALL {
        let rate = compliance.pass_rates.get(check);
        if !(0.0..=1.0).contains(&rate) {
            return Err(invalid(
                format!("compliance.pass_rates.{}", check.as_str()),
                format!("probability {rate} is outside [0, 1]"),
            ));
        }
    }
    if !(0.0..=1.0).contains(&compliance.correlation) {
        return Err(invalid(
            "compliance.correlation",
            "must be a probability in [0, 1]",
        ));
    }
    for (idx, shift) in compliance.shifts.iter().enumerate() {
        domains.check_condition(&shift.when, &format!("compliance.shifts[{idx}]"))?;
    }
    Ok(())
}

/// Topological order over attribute dependencies. Ties resolve in
/// declaration order of [`CategoricalField::ALL`], so the order is stable.
pub(crate) fn sampling_order(
    config: &GeneratorConfig,
) -> Result<Vec<CategoricalField>, ConfigError> {
    let attribute_parents = |field: CategoricalField| -> Vec<CategoricalField> {
        config
            .attributes
            .get(&field)
            .map(|spec| {
                spec.parents()
                    .into_iter()
                    .filter_map(|parent| match parent {
                        FieldRef::Attribute(attr) => Some(attr),
                        FieldRef::Context(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut order: Vec<CategoricalField> = Vec::with_capacity(CategoricalField::ALL.len());
    let mut remaining: Vec<CategoricalField> = CategoricalField::ALL.to_vec();
    while !remaining.is_empty() {
        let ready = remaining.iter().position(|field| {
            attribute_parents(*field)
                .iter()
                .all(|parent| order.contains(parent))
        });
        match ready {
            Some(idx) => order.push(remaining.remove(idx)),
            None => {
                return Err(ConfigError::DependencyCycle {
                    fields: find_cycle(&remaining, &attribute_parents),
                })
            }
        }
    }
    Ok(order)
}

/// Walks unresolved parents from the first blocked field until a field
/// repeats; every blocked field has at least one blocked parent.
fn find_cycle(
    blocked: &[CategoricalField],
    parents: &dyn Fn(CategoricalField) -> Vec<CategoricalField>,
) -> Vec<String> {
    let mut path: Vec<CategoricalField> = Vec::new();
    let mut current = blocked[0];
    loop {
        if let Some(start) = path.iter().position(|field| *field == current) {
            let mut cycle: Vec<String> = path[start..].iter().map(|f| f.to_string()).collect();
            cycle.push(current.to_string());
            return cycle;
        }
        path.push(current);
        match parents(current).into_iter().find(|p| blocked.contains(p)) {
            Some(next) => current = next,
            None => return path.iter().map(|f| f.to_string()).collect(),
        }
    }
}
